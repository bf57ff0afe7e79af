//! Membership and leadership ledgers
//!
//! Team and project relationships are recorded as intervals. Each row is
//! either **open** (no end timestamp yet) or **closed**; the only transition
//! is open → closed, and a relationship that resumes gets a fresh open row.
//! Rows are never deleted.
//!
//! Two ledger shapes exist:
//!
//! - [`LeadershipLedger`]: at most one open row per subject (team or project)
//! - [`MembershipLedger`]: any number of open rows per subject, one per user
//!
//! The functions in this module implement the transitions on top of those
//! traits. Callers run them on a [`postgres`] ledger bound to a transaction,
//! so a leadership change and the membership sync that follows it commit or
//! roll back together.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use teamhub_shared::ledger::{self, postgres::PgLeadershipLedger};
//!
//! # async fn example(pool: sqlx::PgPool) -> Result<(), sqlx::Error> {
//! let mut tx = pool.begin().await?;
//! let mut leaders = PgLeadershipLedger::team(&mut *tx);
//! ledger::update_leader(&mut leaders, 7, Some(42), Utc::now()).await?;
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```

pub mod postgres;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// The open leadership row of a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenLeadership {
    pub row_id: i64,
    pub leader_id: i64,
}

/// An open membership row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveMembership {
    pub row_id: i64,
    pub user_id: i64,
}

/// Storage for leadership intervals of one kind of subject
#[async_trait]
pub trait LeadershipLedger: Send {
    /// The open row of `subject`, if any
    async fn open_row(&mut self, subject: i64) -> Result<Option<OpenLeadership>, sqlx::Error>;

    /// Closes an open row at `at`
    async fn close_row(&mut self, row_id: i64, at: DateTime<Utc>) -> Result<(), sqlx::Error>;

    /// Starts a new open row; returns its id
    async fn insert_open(
        &mut self,
        subject: i64,
        leader_id: i64,
        at: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error>;
}

/// Storage for membership intervals of one kind of subject
#[async_trait]
pub trait MembershipLedger: Send {
    /// Every open row of `subject`
    async fn active_rows(&mut self, subject: i64) -> Result<Vec<ActiveMembership>, sqlx::Error>;

    /// Ends an open row at `at` and marks it inactive
    async fn end_row(&mut self, row_id: i64, at: DateTime<Utc>) -> Result<(), sqlx::Error>;

    /// Starts a new active row; returns its id
    async fn insert_active(
        &mut self,
        subject: i64,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error>;
}

/// What [`update_leader`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderTransition {
    /// The requested leader already held the open row (or both were none)
    Unchanged,

    /// The open row (if any) was closed and a new one opened (if requested)
    Changed {
        previous: Option<i64>,
        current: Option<i64>,
    },
}

impl LeaderTransition {
    pub fn is_changed(&self) -> bool {
        matches!(self, LeaderTransition::Changed { .. })
    }
}

/// Moves the leadership of `subject` to `new_leader`
///
/// Closes the open row at `now` and opens one for `new_leader` when it is
/// `Some`. Asking for the current leader again changes nothing, so repeated
/// calls never stack open rows.
pub async fn update_leader<L>(
    ledger: &mut L,
    subject: i64,
    new_leader: Option<i64>,
    now: DateTime<Utc>,
) -> Result<LeaderTransition, sqlx::Error>
where
    L: LeadershipLedger + ?Sized,
{
    let open = ledger.open_row(subject).await?;
    let previous = open.map(|row| row.leader_id);

    if previous == new_leader {
        return Ok(LeaderTransition::Unchanged);
    }

    if let Some(row) = open {
        ledger.close_row(row.row_id, now).await?;
    }

    if let Some(leader_id) = new_leader {
        ledger.insert_open(subject, leader_id, now).await?;
    }

    Ok(LeaderTransition::Changed {
        previous,
        current: new_leader,
    })
}

/// Closes the open leadership row of `subject`; returns whether one existed
pub async fn end_all_leadership<L>(
    ledger: &mut L,
    subject: i64,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error>
where
    L: LeadershipLedger + ?Sized,
{
    let transition = update_leader(ledger, subject, None, now).await?;
    Ok(transition.is_changed())
}

/// Rows to end and users to insert to reach a target membership set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Row ids of open memberships to end
    pub to_end: Vec<i64>,

    /// Users that need a new active row
    pub to_insert: Vec<i64>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_end.is_empty() && self.to_insert.is_empty()
    }
}

/// Computes the changes that make the active set equal `requested ∪ {leader}`
///
/// Duplicate ids in `requested` collapse. If a user somehow has more than
/// one open row, the extra rows are ended and the oldest (lowest id) is
/// kept.
pub fn plan_sync(current: &[ActiveMembership], requested: &[i64], leader: Option<i64>) -> SyncPlan {
    let target: BTreeSet<i64> = requested.iter().copied().chain(leader).collect();

    let mut rows = current.to_vec();
    rows.sort_by_key(|row| row.row_id);

    let mut kept = BTreeSet::new();
    let mut to_end = Vec::new();

    for row in rows {
        if target.contains(&row.user_id) && kept.insert(row.user_id) {
            continue;
        }
        to_end.push(row.row_id);
    }

    let to_insert = target.difference(&kept).copied().collect();

    SyncPlan { to_end, to_insert }
}

/// What [`sync_members`] changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub ended_rows: usize,
    pub added_users: Vec<i64>,
}

/// Reconciles the active members of `subject` with `requested ∪ {leader}`
pub async fn sync_members<M>(
    ledger: &mut M,
    subject: i64,
    requested: &[i64],
    leader: Option<i64>,
    now: DateTime<Utc>,
) -> Result<SyncOutcome, sqlx::Error>
where
    M: MembershipLedger + ?Sized,
{
    let current = ledger.active_rows(subject).await?;
    let plan = plan_sync(&current, requested, leader);

    for row_id in &plan.to_end {
        ledger.end_row(*row_id, now).await?;
    }

    for user_id in &plan.to_insert {
        ledger.insert_active(subject, *user_id, now).await?;
    }

    Ok(SyncOutcome {
        ended_rows: plan.to_end.len(),
        added_users: plan.to_insert,
    })
}

/// Makes `user_id` an active member unless already; returns whether a row was added
pub async fn ensure_active_member<M>(
    ledger: &mut M,
    subject: i64,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error>
where
    M: MembershipLedger + ?Sized,
{
    let current = ledger.active_rows(subject).await?;
    if current.iter().any(|row| row.user_id == user_id) {
        return Ok(false);
    }

    ledger.insert_active(subject, user_id, now).await?;
    Ok(true)
}

/// Ends the active membership of `user_id`
///
/// Returns `false` without touching the ledger when the user is not an
/// active member.
pub async fn remove_member<M>(
    ledger: &mut M,
    subject: i64,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error>
where
    M: MembershipLedger + ?Sized,
{
    let rows: Vec<i64> = ledger
        .active_rows(subject)
        .await?
        .into_iter()
        .filter(|row| row.user_id == user_id)
        .map(|row| row.row_id)
        .collect();

    for row_id in &rows {
        ledger.end_row(*row_id, now).await?;
    }

    Ok(!rows.is_empty())
}

/// Ends every active membership of `subject`; returns how many were ended
pub async fn remove_all_members<M>(
    ledger: &mut M,
    subject: i64,
    now: DateTime<Utc>,
) -> Result<usize, sqlx::Error>
where
    M: MembershipLedger + ?Sized,
{
    let rows = ledger.active_rows(subject).await?;

    for row in &rows {
        ledger.end_row(row.row_id, now).await?;
    }

    Ok(rows.len())
}
