//! In-memory ledgers backing the ledger unit tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ActiveMembership, LeadershipLedger, MembershipLedger, OpenLeadership};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadershipRow {
    pub id: i64,
    pub subject: i64,
    pub leader_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct MemoryLeadership {
    rows: Vec<LeadershipRow>,
}

impl MemoryLeadership {
    pub fn rows_for(&self, subject: i64) -> Vec<LeadershipRow> {
        self.rows.iter().filter(|r| r.subject == subject).cloned().collect()
    }

    pub fn open_count(&self, subject: i64) -> usize {
        self.rows
            .iter()
            .filter(|r| r.subject == subject && r.ended_at.is_none())
            .count()
    }
}

#[async_trait]
impl LeadershipLedger for MemoryLeadership {
    async fn open_row(&mut self, subject: i64) -> Result<Option<OpenLeadership>, sqlx::Error> {
        Ok(self
            .rows
            .iter()
            .find(|r| r.subject == subject && r.ended_at.is_none())
            .map(|r| OpenLeadership {
                row_id: r.id,
                leader_id: r.leader_id,
            }))
    }

    async fn close_row(&mut self, row_id: i64, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        if let Some(row) = self.rows.iter_mut().find(|r| r.id == row_id && r.ended_at.is_none()) {
            row.ended_at = Some(at);
        }
        Ok(())
    }

    async fn insert_open(
        &mut self,
        subject: i64,
        leader_id: i64,
        at: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let id = self.rows.len() as i64 + 1;
        self.rows.push(LeadershipRow {
            id,
            subject,
            leader_id,
            started_at: at,
            ended_at: None,
        });
        Ok(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipRow {
    pub id: i64,
    pub subject: i64,
    pub user_id: i64,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct MemoryMembership {
    rows: Vec<MembershipRow>,
}

impl MemoryMembership {
    pub fn rows_for(&self, subject: i64) -> Vec<MembershipRow> {
        self.rows.iter().filter(|r| r.subject == subject).cloned().collect()
    }

    /// Sorted user ids with an open row
    pub fn active_users(&self, subject: i64) -> Vec<i64> {
        let mut users: Vec<i64> = self
            .rows
            .iter()
            .filter(|r| r.subject == subject && r.left_at.is_none())
            .map(|r| r.user_id)
            .collect();
        users.sort_unstable();
        users
    }
}

#[async_trait]
impl MembershipLedger for MemoryMembership {
    async fn active_rows(&mut self, subject: i64) -> Result<Vec<ActiveMembership>, sqlx::Error> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.subject == subject && r.left_at.is_none())
            .map(|r| ActiveMembership {
                row_id: r.id,
                user_id: r.user_id,
            })
            .collect())
    }

    async fn end_row(&mut self, row_id: i64, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        if let Some(row) = self.rows.iter_mut().find(|r| r.id == row_id && r.left_at.is_none()) {
            row.left_at = Some(at);
        }
        Ok(())
    }

    async fn insert_active(
        &mut self,
        subject: i64,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let id = self.rows.len() as i64 + 1;
        self.rows.push(MembershipRow {
            id,
            subject,
            user_id,
            joined_at: at,
            left_at: None,
        });
        Ok(id)
    }
}
