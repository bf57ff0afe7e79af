//! PostgreSQL ledgers
//!
//! Each ledger borrows one connection, normally the caller's open
//! transaction, so every read and write of a transition shares it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use super::{ActiveMembership, LeadershipLedger, MembershipLedger, OpenLeadership};

/// Table layout of a ledger: table name plus the subject foreign key
#[derive(Debug)]
pub struct LedgerTable {
    pub table: &'static str,
    pub subject_column: &'static str,
}

pub const TEAM_LEADERSHIP: LedgerTable = LedgerTable {
    table: "team_leadership_history",
    subject_column: "team_id",
};

pub const PROJECT_LEADERSHIP: LedgerTable = LedgerTable {
    table: "project_leadership_history",
    subject_column: "project_id",
};

pub const TEAM_MEMBERSHIP: LedgerTable = LedgerTable {
    table: "team_memberships",
    subject_column: "team_id",
};

pub const PROJECT_MEMBERSHIP: LedgerTable = LedgerTable {
    table: "project_members",
    subject_column: "project_id",
};

pub struct PgLeadershipLedger<'c> {
    conn: &'c mut PgConnection,
    layout: &'static LedgerTable,
}

impl<'c> PgLeadershipLedger<'c> {
    pub fn team(conn: &'c mut PgConnection) -> Self {
        Self {
            conn,
            layout: &TEAM_LEADERSHIP,
        }
    }

    pub fn project(conn: &'c mut PgConnection) -> Self {
        Self {
            conn,
            layout: &PROJECT_LEADERSHIP,
        }
    }
}

#[async_trait]
impl LeadershipLedger for PgLeadershipLedger<'_> {
    async fn open_row(&mut self, subject: i64) -> Result<Option<OpenLeadership>, sqlx::Error> {
        let sql = format!(
            "SELECT id, leader_id FROM {} WHERE {} = $1 AND ended_at IS NULL ORDER BY id ASC LIMIT 1 FOR UPDATE",
            self.layout.table, self.layout.subject_column
        );

        let row: Option<(i64, i64)> = sqlx::query_as(&sql)
            .bind(subject)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(row.map(|(row_id, leader_id)| OpenLeadership { row_id, leader_id }))
    }

    async fn close_row(&mut self, row_id: i64, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        let sql = format!(
            "UPDATE {} SET ended_at = $2 WHERE id = $1 AND ended_at IS NULL",
            self.layout.table
        );

        sqlx::query(&sql)
            .bind(row_id)
            .bind(at)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    async fn insert_open(
        &mut self,
        subject: i64,
        leader_id: i64,
        at: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let sql = format!(
            "INSERT INTO {} ({}, leader_id, started_at) VALUES ($1, $2, $3) RETURNING id",
            self.layout.table, self.layout.subject_column
        );

        sqlx::query_scalar(&sql)
            .bind(subject)
            .bind(leader_id)
            .bind(at)
            .fetch_one(&mut *self.conn)
            .await
    }
}

pub struct PgMembershipLedger<'c> {
    conn: &'c mut PgConnection,
    layout: &'static LedgerTable,
}

impl<'c> PgMembershipLedger<'c> {
    pub fn team(conn: &'c mut PgConnection) -> Self {
        Self {
            conn,
            layout: &TEAM_MEMBERSHIP,
        }
    }

    pub fn project(conn: &'c mut PgConnection) -> Self {
        Self {
            conn,
            layout: &PROJECT_MEMBERSHIP,
        }
    }
}

#[async_trait]
impl MembershipLedger for PgMembershipLedger<'_> {
    async fn active_rows(&mut self, subject: i64) -> Result<Vec<ActiveMembership>, sqlx::Error> {
        let sql = format!(
            "SELECT id, user_id FROM {} WHERE {} = $1 AND left_at IS NULL ORDER BY id ASC FOR UPDATE",
            self.layout.table, self.layout.subject_column
        );

        let rows: Vec<(i64, i64)> = sqlx::query_as(&sql)
            .bind(subject)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(row_id, user_id)| ActiveMembership { row_id, user_id })
            .collect())
    }

    async fn end_row(&mut self, row_id: i64, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        let sql = format!(
            "UPDATE {} SET left_at = $2, status = 'INACTIVE' WHERE id = $1 AND left_at IS NULL",
            self.layout.table
        );

        sqlx::query(&sql)
            .bind(row_id)
            .bind(at)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    async fn insert_active(
        &mut self,
        subject: i64,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let sql = format!(
            "INSERT INTO {} ({}, user_id, status, joined_at) VALUES ($1, $2, 'ACTIVE', $3) RETURNING id",
            self.layout.table, self.layout.subject_column
        );

        sqlx::query_scalar(&sql)
            .bind(subject)
            .bind(user_id)
            .bind(at)
            .fetch_one(&mut *self.conn)
            .await
    }
}

/// Ends every open membership and leadership row held by a user
///
/// Used when the user is deleted. Returns the number of rows closed.
pub async fn close_all_for_user(
    conn: &mut PgConnection,
    user_id: i64,
    at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let mut closed = 0;

    for layout in [&TEAM_MEMBERSHIP, &PROJECT_MEMBERSHIP] {
        let sql = format!(
            "UPDATE {} SET left_at = $2, status = 'INACTIVE' WHERE user_id = $1 AND left_at IS NULL",
            layout.table
        );
        closed += sqlx::query(&sql)
            .bind(user_id)
            .bind(at)
            .execute(&mut *conn)
            .await?
            .rows_affected();
    }

    for layout in [&TEAM_LEADERSHIP, &PROJECT_LEADERSHIP] {
        let sql = format!(
            "UPDATE {} SET ended_at = $2 WHERE leader_id = $1 AND ended_at IS NULL",
            layout.table
        );
        closed += sqlx::query(&sql)
            .bind(user_id)
            .bind(at)
            .execute(&mut *conn)
            .await?
            .rows_affected();
    }

    Ok(closed)
}
