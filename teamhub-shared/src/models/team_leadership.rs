/// Team leadership ledger rows
///
/// At most one row per team has `ended_at` null: the current leader. The
/// partial unique index `team_leadership_open_key` backs this up at the
/// storage level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamLeadership {
    pub id: i64,
    pub team_id: i64,
    pub leader_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// A leadership interval joined with the leader's identity
///
/// Shared by team and project detail pages.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeadershipView {
    pub id: i64,
    pub leader_id: i64,
    pub leader_name: String,
    pub leader_email: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub is_current: bool,
}

impl TeamLeadership {
    pub async fn current<'e, E: PgExecutor<'e>>(
        executor: E,
        team_id: i64,
    ) -> Result<Option<LeadershipView>, sqlx::Error> {
        sqlx::query_as::<_, LeadershipView>(
            r#"
            SELECT l.id, l.leader_id, u.name AS leader_name, u.email AS leader_email,
                   l.started_at, l.ended_at, TRUE AS is_current
            FROM team_leadership_history l
            JOIN live_users u ON u.id = l.leader_id
            WHERE l.team_id = $1 AND l.ended_at IS NULL
            "#,
        )
        .bind(team_id)
        .fetch_optional(executor)
        .await
    }

    /// Every leadership interval of a team, newest first
    pub async fn history<'e, E: PgExecutor<'e>>(
        executor: E,
        team_id: i64,
    ) -> Result<Vec<LeadershipView>, sqlx::Error> {
        sqlx::query_as::<_, LeadershipView>(
            r#"
            SELECT l.id, l.leader_id, u.name AS leader_name, u.email AS leader_email,
                   l.started_at, l.ended_at, (l.ended_at IS NULL) AS is_current
            FROM team_leadership_history l
            JOIN users u ON u.id = l.leader_id
            WHERE l.team_id = $1
            ORDER BY l.started_at DESC, l.id DESC
            "#,
        )
        .bind(team_id)
        .fetch_all(executor)
        .await
    }
}
