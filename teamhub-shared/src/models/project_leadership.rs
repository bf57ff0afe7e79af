/// Project leadership ledger rows
///
/// Mirrors [`super::team_leadership`]: at most one open row per project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use super::team_leadership::LeadershipView;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLeadership {
    pub id: i64,
    pub project_id: i64,
    pub leader_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl ProjectLeadership {
    pub async fn current<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: i64,
    ) -> Result<Option<LeadershipView>, sqlx::Error> {
        sqlx::query_as::<_, LeadershipView>(
            r#"
            SELECT l.id, l.leader_id, u.name AS leader_name, u.email AS leader_email,
                   l.started_at, l.ended_at, TRUE AS is_current
            FROM project_leadership_history l
            JOIN live_users u ON u.id = l.leader_id
            WHERE l.project_id = $1 AND l.ended_at IS NULL
            "#,
        )
        .bind(project_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn history<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: i64,
    ) -> Result<Vec<LeadershipView>, sqlx::Error> {
        sqlx::query_as::<_, LeadershipView>(
            r#"
            SELECT l.id, l.leader_id, u.name AS leader_name, u.email AS leader_email,
                   l.started_at, l.ended_at, (l.ended_at IS NULL) AS is_current
            FROM project_leadership_history l
            JOIN users u ON u.id = l.leader_id
            WHERE l.project_id = $1
            ORDER BY l.started_at DESC, l.id DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
    }
}
