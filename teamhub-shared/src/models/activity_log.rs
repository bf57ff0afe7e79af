/// Audit trail
///
/// Rows are inserted and listed, never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: i64,
    /// e.g. `CREATE_TEAM`, `UPDATE_PROJECT`
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub description: Option<String>,
    /// Actor; None for system actions such as the nightly refresh
    pub user_id: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewActivityLog {
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub description: Option<String>,
    pub user_id: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ActivityLog {
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        entry: NewActivityLog,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ActivityLog>(
            r#"
            INSERT INTO activity_logs
                (action, entity_type, entity_id, description, user_id, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.description)
        .bind(entry.user_id)
        .bind(entry.ip_address)
        .bind(entry.user_agent)
        .fetch_one(executor)
        .await
    }

    /// Newest first
    pub async fn list_recent<'e, E: PgExecutor<'e>>(
        executor: E,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityLog>(
            "SELECT * FROM activity_logs ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
    }

    pub async fn count<'e, E: PgExecutor<'e>>(executor: E) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs")
            .fetch_one(executor)
            .await
    }
}
