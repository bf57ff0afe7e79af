/// Position history of users
///
/// A user holds at most one current position (`ended_at` null).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserPosition {
    pub id: i64,
    pub user_id: i64,
    pub position_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserPositionHistory {
    pub position_id: i64,
    pub position_name: String,
    pub abbreviation: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub is_current: bool,
}

impl UserPosition {
    pub async fn current<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserPosition>(
            "SELECT * FROM user_positions WHERE user_id = $1 AND ended_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn end<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE user_positions SET ended_at = NOW() WHERE id = $1 AND ended_at IS NULL")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: i64,
        position_id: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UserPosition>(
            "INSERT INTO user_positions (user_id, position_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(position_id)
        .fetch_one(executor)
        .await
    }

    /// All positions a user has held, current first
    pub async fn history<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: i64,
    ) -> Result<Vec<UserPositionHistory>, sqlx::Error> {
        sqlx::query_as::<_, UserPositionHistory>(
            r#"
            SELECT up.position_id, p.name AS position_name, p.abbreviation,
                   up.started_at, up.ended_at, (up.ended_at IS NULL) AS is_current
            FROM user_positions up
            JOIN positions p ON p.id = up.position_id
            WHERE up.user_id = $1
            ORDER BY (up.ended_at IS NULL) DESC, up.started_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }
}
