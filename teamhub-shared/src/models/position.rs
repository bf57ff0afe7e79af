/// Positions catalog
///
/// Both the name and the abbreviation are unique among live positions,
/// ignoring case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use crate::db::soft_delete::SoftDelete;
use crate::services::pagination::PageRequest;

pub const SORT_COLUMNS: &[&str] = &["name", "abbreviation", "created_at", "updated_at", "id"];

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: i64,
    pub name: String,
    pub abbreviation: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDelete for Position {
    const TABLE: &'static str = "positions";
    const LIVE_VIEW: &'static str = "live_positions";
}

impl Position {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
        abbreviation: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Position>(
            "INSERT INTO positions (name, abbreviation) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(abbreviation)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Position>("SELECT * FROM live_positions WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn name_taken<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM live_positions
                WHERE LOWER(name) = LOWER($1) AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name.trim())
        .bind(exclude_id)
        .fetch_one(executor)
        .await
    }

    pub async fn abbreviation_taken<'e, E: PgExecutor<'e>>(
        executor: E,
        abbreviation: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM live_positions
                WHERE LOWER(abbreviation) = LOWER($1) AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(abbreviation.trim())
        .bind(exclude_id)
        .fetch_one(executor)
        .await
    }

    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
        name: &str,
        abbreviation: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Position>(
            r#"
            UPDATE positions SET name = $2, abbreviation = $3, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(abbreviation)
        .fetch_optional(executor)
        .await
    }

    pub async fn list_page<'e, E: PgExecutor<'e>>(
        executor: E,
        page: &PageRequest,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT * FROM live_positions {} LIMIT $1 OFFSET $2",
            page.order_by(SORT_COLUMNS)
        );

        sqlx::query_as::<_, Position>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(executor)
            .await
    }
}
