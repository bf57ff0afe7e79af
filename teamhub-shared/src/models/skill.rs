/// Skills catalog
///
/// Skill names are unique among live skills, ignoring case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use crate::db::soft_delete::SoftDelete;
use crate::services::pagination::PageRequest;

/// Columns a skill list may be sorted by
pub const SORT_COLUMNS: &[&str] = &["name", "created_at", "updated_at", "id"];

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDelete for Skill {
    const TABLE: &'static str = "skills";
    const LIVE_VIEW: &'static str = "live_skills";
}

impl Skill {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
        description: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Skill>(
            "INSERT INTO skills (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Skill>("SELECT * FROM live_skills WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Case-insensitive name check; `exclude_id` lets an update keep its own name
    pub async fn name_taken<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM live_skills
                WHERE LOWER(name) = LOWER($1) AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name.trim())
        .bind(exclude_id)
        .fetch_one(executor)
        .await
    }

    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Skill>(
            r#"
            UPDATE skills SET name = $2, description = $3, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(executor)
        .await
    }

    pub async fn list_page<'e, E: PgExecutor<'e>>(
        executor: E,
        page: &PageRequest,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT * FROM live_skills {} LIMIT $1 OFFSET $2",
            page.order_by(SORT_COLUMNS)
        );

        sqlx::query_as::<_, Skill>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(executor)
            .await
    }

    pub async fn list_all<'e, E: PgExecutor<'e>>(executor: E) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Skill>("SELECT * FROM live_skills ORDER BY name ASC")
            .fetch_all(executor)
            .await
    }
}
