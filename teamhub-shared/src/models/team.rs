/// Teams
///
/// A team is the unit that owns projects. Its membership and leadership
/// history live in `team_memberships` and `team_leadership_history`; this
/// module only covers the team row itself plus the aggregate counts used by
/// the statistics page and the CSV export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use crate::db::soft_delete::SoftDelete;
use crate::services::pagination::PageRequest;

pub const SORT_COLUMNS: &[&str] = &["name", "created_at", "updated_at", "id"];

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i64,
    /// Unique among live teams (exact match)
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDelete for Team {
    const TABLE: &'static str = "teams";
    const LIVE_VIEW: &'static str = "live_teams";
}

/// Per-team aggregates
///
/// Active members have an open membership row with status ACTIVE; total
/// members counts every open row. Active projects exclude COMPLETED and
/// CANCELLED.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamCounts {
    pub active_members: i64,
    pub total_members: i64,
    pub active_projects: i64,
    pub total_projects: i64,
}

/// One line of the team export
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamExportRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub leader_name: Option<String>,
    pub leader_email: Option<String>,
    pub active_members: i64,
    pub total_members: i64,
    pub active_projects: i64,
    pub total_projects: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
        description: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Team>("INSERT INTO teams (name, description) VALUES ($1, $2) RETURNING *")
            .bind(name)
            .bind(description)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Team>("SELECT * FROM live_teams WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Locks the live team row for the rest of the transaction
    ///
    /// Serializes concurrent ledger writes for the same team.
    pub async fn lock<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            "SELECT * FROM teams WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
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
                SELECT 1 FROM live_teams
                WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2)
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
        sqlx::query_as::<_, Team>(
            r#"
            UPDATE teams SET name = $2, description = $3, updated_at = NOW()
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
            "SELECT * FROM live_teams {} LIMIT $1 OFFSET $2",
            page.order_by(SORT_COLUMNS)
        );

        sqlx::query_as::<_, Team>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(executor)
            .await
    }

    pub async fn counts<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<TeamCounts, sqlx::Error> {
        sqlx::query_as::<_, TeamCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM team_memberships m JOIN live_users u ON u.id = m.user_id
                  WHERE m.team_id = $1 AND m.left_at IS NULL AND m.status = 'ACTIVE') AS active_members,
                (SELECT COUNT(*) FROM team_memberships m JOIN live_users u ON u.id = m.user_id
                  WHERE m.team_id = $1 AND m.left_at IS NULL) AS total_members,
                (SELECT COUNT(*) FROM live_projects p
                  WHERE p.team_id = $1 AND p.status NOT IN ('COMPLETED', 'CANCELLED')) AS active_projects,
                (SELECT COUNT(*) FROM live_projects p WHERE p.team_id = $1) AS total_projects
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await
    }

    /// Every live team with its current leader and aggregates, ordered by id
    pub async fn export_rows<'e, E: PgExecutor<'e>>(
        executor: E,
    ) -> Result<Vec<TeamExportRow>, sqlx::Error> {
        sqlx::query_as::<_, TeamExportRow>(
            r#"
            SELECT
                t.id, t.name, t.description,
                u.name AS leader_name, u.email AS leader_email,
                (SELECT COUNT(*) FROM team_memberships m
                  WHERE m.team_id = t.id AND m.left_at IS NULL AND m.status = 'ACTIVE') AS active_members,
                (SELECT COUNT(*) FROM team_memberships m
                  WHERE m.team_id = t.id AND m.left_at IS NULL) AS total_members,
                (SELECT COUNT(*) FROM live_projects p
                  WHERE p.team_id = t.id AND p.status NOT IN ('COMPLETED', 'CANCELLED')) AS active_projects,
                (SELECT COUNT(*) FROM live_projects p WHERE p.team_id = t.id) AS total_projects,
                t.created_at, t.updated_at
            FROM live_teams t
            LEFT JOIN team_leadership_history l ON l.team_id = t.id AND l.ended_at IS NULL
            LEFT JOIN live_users u ON u.id = l.leader_id
            ORDER BY t.id ASC
            "#,
        )
        .fetch_all(executor)
        .await
    }
}
