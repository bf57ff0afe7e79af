/// Projects
///
/// A project belongs to at most one team and carries a status derived from
/// its dates (see [`crate::status`]). Every write bumps `version`; updates
/// that race each other are detected by comparing it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     abbreviation VARCHAR(50),
///     start_date DATE NOT NULL,
///     end_date DATE,
///     status project_status NOT NULL DEFAULT 'UPCOMING',
///     team_id BIGINT REFERENCES teams(id),
///     version BIGINT NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use std::str::FromStr;

use crate::db::soft_delete::SoftDelete;
use crate::services::pagination::PageRequest;

pub const SORT_COLUMNS: &[&str] = &[
    "name",
    "abbreviation",
    "start_date",
    "end_date",
    "status",
    "created_at",
    "updated_at",
    "id",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    /// Start date is in the future
    Upcoming,

    /// Between start and end date, both inclusive
    Active,

    /// End date has passed
    Completed,

    /// Stopped manually; never recomputed from dates
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Upcoming => "UPCOMING",
            ProjectStatus::Active => "ACTIVE",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::Cancelled => "CANCELLED",
        }
    }

    /// Whether the project still counts towards a team's active projects
    pub fn is_open(&self) -> bool {
        matches!(self, ProjectStatus::Upcoming | ProjectStatus::Active)
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UPCOMING" => Ok(ProjectStatus::Upcoming),
            "ACTIVE" => Ok(ProjectStatus::Active),
            "COMPLETED" => Ok(ProjectStatus::Completed),
            "CANCELLED" => Ok(ProjectStatus::Cancelled),
            other => Err(format!("Unknown project status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub abbreviation: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: ProjectStatus,
    pub team_id: Option<i64>,
    /// Incremented on every write
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDelete for Project {
    const TABLE: &'static str = "projects";
    const LIVE_VIEW: &'static str = "live_projects";
}

/// Column values written on create and update
#[derive(Debug, Clone)]
pub struct ProjectFields {
    pub name: String,
    pub abbreviation: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: ProjectStatus,
    pub team_id: Option<i64>,
}

/// The columns the status refresh needs
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusSnapshot {
    pub id: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: ProjectStatus,
    pub version: i64,
}

/// A project as listed on a user profile or team page
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
    pub abbreviation: Option<String>,
    pub status: ProjectStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl Project {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        fields: &ProjectFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, abbreviation, start_date, end_date, status, team_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.abbreviation)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(fields.status)
        .bind(fields.team_id)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>("SELECT * FROM live_projects WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Locks the live project row for the rest of the transaction
    pub async fn lock<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Writes all fields if the stored version still equals `expected_version`
    ///
    /// Returns `None` when the project is gone or the version moved on.
    pub async fn update_versioned<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
        expected_version: i64,
        fields: &ProjectFields,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = $3, abbreviation = $4, start_date = $5, end_date = $6,
                status = $7, team_id = $8, version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(&fields.name)
        .bind(&fields.abbreviation)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(fields.status)
        .bind(fields.team_id)
        .fetch_optional(executor)
        .await
    }

    /// Sets the status if the stored version still equals `expected_version`
    ///
    /// Returns whether the row was written.
    pub async fn set_status_versioned<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
        expected_version: i64,
        status: ProjectStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET status = $3, version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(status)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Page of live projects, optionally restricted to one team
    pub async fn list_page<'e, E: PgExecutor<'e>>(
        executor: E,
        page: &PageRequest,
        team_id: Option<i64>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT * FROM live_projects WHERE ($1::BIGINT IS NULL OR team_id = $1) {} LIMIT $2 OFFSET $3",
            page.order_by(SORT_COLUMNS)
        );

        sqlx::query_as::<_, Project>(&sql)
            .bind(team_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(executor)
            .await
    }

    pub async fn count<'e, E: PgExecutor<'e>>(
        executor: E,
        team_id: Option<i64>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM live_projects WHERE ($1::BIGINT IS NULL OR team_id = $1)")
            .bind(team_id)
            .fetch_one(executor)
            .await
    }

    pub async fn for_team<'e, E: PgExecutor<'e>>(
        executor: E,
        team_id: i64,
    ) -> Result<Vec<ProjectSummary>, sqlx::Error> {
        sqlx::query_as::<_, ProjectSummary>(
            r#"
            SELECT id, name, abbreviation, status, start_date, end_date
            FROM live_projects
            WHERE team_id = $1
            ORDER BY start_date DESC, id DESC
            "#,
        )
        .bind(team_id)
        .fetch_all(executor)
        .await
    }

    /// Live projects in id order, for the status refresh
    pub async fn status_snapshots<'e, E: PgExecutor<'e>>(
        executor: E,
    ) -> Result<Vec<StatusSnapshot>, sqlx::Error> {
        sqlx::query_as::<_, StatusSnapshot>(
            "SELECT id, start_date, end_date, status, version FROM live_projects ORDER BY id ASC",
        )
        .fetch_all(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_through_str() {
        for status in [
            ProjectStatus::Upcoming,
            ProjectStatus::Active,
            ProjectStatus::Completed,
            ProjectStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<ProjectStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_open_statuses() {
        assert!(ProjectStatus::Upcoming.is_open());
        assert!(ProjectStatus::Active.is_open());
        assert!(!ProjectStatus::Completed.is_open());
        assert!(!ProjectStatus::Cancelled.is_open());
    }
}
