/// Project membership ledger rows
///
/// Same interval semantics as team memberships: active while `left_at` is
/// null, leaving never deletes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use super::project::ProjectStatus;
use super::team_membership::{MemberView, MembershipStatus};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

/// A project a user took part in
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProjectParticipation {
    pub project_id: i64,
    pub project_name: String,
    pub abbreviation: Option<String>,
    pub project_status: ProjectStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_leader: bool,
}

impl ProjectMember {
    pub async fn active_members<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: i64,
    ) -> Result<Vec<MemberView>, sqlx::Error> {
        sqlx::query_as::<_, MemberView>(
            r#"
            SELECT m.id AS membership_id, m.user_id, u.name, u.email, m.status, m.joined_at, m.left_at
            FROM project_members m
            JOIN live_users u ON u.id = m.user_id
            WHERE m.project_id = $1 AND m.left_at IS NULL
            ORDER BY m.joined_at ASC, m.id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
    }

    /// Every project interval of a user, current ones first
    pub async fn history_for_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: i64,
    ) -> Result<Vec<UserProjectParticipation>, sqlx::Error> {
        sqlx::query_as::<_, UserProjectParticipation>(
            r#"
            SELECT m.project_id, p.name AS project_name, p.abbreviation,
                   p.status AS project_status, p.start_date, p.end_date,
                   m.joined_at, m.left_at, (m.left_at IS NULL) AS is_active,
                   EXISTS (
                       SELECT 1 FROM project_leadership_history l
                       WHERE l.project_id = m.project_id AND l.leader_id = m.user_id
                         AND l.ended_at IS NULL
                   ) AS is_leader
            FROM project_members m
            JOIN live_projects p ON p.id = m.project_id
            WHERE m.user_id = $1
            ORDER BY (m.left_at IS NULL) DESC, m.joined_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }
}
