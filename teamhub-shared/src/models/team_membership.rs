/// Team membership ledger rows
///
/// One row per interval a user spends in a team. A membership is active
/// exactly while `left_at` is null; leaving stamps `left_at` and flips the
/// status to INACTIVE. Rejoining creates a new row. Writes go through
/// [`crate::ledger`]; this module holds the row types and read queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipStatus {
    Active,
    Inactive,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Active => "ACTIVE",
            MembershipStatus::Inactive => "INACTIVE",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMembership {
    pub id: i64,
    pub team_id: i64,
    pub user_id: i64,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

impl TeamMembership {
    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }
}

/// A member as shown on team and project detail pages
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub membership_id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

/// A team a user belongs or belonged to
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserTeamMembership {
    pub team_id: i64,
    pub team_name: String,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl TeamMembership {
    /// Active members of a live team, oldest first
    pub async fn active_members<'e, E: PgExecutor<'e>>(
        executor: E,
        team_id: i64,
    ) -> Result<Vec<MemberView>, sqlx::Error> {
        sqlx::query_as::<_, MemberView>(
            r#"
            SELECT m.id AS membership_id, m.user_id, u.name, u.email, m.status, m.joined_at, m.left_at
            FROM team_memberships m
            JOIN live_users u ON u.id = m.user_id
            WHERE m.team_id = $1 AND m.left_at IS NULL
            ORDER BY m.joined_at ASC, m.id ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(executor)
        .await
    }

    pub async fn is_active_member<'e, E: PgExecutor<'e>>(
        executor: E,
        team_id: i64,
        user_id: i64,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM team_memberships
                WHERE team_id = $1 AND user_id = $2 AND left_at IS NULL
            )
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    /// Full team history of a user, current memberships first
    pub async fn history_for_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: i64,
    ) -> Result<Vec<UserTeamMembership>, sqlx::Error> {
        sqlx::query_as::<_, UserTeamMembership>(
            r#"
            SELECT m.team_id, t.name AS team_name, m.status, m.joined_at, m.left_at,
                   (m.left_at IS NULL) AS is_active
            FROM team_memberships m
            JOIN live_teams t ON t.id = m.team_id
            WHERE m.user_id = $1
            ORDER BY (m.left_at IS NULL) DESC, m.joined_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_iff_left_at_null() {
        let mut row = TeamMembership {
            id: 1,
            team_id: 1,
            user_id: 2,
            status: MembershipStatus::Active,
            joined_at: Utc::now(),
            left_at: None,
        };
        assert!(row.is_active());

        row.left_at = Some(Utc::now());
        assert!(!row.is_active());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&MembershipStatus::Inactive).unwrap(),
            "\"INACTIVE\""
        );
        assert_eq!(MembershipStatus::Active.as_str(), "ACTIVE");
    }
}
