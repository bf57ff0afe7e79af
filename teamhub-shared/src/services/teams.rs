/// Teams, their leaders and their members
///
/// A team's leader is always an active member of it: setting a leader adds
/// the membership if it is missing. Leadership and membership changes go
/// through [`crate::ledger`] on the transaction that locks the team row.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::info;
use validator::Validate;

use super::activity::{self, actions, Actor};
use super::error::{ServiceError, ServiceResult};
use super::pagination::{Page, PageRequest};
use super::{normalize_optional, require_text};
use crate::db::soft_delete::{count_live, mark_deleted};
use crate::ledger::{self, postgres::{PgLeadershipLedger, PgMembershipLedger}};
use crate::models::project::{Project, ProjectSummary};
use crate::models::team::{Team, TeamCounts};
use crate::models::team_leadership::{LeadershipView, TeamLeadership};
use crate::models::team_membership::{MemberView, TeamMembership};
use crate::models::user::User;

pub const DUPLICATE_NAME: &str = "Team name already exists";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TeamInput {
    #[serde(default)]
    #[validate(length(max = 255, message = "Name must be less than 255 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be less than 1000 characters"))]
    pub description: Option<String>,

    pub leader_id: Option<i64>,
}

/// Team page: the team with its people and projects
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: Team,
    pub current_leader: Option<LeadershipView>,
    pub members: Vec<MemberView>,
    pub member_count: usize,
    pub projects: Vec<ProjectSummary>,
    pub leadership_history: Vec<LeadershipView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStatistics {
    pub team_id: i64,
    pub team_name: String,
    #[serde(flatten)]
    pub counts: TeamCounts,
}

async fn require_user(conn: &mut PgConnection, field: &str, user_id: i64) -> ServiceResult<User> {
    User::find_by_id(conn, user_id)
        .await?
        .ok_or_else(|| ServiceError::invalid(field, format!("User not found with id: {}", user_id)))
}

async fn lock_team(conn: &mut PgConnection, id: i64) -> ServiceResult<Team> {
    Team::lock(conn, id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Team", id))
}

/// Makes `leader_id` the leader of `team_id` and guarantees their membership
async fn apply_leader(conn: &mut PgConnection, team_id: i64, leader_id: Option<i64>) -> ServiceResult<()> {
    let now = Utc::now();

    let mut leaders = PgLeadershipLedger::team(&mut *conn);
    let transition = ledger::update_leader(&mut leaders, team_id, leader_id, now).await?;

    if let Some(leader_id) = leader_id {
        let mut members = PgMembershipLedger::team(&mut *conn);
        ledger::ensure_active_member(&mut members, team_id, leader_id, now).await?;
    }

    if transition.is_changed() {
        info!(team_id, leader_id = ?leader_id, "Team leader changed");
    }
    Ok(())
}

/// Inserts a team on an open connection
///
/// Shared by [`create_team`] and the CSV import, which runs each row in its
/// own savepoint.
pub(crate) async fn insert_team(
    conn: &mut PgConnection,
    actor: &Actor,
    name: &str,
    description: Option<&str>,
    leader_id: Option<i64>,
) -> ServiceResult<Team> {
    if Team::name_taken(&mut *conn, name, None).await? {
        return Err(ServiceError::Duplicate(DUPLICATE_NAME.to_string()));
    }

    if let Some(leader_id) = leader_id {
        require_user(conn, "leaderId", leader_id).await?;
    }

    let team = Team::create(&mut *conn, name, description)
        .await
        .map_err(|e| ServiceError::from_unique_violation(e, DUPLICATE_NAME))?;

    apply_leader(conn, team.id, leader_id).await?;

    activity::record(
        conn,
        actor,
        actions::CREATE_TEAM,
        "TEAM",
        team.id,
        format!("Created team: {}", team.name),
    )
    .await?;

    Ok(team)
}

pub async fn create_team(pool: &PgPool, actor: &Actor, input: TeamInput) -> ServiceResult<Team> {
    input.validate()?;
    let name = require_text("name", &input.name, "Name is required")?;
    let description = normalize_optional(input.description.as_deref());

    let mut tx = pool.begin().await?;
    let team = insert_team(&mut tx, actor, name, description, input.leader_id).await?;
    tx.commit().await?;

    info!(team_id = team.id, "Team created");
    Ok(team)
}

/// Renames the team and moves its leadership; `leader_id: None` ends it
pub async fn update_team(
    pool: &PgPool,
    actor: &Actor,
    id: i64,
    input: TeamInput,
) -> ServiceResult<Team> {
    input.validate()?;
    let name = require_text("name", &input.name, "Name is required")?;
    let description = normalize_optional(input.description.as_deref());

    let mut tx = pool.begin().await?;
    lock_team(&mut tx, id).await?;

    if Team::name_taken(&mut *tx, name, Some(id)).await? {
        return Err(ServiceError::Duplicate(DUPLICATE_NAME.to_string()));
    }

    if let Some(leader_id) = input.leader_id {
        require_user(&mut tx, "leaderId", leader_id).await?;
    }

    let team = Team::update(&mut *tx, id, name, description)
        .await
        .map_err(|e| ServiceError::from_unique_violation(e, DUPLICATE_NAME))?
        .ok_or_else(|| ServiceError::not_found("Team", id))?;

    apply_leader(&mut tx, id, input.leader_id).await?;

    activity::record(
        &mut tx,
        actor,
        actions::UPDATE_TEAM,
        "TEAM",
        id,
        format!("Updated team: {}", team.name),
    )
    .await?;

    tx.commit().await?;
    Ok(team)
}

/// Soft-deletes the team and closes its leadership and memberships
///
/// Projects keep their `team_id`; they are not deleted with the team.
pub async fn delete_team(pool: &PgPool, actor: &Actor, id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;
    let team = lock_team(&mut tx, id).await?;
    let now = Utc::now();

    let mut leaders = PgLeadershipLedger::team(&mut tx);
    ledger::end_all_leadership(&mut leaders, id, now).await?;

    let mut members = PgMembershipLedger::team(&mut tx);
    let removed = ledger::remove_all_members(&mut members, id, now).await?;

    mark_deleted::<Team, _>(&mut *tx, id).await?;

    activity::record(
        &mut tx,
        actor,
        actions::DELETE_TEAM,
        "TEAM",
        id,
        format!("Deleted team: {}", team.name),
    )
    .await?;

    tx.commit().await?;
    info!(team_id = id, removed_members = removed, "Team deleted");
    Ok(())
}

pub async fn get_team(pool: &PgPool, id: i64) -> ServiceResult<Team> {
    Team::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Team", id))
}

pub async fn team_detail(pool: &PgPool, id: i64) -> ServiceResult<TeamDetail> {
    let team = get_team(pool, id).await?;
    let current_leader = TeamLeadership::current(pool, id).await?;
    let members = TeamMembership::active_members(pool, id).await?;
    let projects = Project::for_team(pool, id).await?;
    let leadership_history = TeamLeadership::history(pool, id).await?;

    Ok(TeamDetail {
        team,
        current_leader,
        member_count: members.len(),
        members,
        projects,
        leadership_history,
    })
}

pub async fn list_teams(pool: &PgPool, page: &PageRequest) -> ServiceResult<Page<Team>> {
    let content = Team::list_page(pool, page).await?;
    let total = count_live::<Team, _>(pool).await?;
    Ok(Page::new(content, page, total))
}

pub async fn team_statistics(pool: &PgPool, id: i64) -> ServiceResult<TeamStatistics> {
    let team = get_team(pool, id).await?;
    let counts = Team::counts(pool, id).await?;

    Ok(TeamStatistics {
        team_id: team.id,
        team_name: team.name,
        counts,
    })
}

/// Adds one member; returns whether a membership was created
pub async fn add_member(pool: &PgPool, actor: &Actor, team_id: i64, user_id: i64) -> ServiceResult<bool> {
    add_members(pool, actor, team_id, &[user_id]).await.map(|added| added > 0)
}

/// Adds several members; returns how many were not already active
pub async fn add_members(
    pool: &PgPool,
    actor: &Actor,
    team_id: i64,
    user_ids: &[i64],
) -> ServiceResult<usize> {
    let mut tx = pool.begin().await?;
    let team = lock_team(&mut tx, team_id).await?;

    let mut users = Vec::with_capacity(user_ids.len());
    for user_id in user_ids {
        users.push(require_user(&mut tx, "userIds", *user_id).await?);
    }

    let now = Utc::now();
    let mut added = Vec::new();
    {
        let mut members = PgMembershipLedger::team(&mut tx);
        for user in &users {
            if ledger::ensure_active_member(&mut members, team_id, user.id, now).await? {
                added.push(user);
            }
        }
    }

    for user in &added {
        activity::record(
            &mut tx,
            actor,
            actions::ADD_TEAM_MEMBER,
            "TEAM",
            team_id,
            format!("Added {} to team {}", user.email, team.name),
        )
        .await?;
    }

    tx.commit().await?;
    Ok(added.len())
}

/// Ends a membership; a user who is not an active member is a no-op
///
/// Removing the current leader also ends their leadership.
pub async fn remove_member(pool: &PgPool, actor: &Actor, team_id: i64, user_id: i64) -> ServiceResult<bool> {
    let mut tx = pool.begin().await?;
    let team = lock_team(&mut tx, team_id).await?;
    let now = Utc::now();

    let mut members = PgMembershipLedger::team(&mut tx);
    let removed = ledger::remove_member(&mut members, team_id, user_id, now).await?;

    if !removed {
        return Ok(false);
    }

    let current = TeamLeadership::current(&mut *tx, team_id).await?;
    if current.map(|leader| leader.leader_id) == Some(user_id) {
        let mut leaders = PgLeadershipLedger::team(&mut tx);
        ledger::end_all_leadership(&mut leaders, team_id, now).await?;
    }

    activity::record(
        &mut tx,
        actor,
        actions::REMOVE_TEAM_MEMBER,
        "TEAM",
        team_id,
        format!("Removed user {} from team {}", user_id, team.name),
    )
    .await?;

    tx.commit().await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_input_length_limits() {
        let input = TeamInput {
            name: "x".repeat(256),
            description: None,
            leader_id: None,
        };
        assert!(input.validate().is_err());

        let input = TeamInput {
            name: "Backend".to_string(),
            description: Some("APIs".to_string()),
            leader_id: Some(3),
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_team_input_deserializes_camel_case() {
        let input: TeamInput =
            serde_json::from_str(r#"{"name":"Mobile","leaderId":7}"#).unwrap();
        assert_eq!(input.leader_id, Some(7));
        assert!(input.description.is_none());
    }

    #[test]
    fn test_statistics_flatten_counts() {
        let stats = TeamStatistics {
            team_id: 1,
            team_name: "Backend".to_string(),
            counts: TeamCounts {
                active_members: 2,
                total_members: 3,
                active_projects: 1,
                total_projects: 4,
            },
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["activeMembers"], 2);
        assert_eq!(json["totalProjects"], 4);
        assert_eq!(json["teamName"], "Backend");
    }
}
