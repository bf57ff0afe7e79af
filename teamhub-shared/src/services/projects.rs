/// Projects
///
/// Status is never taken from the caller: it is derived from the dates on
/// every write (a cancelled project stays cancelled). Updates carry the
/// version the caller last read and fail with `Conflict` if the row moved
/// on in between, which also covers a concurrent nightly status refresh.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use std::collections::BTreeSet;
use tracing::info;
use validator::Validate;

use super::activity::{self, actions, Actor};
use super::error::{FieldError, ServiceError, ServiceResult};
use super::pagination::{Page, PageRequest};
use super::{normalize_optional, require_text};
use crate::db::soft_delete::mark_deleted;
use crate::ledger::{self, postgres::{PgLeadershipLedger, PgMembershipLedger}};
use crate::models::project::{Project, ProjectFields, ProjectStatus};
use crate::models::project_leadership::ProjectLeadership;
use crate::models::project_member::ProjectMember;
use crate::models::team::Team;
use crate::models::team_leadership::LeadershipView;
use crate::models::team_membership::{MemberView, TeamMembership};
use crate::models::user::User;
use crate::status::next_status;

const STALE_VERSION: &str = "Project was modified by someone else; reload and try again";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    #[serde(default)]
    #[validate(length(max = 255, message = "Name must be less than 255 characters"))]
    pub name: String,

    #[validate(length(max = 50, message = "Abbreviation must be less than 50 characters"))]
    pub abbreviation: Option<String>,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,

    pub team_id: Option<i64>,

    pub leader_id: Option<i64>,

    #[serde(default)]
    pub member_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub team: Option<Team>,
    pub current_leader: Option<LeadershipView>,
    pub members: Vec<MemberView>,
    pub member_count: usize,
    pub leadership_history: Vec<LeadershipView>,
}

/// Checked, trimmed input ready to be written
struct ProjectPlan {
    fields: ProjectFields,
    leader_id: Option<i64>,
    member_ids: Vec<i64>,
}

fn check_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> ServiceResult<NaiveDate> {
    let start = start.ok_or_else(|| ServiceError::invalid("startDate", "Start date is required"))?;

    if let Some(end) = end {
        if end < start {
            return Err(ServiceError::invalid(
                "endDate",
                "End date must be on or after the start date",
            ));
        }
    }

    Ok(start)
}

/// Validates the input against the database and computes the new status
///
/// Every member and the leader must be live users; when the project belongs
/// to a team they must also be active members of it.
async fn prepare(
    conn: &mut PgConnection,
    input: &ProjectInput,
    current_status: ProjectStatus,
    today: NaiveDate,
) -> ServiceResult<ProjectPlan> {
    input.validate()?;
    let name = require_text("name", &input.name, "Name is required")?;
    let abbreviation = normalize_optional(input.abbreviation.as_deref());
    let start_date = check_dates(input.start_date, input.end_date)?;

    if let Some(team_id) = input.team_id {
        if Team::find_by_id(&mut *conn, team_id).await?.is_none() {
            return Err(ServiceError::invalid(
                "teamId",
                format!("Team not found with id: {}", team_id),
            ));
        }
    }

    let people: BTreeSet<i64> = input.member_ids.iter().copied().chain(input.leader_id).collect();
    let ids: Vec<i64> = people.iter().copied().collect();
    let found: BTreeSet<i64> = User::find_many(&mut *conn, &ids)
        .await?
        .into_iter()
        .map(|user| user.id)
        .collect();

    let mut errors = Vec::new();
    for id in &ids {
        if !found.contains(id) {
            errors.push(FieldError::new("memberIds", format!("User not found with id: {}", id)));
        } else if let Some(team_id) = input.team_id {
            if !TeamMembership::is_active_member(&mut *conn, team_id, *id).await? {
                errors.push(FieldError::new(
                    "memberIds",
                    format!("User {} is not an active member of team {}", id, team_id),
                ));
            }
        }
    }
    if !errors.is_empty() {
        return Err(ServiceError::Validation(errors));
    }

    let status = next_status(current_status, start_date, input.end_date, today);

    Ok(ProjectPlan {
        fields: ProjectFields {
            name: name.to_string(),
            abbreviation: abbreviation.map(str::to_string),
            start_date,
            end_date: input.end_date,
            status,
            team_id: input.team_id,
        },
        leader_id: input.leader_id,
        member_ids: ids,
    })
}

/// Leader transition followed by member sync, on the caller's transaction
async fn apply_people(
    conn: &mut PgConnection,
    project_id: i64,
    leader_id: Option<i64>,
    member_ids: &[i64],
) -> ServiceResult<()> {
    let now = Utc::now();

    let mut leaders = PgLeadershipLedger::project(&mut *conn);
    ledger::update_leader(&mut leaders, project_id, leader_id, now).await?;

    let mut members = PgMembershipLedger::project(&mut *conn);
    let outcome = ledger::sync_members(&mut members, project_id, member_ids, leader_id, now).await?;

    info!(
        project_id,
        ended = outcome.ended_rows,
        added = outcome.added_users.len(),
        "Project members synced"
    );
    Ok(())
}

async fn lock_project(conn: &mut PgConnection, id: i64) -> ServiceResult<Project> {
    Project::lock(conn, id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Project", id))
}

/// Creates a project whose status is derived as of `today`
pub async fn create_project(
    pool: &PgPool,
    actor: &Actor,
    input: ProjectInput,
    today: NaiveDate,
) -> ServiceResult<Project> {
    let mut tx = pool.begin().await?;
    let plan = prepare(&mut tx, &input, ProjectStatus::Upcoming, today).await?;

    if let Some(team_id) = plan.fields.team_id {
        Team::lock(&mut *tx, team_id).await?;
    }

    let project = Project::create(&mut *tx, &plan.fields).await?;
    apply_people(&mut tx, project.id, plan.leader_id, &plan.member_ids).await?;

    activity::record(
        &mut tx,
        actor,
        actions::CREATE_PROJECT,
        "PROJECT",
        project.id,
        format!("Created project: {}", project.name),
    )
    .await?;

    tx.commit().await?;
    info!(project_id = project.id, status = project.status.as_str(), "Project created");
    Ok(project)
}

/// Writes the project if it is still at `expected_version`
pub async fn update_project(
    pool: &PgPool,
    actor: &Actor,
    id: i64,
    expected_version: i64,
    input: ProjectInput,
    today: NaiveDate,
) -> ServiceResult<Project> {
    let mut tx = pool.begin().await?;
    let current = lock_project(&mut tx, id).await?;

    if current.version != expected_version {
        return Err(ServiceError::Conflict(STALE_VERSION.to_string()));
    }

    let plan = prepare(&mut tx, &input, current.status, today).await?;

    let project = Project::update_versioned(&mut *tx, id, expected_version, &plan.fields)
        .await?
        .ok_or_else(|| ServiceError::Conflict(STALE_VERSION.to_string()))?;

    apply_people(&mut tx, id, plan.leader_id, &plan.member_ids).await?;

    activity::record(
        &mut tx,
        actor,
        actions::UPDATE_PROJECT,
        "PROJECT",
        id,
        format!("Updated project: {}", project.name),
    )
    .await?;

    tx.commit().await?;
    Ok(project)
}

/// Marks the project CANCELLED; the nightly refresh leaves it alone afterwards
pub async fn cancel_project(pool: &PgPool, actor: &Actor, id: i64) -> ServiceResult<Project> {
    let mut tx = pool.begin().await?;
    let current = lock_project(&mut tx, id).await?;

    if current.status == ProjectStatus::Cancelled {
        return Ok(current);
    }

    if !Project::set_status_versioned(&mut *tx, id, current.version, ProjectStatus::Cancelled).await? {
        return Err(ServiceError::Conflict(STALE_VERSION.to_string()));
    }

    activity::record(
        &mut tx,
        actor,
        actions::CANCEL_PROJECT,
        "PROJECT",
        id,
        format!("Cancelled project: {}", current.name),
    )
    .await?;

    let project = lock_project(&mut tx, id).await?;
    tx.commit().await?;
    Ok(project)
}

/// Soft-deletes the project, ending its leadership and every membership
pub async fn delete_project(pool: &PgPool, actor: &Actor, id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;
    let project = lock_project(&mut tx, id).await?;
    let now = Utc::now();

    let mut leaders = PgLeadershipLedger::project(&mut tx);
    ledger::end_all_leadership(&mut leaders, id, now).await?;

    let mut members = PgMembershipLedger::project(&mut tx);
    let removed = ledger::remove_all_members(&mut members, id, now).await?;

    mark_deleted::<Project, _>(&mut *tx, id).await?;

    activity::record(
        &mut tx,
        actor,
        actions::DELETE_PROJECT,
        "PROJECT",
        id,
        format!("Deleted project: {}", project.name),
    )
    .await?;

    tx.commit().await?;
    info!(project_id = id, removed_members = removed, "Project deleted");
    Ok(())
}

pub async fn get_project(pool: &PgPool, id: i64) -> ServiceResult<Project> {
    Project::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Project", id))
}

pub async fn project_detail(pool: &PgPool, id: i64) -> ServiceResult<ProjectDetail> {
    let project = get_project(pool, id).await?;
    let team = match project.team_id {
        Some(team_id) => Team::find_by_id(pool, team_id).await?,
        None => None,
    };
    let current_leader = ProjectLeadership::current(pool, id).await?;
    let members = ProjectMember::active_members(pool, id).await?;
    let leadership_history = ProjectLeadership::history(pool, id).await?;

    Ok(ProjectDetail {
        project,
        team,
        current_leader,
        member_count: members.len(),
        members,
        leadership_history,
    })
}

pub async fn list_projects(
    pool: &PgPool,
    page: &PageRequest,
    team_id: Option<i64>,
) -> ServiceResult<Page<Project>> {
    let content = Project::list_page(pool, page, team_id).await?;
    let total = Project::count(pool, team_id).await?;
    Ok(Page::new(content, page, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_start_date_required() {
        let err = check_dates(None, Some(date(2025, 1, 1))).unwrap_err();
        assert_eq!(err.public_message(), "Start date is required");
    }

    #[test]
    fn test_end_before_start_rejected() {
        assert!(check_dates(Some(date(2025, 3, 1)), Some(date(2025, 2, 28))).is_err());
        assert_eq!(
            check_dates(Some(date(2025, 3, 1)), Some(date(2025, 3, 1))).unwrap(),
            date(2025, 3, 1)
        );
        assert_eq!(check_dates(Some(date(2025, 3, 1)), None).unwrap(), date(2025, 3, 1));
    }

    #[test]
    fn test_input_defaults_members_to_empty() {
        let input: ProjectInput = serde_json::from_str(
            r#"{"name":"Apollo","startDate":"2025-01-01","teamId":2}"#,
        )
        .unwrap();
        assert!(input.member_ids.is_empty());
        assert_eq!(input.team_id, Some(2));
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_abbreviation_length_limit() {
        let input = ProjectInput {
            name: "Apollo".to_string(),
            abbreviation: Some("A".repeat(51)),
            start_date: Some(date(2025, 1, 1)),
            end_date: None,
            team_id: None,
            leader_id: None,
            member_ids: vec![],
        };
        assert!(input.validate().is_err());
    }
}
