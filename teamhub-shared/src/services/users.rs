/// User accounts: registration, login, admin management and profiles

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};
use validator::Validate;

use super::activity::{self, actions, Actor};
use super::error::{FieldError, ServiceError, ServiceResult};
use super::require_text;
use crate::auth::password::{hash_password, validate_password_length, verify_password};
use crate::db::soft_delete::mark_deleted;
use crate::ledger::postgres::close_all_for_user;
use crate::models::position::Position;
use crate::models::project_member::{ProjectMember, UserProjectParticipation};
use crate::models::skill::Skill;
use crate::models::team_membership::{TeamMembership, UserTeamMembership};
use crate::models::user::{CreateUser, UpdateUser, User, UserRole, UserStatus};
use crate::models::user_position::{UserPosition, UserPositionHistory};
use crate::models::user_skill::{UserSkill, UserSkillDetail};

const EMAIL_IN_USE: &str = "Email is already in use";
const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Self-service sign-up
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Email should be valid"))]
    pub email: String,

    #[serde(default)]
    pub password: String,

    pub birthday: Option<NaiveDate>,
}

/// A skill held by a user, as submitted from the admin panel
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SkillAssignment {
    pub skill_id: i64,

    #[validate(range(min = 1, max = 5, message = "Skill level must be between 1 and 5"))]
    pub level: Option<i32>,

    #[validate(range(min = 0.0, max = 80.0, message = "Years of experience must be between 0 and 80"))]
    pub years_of_experience: Option<f64>,
}

/// Admin create/update of a user
///
/// `password` is required on create and optional on update. `skills`, when
/// present, replaces the user's current skill set.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Email should be valid"))]
    pub email: String,

    pub password: Option<String>,

    pub birthday: Option<NaiveDate>,

    pub role: Option<UserRole>,

    pub status: Option<UserStatus>,

    pub position_id: Option<i64>,

    #[validate(nested)]
    pub skills: Option<Vec<SkillAssignment>>,
}

/// Everything shown on a profile page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub active_team: Option<UserTeamMembership>,
    pub current_position: Option<UserPositionHistory>,
    pub active_projects: Vec<UserProjectParticipation>,
    pub skills: Vec<UserSkillDetail>,
    pub team_history: Vec<UserTeamMembership>,
    pub project_history: Vec<UserProjectParticipation>,
    pub position_history: Vec<UserPositionHistory>,
}

fn check_birthday(birthday: Option<NaiveDate>, today: NaiveDate) -> ServiceResult<()> {
    match birthday {
        Some(date) if date >= today => Err(ServiceError::invalid("birthday", "Birthday must be in the past")),
        _ => Ok(()),
    }
}

fn check_password(password: &str) -> ServiceResult<()> {
    validate_password_length(password).map_err(|message| ServiceError::invalid("password", message))
}

/// Creates a MEMBER account; a taken email is a duplicate
pub async fn register(pool: &PgPool, input: RegisterInput) -> ServiceResult<User> {
    input.validate()?;
    check_password(&input.password)?;
    check_birthday(input.birthday, Utc::now().date_naive())?;
    let name = require_text("name", &input.name, "Name is required")?;
    let email = input.email.trim();

    let mut tx = pool.begin().await?;

    if User::email_taken(&mut *tx, email, None).await? {
        return Err(ServiceError::Duplicate(EMAIL_IN_USE.to_string()));
    }

    let user = User::create(
        &mut *tx,
        CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(&input.password)?,
            birthday: input.birthday,
            role: UserRole::Member,
            status: UserStatus::Active,
        },
    )
    .await
    .map_err(|e| ServiceError::from_unique_violation(e, EMAIL_IN_USE))?;

    activity::record(
        &mut tx,
        &Actor::user(user.id),
        actions::REGISTER_USER,
        "USER",
        user.id,
        format!("User registered: {}", user.email),
    )
    .await?;

    tx.commit().await?;
    info!(user_id = user.id, "User registered");
    Ok(user)
}

/// Email + password check
///
/// Unknown email and wrong password produce the same error.
pub async fn authenticate(pool: &PgPool, email: &str, password: &str) -> ServiceResult<User> {
    let user = User::find_by_email(pool, email)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = user.id, "Failed login attempt");
        return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    if user.status != UserStatus::Active {
        return Err(ServiceError::Unauthorized("Account is inactive".to_string()));
    }

    Ok(user)
}

pub async fn get_user(pool: &PgPool, id: i64) -> ServiceResult<User> {
    User::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User", id))
}

pub async fn get_user_by_email(pool: &PgPool, email: &str) -> ServiceResult<User> {
    User::find_by_email(pool, email)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("User not found with email: {}", email)))
}

pub async fn list_users(
    pool: &PgPool,
    status: Option<UserStatus>,
    role: Option<UserRole>,
) -> ServiceResult<Vec<User>> {
    Ok(User::list(pool, status, role).await?)
}

/// Admin create
pub async fn create_user(pool: &PgPool, actor: &Actor, input: UserInput) -> ServiceResult<User> {
    input.validate()?;
    let password = input
        .password
        .as_deref()
        .ok_or_else(|| ServiceError::invalid("password", "Password is required"))?;
    check_password(password)?;
    check_birthday(input.birthday, Utc::now().date_naive())?;
    let name = require_text("name", &input.name, "Name is required")?;
    let email = input.email.trim();

    let mut tx = pool.begin().await?;

    if User::email_taken(&mut *tx, email, None).await? {
        return Err(ServiceError::Duplicate(EMAIL_IN_USE.to_string()));
    }

    let user = User::create(
        &mut *tx,
        CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            birthday: input.birthday,
            role: input.role.unwrap_or(UserRole::Member),
            status: input.status.unwrap_or(UserStatus::Active),
        },
    )
    .await
    .map_err(|e| ServiceError::from_unique_violation(e, EMAIL_IN_USE))?;

    apply_position_and_skills(&mut tx, user.id, input.position_id, input.skills.as_deref()).await?;

    activity::record(
        &mut tx,
        actor,
        actions::CREATE_USER,
        "USER",
        user.id,
        format!("Created user: {}", user.email),
    )
    .await?;

    tx.commit().await?;
    info!(user_id = user.id, "User created");
    Ok(user)
}

/// Admin update; a blank or missing password keeps the current one
pub async fn update_user(
    pool: &PgPool,
    actor: &Actor,
    id: i64,
    input: UserInput,
) -> ServiceResult<User> {
    input.validate()?;
    check_birthday(input.birthday, Utc::now().date_naive())?;
    let name = require_text("name", &input.name, "Name is required")?;
    let email = input.email.trim();

    let password_hash = match input.password.as_deref().map(str::trim) {
        Some(password) if !password.is_empty() => {
            check_password(password)?;
            Some(hash_password(password)?)
        }
        _ => None,
    };

    let mut tx = pool.begin().await?;

    if User::find_by_id(&mut *tx, id).await?.is_none() {
        return Err(ServiceError::not_found("User", id));
    }

    if User::email_taken(&mut *tx, email, Some(id)).await? {
        return Err(ServiceError::Duplicate(EMAIL_IN_USE.to_string()));
    }

    let user = User::update(
        &mut *tx,
        id,
        UpdateUser {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password_hash,
            birthday: Some(input.birthday),
            role: input.role,
            status: input.status,
        },
    )
    .await
    .map_err(|e| ServiceError::from_unique_violation(e, EMAIL_IN_USE))?
    .ok_or_else(|| ServiceError::not_found("User", id))?;

    apply_position_and_skills(&mut tx, id, input.position_id, input.skills.as_deref()).await?;

    activity::record(
        &mut tx,
        actor,
        actions::UPDATE_USER,
        "USER",
        id,
        format!("Updated user: {}", user.email),
    )
    .await?;

    tx.commit().await?;
    Ok(user)
}

/// Soft-deletes a user and closes every membership and leadership they hold
pub async fn delete_user(pool: &PgPool, actor: &Actor, id: i64) -> ServiceResult<()> {
    if actor.user_id == Some(id) {
        return Err(ServiceError::Forbidden("You cannot delete your own account".to_string()));
    }

    let mut tx = pool.begin().await?;

    if !mark_deleted::<User, _>(&mut *tx, id).await? {
        return Err(ServiceError::not_found("User", id));
    }

    let closed = close_all_for_user(&mut tx, id, Utc::now()).await?;
    UserSkill::end_all_for_user(&mut *tx, id).await?;
    if let Some(position) = UserPosition::current(&mut *tx, id).await? {
        UserPosition::end(&mut *tx, position.id).await?;
    }

    activity::record(&mut tx, actor, actions::DELETE_USER, "USER", id, "Deleted user").await?;

    tx.commit().await?;
    info!(user_id = id, closed_rows = closed, "User deleted");
    Ok(())
}

/// Moves the user to a new position (if it changed) and replaces skills (if given)
async fn apply_position_and_skills(
    conn: &mut PgConnection,
    user_id: i64,
    position_id: Option<i64>,
    skills: Option<&[SkillAssignment]>,
) -> ServiceResult<()> {
    if let Some(position_id) = position_id {
        if Position::find_by_id(&mut *conn, position_id).await?.is_none() {
            return Err(ServiceError::invalid(
                "positionId",
                format!("Position not found with id: {}", position_id),
            ));
        }

        let current = UserPosition::current(&mut *conn, user_id).await?;
        if current.as_ref().map(|p| p.position_id) != Some(position_id) {
            if let Some(current) = current {
                UserPosition::end(&mut *conn, current.id).await?;
            }
            UserPosition::insert(&mut *conn, user_id, position_id).await?;
        }
    }

    if let Some(skills) = skills {
        let mut missing = Vec::new();
        for assignment in skills {
            if Skill::find_by_id(&mut *conn, assignment.skill_id).await?.is_none() {
                missing.push(FieldError::new(
                    "skills",
                    format!("Skill not found with id: {}", assignment.skill_id),
                ));
            }
        }
        if !missing.is_empty() {
            return Err(ServiceError::Validation(missing));
        }

        UserSkill::end_all_for_user(&mut *conn, user_id).await?;
        for assignment in skills {
            UserSkill::insert(
                &mut *conn,
                user_id,
                assignment.skill_id,
                assignment.level,
                assignment.years_of_experience,
            )
            .await?;
        }
    }

    Ok(())
}

/// Full profile of a live user
pub async fn profile(pool: &PgPool, id: i64) -> ServiceResult<UserProfile> {
    let user = get_user(pool, id).await?;

    let team_history = TeamMembership::history_for_user(pool, id).await?;
    let project_history = ProjectMember::history_for_user(pool, id).await?;
    let position_history = UserPosition::history(pool, id).await?;
    let skills = UserSkill::current_for_user(pool, id).await?;

    let active_team = team_history.iter().find(|m| m.is_active).cloned();
    let current_position = position_history.iter().find(|p| p.is_current).cloned();
    let active_projects = project_history
        .iter()
        .filter(|p| p.is_active && p.project_status.is_open())
        .cloned()
        .collect();

    Ok(UserProfile {
        user,
        active_team,
        current_position,
        active_projects,
        skills,
        team_history,
        project_history,
        position_history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_input() -> RegisterInput {
        RegisterInput {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            password: "secret1".to_string(),
            birthday: NaiveDate::from_ymd_opt(1990, 1, 1),
        }
    }

    #[test]
    fn test_register_input_valid() {
        assert!(register_input().validate().is_ok());
    }

    #[test]
    fn test_register_input_rejects_bad_email_and_short_name() {
        let input = RegisterInput {
            name: "J".to_string(),
            email: "not-an-email".to_string(),
            ..register_input()
        };
        match ServiceError::from(input.validate().unwrap_err()) {
            ServiceError::Validation(errors) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["email", "name"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_birthday_must_be_past() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(check_birthday(None, today).is_ok());
        assert!(check_birthday(NaiveDate::from_ymd_opt(2000, 1, 1), today).is_ok());
        assert!(check_birthday(Some(today), today).is_err());
    }

    #[test]
    fn test_password_minimum() {
        assert!(check_password("12345").is_err());
        assert!(check_password("123456").is_ok());
    }

    #[test]
    fn test_skill_assignment_ranges() {
        let bad = SkillAssignment {
            skill_id: 1,
            level: Some(9),
            years_of_experience: Some(-1.0),
        };
        assert!(bad.validate().is_err());

        let good = SkillAssignment {
            skill_id: 1,
            level: Some(3),
            years_of_experience: Some(2.5),
        };
        assert!(good.validate().is_ok());
    }
}
