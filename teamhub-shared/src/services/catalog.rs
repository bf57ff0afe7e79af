/// Skills and positions
///
/// Flat catalogs with case-insensitive unique names. Positions also keep
/// their abbreviation unique. An update may keep the row's own name.

use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use validator::Validate;

use super::activity::{self, actions, Actor};
use super::error::{ServiceError, ServiceResult};
use super::pagination::{Page, PageRequest};
use super::{normalize_optional, require_text};
use crate::db::soft_delete::{count_live, mark_deleted};
use crate::models::position::Position;
use crate::models::skill::Skill;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SkillInput {
    #[serde(default)]
    #[validate(length(max = 255, message = "Name must be less than 255 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be less than 1000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PositionInput {
    #[serde(default)]
    #[validate(length(max = 100, message = "Name must not exceed 100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 50, message = "Abbreviation must not exceed 50 characters"))]
    pub abbreviation: String,
}

pub async fn list_skills(pool: &PgPool, page: &PageRequest) -> ServiceResult<Page<Skill>> {
    let content = Skill::list_page(pool, page).await?;
    let total = count_live::<Skill, _>(pool).await?;
    Ok(Page::new(content, page, total))
}

pub async fn all_skills(pool: &PgPool) -> ServiceResult<Vec<Skill>> {
    Ok(Skill::list_all(pool).await?)
}

pub async fn get_skill(pool: &PgPool, id: i64) -> ServiceResult<Skill> {
    Skill::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Skill", id))
}

/// Inserts a skill on an open connection; the CSV import calls this per row
pub(crate) async fn insert_skill(
    conn: &mut PgConnection,
    actor: &Actor,
    name: &str,
    description: Option<&str>,
) -> ServiceResult<Skill> {
    if Skill::name_taken(&mut *conn, name, None).await? {
        return Err(ServiceError::Duplicate(format!(
            "Skill with name '{}' already exists",
            name
        )));
    }

    let skill = Skill::create(&mut *conn, name, description)
        .await
        .map_err(|e| ServiceError::from_unique_violation(e, format!("Skill with name '{}' already exists", name)))?;

    activity::record(
        conn,
        actor,
        actions::CREATE_SKILL,
        "SKILL",
        skill.id,
        format!("Created skill: {}", skill.name),
    )
    .await?;

    Ok(skill)
}

pub async fn create_skill(pool: &PgPool, actor: &Actor, input: SkillInput) -> ServiceResult<Skill> {
    input.validate()?;
    let name = require_text("name", &input.name, "Name is required")?;
    let description = normalize_optional(input.description.as_deref());

    let mut tx = pool.begin().await?;
    let skill = insert_skill(&mut tx, actor, name, description).await?;
    tx.commit().await?;

    info!(skill_id = skill.id, "Skill created");
    Ok(skill)
}

pub async fn update_skill(
    pool: &PgPool,
    actor: &Actor,
    id: i64,
    input: SkillInput,
) -> ServiceResult<Skill> {
    input.validate()?;
    let name = require_text("name", &input.name, "Name is required")?;
    let description = normalize_optional(input.description.as_deref());

    let mut tx = pool.begin().await?;

    if Skill::find_by_id(&mut *tx, id).await?.is_none() {
        return Err(ServiceError::not_found("Skill", id));
    }

    if Skill::name_taken(&mut *tx, name, Some(id)).await? {
        return Err(ServiceError::Duplicate(format!(
            "Skill with name '{}' already exists",
            name
        )));
    }

    let skill = Skill::update(&mut *tx, id, name, description)
        .await?
        .ok_or_else(|| ServiceError::not_found("Skill", id))?;

    activity::record(
        &mut tx,
        actor,
        actions::UPDATE_SKILL,
        "SKILL",
        id,
        format!("Updated skill: {}", skill.name),
    )
    .await?;

    tx.commit().await?;
    Ok(skill)
}

pub async fn delete_skill(pool: &PgPool, actor: &Actor, id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;

    if !mark_deleted::<Skill, _>(&mut *tx, id).await? {
        return Err(ServiceError::not_found("Skill", id));
    }

    activity::record(&mut tx, actor, actions::DELETE_SKILL, "SKILL", id, "Deleted skill").await?;

    tx.commit().await?;
    info!(skill_id = id, "Skill deleted");
    Ok(())
}

pub async fn list_positions(pool: &PgPool, page: &PageRequest) -> ServiceResult<Page<Position>> {
    let content = Position::list_page(pool, page).await?;
    let total = count_live::<Position, _>(pool).await?;
    Ok(Page::new(content, page, total))
}

pub async fn get_position(pool: &PgPool, id: i64) -> ServiceResult<Position> {
    Position::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Position", id))
}

async fn check_position_unique(
    conn: &mut PgConnection,
    name: &str,
    abbreviation: &str,
    exclude_id: Option<i64>,
) -> ServiceResult<()> {
    if Position::name_taken(&mut *conn, name, exclude_id).await? {
        return Err(ServiceError::Duplicate(format!(
            "Position with name '{}' already exists",
            name
        )));
    }

    if Position::abbreviation_taken(&mut *conn, abbreviation, exclude_id).await? {
        return Err(ServiceError::Duplicate(format!(
            "Position with abbreviation '{}' already exists",
            abbreviation
        )));
    }

    Ok(())
}

pub async fn create_position(
    pool: &PgPool,
    actor: &Actor,
    input: PositionInput,
) -> ServiceResult<Position> {
    input.validate()?;
    let name = require_text("name", &input.name, "Name is required")?;
    let abbreviation = require_text("abbreviation", &input.abbreviation, "Abbreviation is required")?;

    let mut tx = pool.begin().await?;
    check_position_unique(&mut tx, name, abbreviation, None).await?;

    let position = Position::create(&mut *tx, name, abbreviation)
        .await
        .map_err(|e| ServiceError::from_unique_violation(e, "Position already exists"))?;

    activity::record(
        &mut tx,
        actor,
        actions::CREATE_POSITION,
        "POSITION",
        position.id,
        format!("Created position: {} ({})", position.name, position.abbreviation),
    )
    .await?;

    tx.commit().await?;
    info!(position_id = position.id, "Position created");
    Ok(position)
}

pub async fn update_position(
    pool: &PgPool,
    actor: &Actor,
    id: i64,
    input: PositionInput,
) -> ServiceResult<Position> {
    input.validate()?;
    let name = require_text("name", &input.name, "Name is required")?;
    let abbreviation = require_text("abbreviation", &input.abbreviation, "Abbreviation is required")?;

    let mut tx = pool.begin().await?;

    if Position::find_by_id(&mut *tx, id).await?.is_none() {
        return Err(ServiceError::not_found("Position", id));
    }
    check_position_unique(&mut tx, name, abbreviation, Some(id)).await?;

    let position = Position::update(&mut *tx, id, name, abbreviation)
        .await?
        .ok_or_else(|| ServiceError::not_found("Position", id))?;

    activity::record(
        &mut tx,
        actor,
        actions::UPDATE_POSITION,
        "POSITION",
        id,
        format!("Updated position: {}", position.name),
    )
    .await?;

    tx.commit().await?;
    Ok(position)
}

pub async fn delete_position(pool: &PgPool, actor: &Actor, id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;

    if !mark_deleted::<Position, _>(&mut *tx, id).await? {
        return Err(ServiceError::not_found("Position", id));
    }

    activity::record(&mut tx, actor, actions::DELETE_POSITION, "POSITION", id, "Deleted position").await?;

    tx.commit().await?;
    info!(position_id = id, "Position deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_name_length() {
        let input = SkillInput {
            name: "x".repeat(256),
            description: None,
        };
        let err: ServiceError = input.validate().unwrap_err().into();
        assert_eq!(err.public_message(), "Name must be less than 255 characters");
    }

    #[test]
    fn test_position_limits() {
        let ok = PositionInput {
            name: "Software Engineer".to_string(),
            abbreviation: "SE".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = PositionInput {
            name: "n".repeat(101),
            abbreviation: "a".repeat(51),
        };
        match ServiceError::from(bad.validate().unwrap_err()) {
            ServiceError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
