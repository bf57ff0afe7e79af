//! Skill import (`Name,Description`)

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{Connection, PgConnection, PgPool};
use tracing::info;

use super::{column, import_csv, preview_csv, CsvError, CsvImportResult, CsvPreview, RowImporter};
use crate::models::skill::Skill;
use crate::services::activity::Actor;
use crate::services::catalog::insert_skill;
use crate::services::error::{FieldError, ServiceError};

pub const HEADERS: &[&str] = &["Name", "Description"];

const MAX_NAME_LENGTH: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRow {
    pub name: String,
    pub description: Option<String>,
}

/// Field rules that need no database
pub fn check_row(row: &SkillRow) -> Vec<FieldError> {
    if row.name.is_empty() {
        return vec![FieldError::new("name", "Name is required")];
    }
    if row.name.chars().count() > MAX_NAME_LENGTH {
        return vec![FieldError::new("name", "Name must be less than 255 characters")];
    }
    Vec::new()
}

pub struct SkillImporter<'c> {
    conn: &'c mut PgConnection,
    actor: Actor,
}

impl<'c> SkillImporter<'c> {
    pub fn new(conn: &'c mut PgConnection, actor: Actor) -> Self {
        Self { conn, actor }
    }
}

#[async_trait]
impl<'c> RowImporter for SkillImporter<'c> {
    type Row = SkillRow;

    fn expected_headers(&self) -> &'static [&'static str] {
        HEADERS
    }

    fn parse_row(&self, record: &::csv::StringRecord) -> Result<SkillRow, FieldError> {
        let description = column(record, 1);
        Ok(SkillRow {
            name: column(record, 0).to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
        })
    }

    async fn validate(&mut self, row: &SkillRow) -> Result<Vec<FieldError>, ServiceError> {
        let errors = check_row(row);
        if !errors.is_empty() {
            return Ok(errors);
        }

        if Skill::name_taken(&mut *self.conn, &row.name, None).await? {
            return Ok(vec![FieldError::new(
                "name",
                format!("Skill name already exists: {}", row.name),
            )]);
        }

        Ok(Vec::new())
    }

    async fn persist(&mut self, row: SkillRow) -> Result<(), ServiceError> {
        let mut savepoint = self.conn.begin().await?;
        insert_skill(&mut savepoint, &self.actor, &row.name, row.description.as_deref()).await?;
        savepoint.commit().await?;
        Ok(())
    }
}

/// Imports a skills file in one transaction
pub async fn import(pool: &PgPool, actor: Actor, bytes: &[u8]) -> Result<CsvImportResult, CsvError> {
    let mut tx = pool.begin().await?;
    let result = {
        let mut importer = SkillImporter::new(&mut tx, actor);
        import_csv(&mut importer, bytes).await?
    };
    tx.commit().await?;

    info!(
        imported = result.success_count,
        rejected = result.error_count,
        "Skill CSV import finished"
    );
    Ok(result)
}

/// Validates a skills file without writing anything
pub async fn preview(pool: &PgPool, bytes: &[u8]) -> Result<CsvPreview<SkillRow>, CsvError> {
    let mut conn = pool.acquire().await?;
    let mut importer = SkillImporter::new(&mut conn, Actor::system());
    preview_csv(&mut importer, bytes).await
}

/// Template offered for download
pub fn sample_csv() -> String {
    [
        "Name,Description",
        "Java,Object-oriented programming language",
        "Python,High-level programming language",
        "React,JavaScript library for building user interfaces",
        "Spring Boot,Java framework for building applications",
    ]
    .join("\n")
        + "\n"
}
