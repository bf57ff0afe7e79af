//! Team import (`Name,Description,Leader Email`)
//!
//! Rows are persisted through the team service, so an imported leader gets
//! a leadership row and a membership like one set from the admin panel.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{Connection, PgConnection, PgPool};
use tracing::info;

use super::{column, import_csv, preview_csv, CsvError, CsvImportResult, CsvPreview, RowImporter};
use crate::models::team::Team;
use crate::models::user::User;
use crate::services::activity::Actor;
use crate::services::error::{FieldError, ServiceError};
use crate::services::teams::insert_team;

pub const HEADERS: &[&str] = &["Name", "Description", "Leader Email"];

const MAX_NAME_LENGTH: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRow {
    pub name: String,
    pub description: Option<String>,
    pub leader_email: Option<String>,
}

pub fn check_row(row: &TeamRow) -> Vec<FieldError> {
    if row.name.is_empty() {
        return vec![FieldError::new("name", "Name is required")];
    }
    if row.name.chars().count() > MAX_NAME_LENGTH {
        return vec![FieldError::new("name", "Name must be less than 255 characters")];
    }
    Vec::new()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

pub struct TeamImporter<'c> {
    conn: &'c mut PgConnection,
    actor: Actor,
}

impl<'c> TeamImporter<'c> {
    pub fn new(conn: &'c mut PgConnection, actor: Actor) -> Self {
        Self { conn, actor }
    }
}

#[async_trait]
impl<'c> RowImporter for TeamImporter<'c> {
    type Row = TeamRow;

    fn expected_headers(&self) -> &'static [&'static str] {
        HEADERS
    }

    fn parse_row(&self, record: &::csv::StringRecord) -> Result<TeamRow, FieldError> {
        Ok(TeamRow {
            name: column(record, 0).to_string(),
            description: non_empty(column(record, 1)),
            leader_email: non_empty(column(record, 2)),
        })
    }

    async fn validate(&mut self, row: &TeamRow) -> Result<Vec<FieldError>, ServiceError> {
        let mut errors = check_row(row);
        if !errors.is_empty() {
            return Ok(errors);
        }

        if Team::name_taken(&mut *self.conn, &row.name, None).await? {
            errors.push(FieldError::new(
                "name",
                format!("Team name already exists: {}", row.name),
            ));
        }

        if let Some(email) = &row.leader_email {
            if User::find_by_email(&mut *self.conn, email).await?.is_none() {
                errors.push(FieldError::new(
                    "leaderEmail",
                    format!("Leader email not found: {}", email),
                ));
            }
        }

        Ok(errors)
    }

    async fn persist(&mut self, row: TeamRow) -> Result<(), ServiceError> {
        let mut savepoint = self.conn.begin().await?;

        let leader_id = match &row.leader_email {
            Some(email) => Some(
                User::find_by_email(&mut *savepoint, email)
                    .await?
                    .ok_or_else(|| ServiceError::invalid("leaderEmail", format!("Leader email not found: {}", email)))?
                    .id,
            ),
            None => None,
        };

        insert_team(
            &mut savepoint,
            &self.actor,
            &row.name,
            row.description.as_deref(),
            leader_id,
        )
        .await?;

        savepoint.commit().await?;
        Ok(())
    }
}

/// Imports a teams file in one transaction
pub async fn import(pool: &PgPool, actor: Actor, bytes: &[u8]) -> Result<CsvImportResult, CsvError> {
    let mut tx = pool.begin().await?;
    let result = {
        let mut importer = TeamImporter::new(&mut tx, actor);
        import_csv(&mut importer, bytes).await?
    };
    tx.commit().await?;

    info!(
        imported = result.success_count,
        rejected = result.error_count,
        "Team CSV import finished"
    );
    Ok(result)
}

pub async fn preview(pool: &PgPool, bytes: &[u8]) -> Result<CsvPreview<TeamRow>, CsvError> {
    let mut conn = pool.acquire().await?;
    let mut importer = TeamImporter::new(&mut conn, Actor::system());
    preview_csv(&mut importer, bytes).await
}

pub fn sample_csv() -> String {
    [
        "Name,Description,Leader Email",
        "\"Frontend Team\",\"Responsible for UI/UX development\",\"john@example.com\"",
        "\"Backend Team\",\"Responsible for API and server-side logic\",\"jane@example.com\"",
        "\"DevOps Team\",\"Responsible for infrastructure and deployment\",\"\"",
        "\"Mobile Team\",\"Responsible for mobile applications\",\"mike@example.com\"",
    ]
    .join("\n")
        + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quoted_sample() {
        let sample = sample_csv();
        let mut reader = ::csv::ReaderBuilder::new()
            .trim(::csv::Trim::All)
            .from_reader(sample.as_bytes());

        let rows: Vec<TeamRow> = reader
            .records()
            .map(|r| {
                let rec = r.unwrap();
                TeamRow {
                    name: column(&rec, 0).to_string(),
                    description: non_empty(column(&rec, 1)),
                    leader_email: non_empty(column(&rec, 2)),
                }
            })
            .collect();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].name, "Frontend Team");
        assert_eq!(rows[0].leader_email.as_deref(), Some("john@example.com"));
        assert_eq!(rows[2].leader_email, None);
        assert!(rows.iter().all(|r| check_row(r).is_empty()));
    }

    #[test]
    fn test_blank_name_rejected() {
        let row = TeamRow {
            name: String::new(),
            description: None,
            leader_email: Some("a@b.c".to_string()),
        };
        let errors = check_row(&row);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Name is required");
    }

    #[test]
    fn test_headers() {
        assert_eq!(HEADERS.join(","), "Name,Description,Leader Email");
    }
}
