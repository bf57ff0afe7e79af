//! Team export
//!
//! Output starts with a UTF-8 BOM so spreadsheet tools pick the right
//! encoding. Timestamps are UTC, `yyyy-MM-dd HH:mm:ss`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{CsvError, UTF8_BOM};
use crate::models::team::{Team, TeamExportRow};

pub const TEAM_HEADERS: &[&str] = &[
    "ID",
    "Name",
    "Description",
    "Current Leader",
    "Leader Email",
    "Active Members",
    "Total Members",
    "Active Projects",
    "Total Projects",
    "Created At",
    "Updated At",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn timestamp(value: DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Serializes rows into CSV bytes
pub fn write_teams(rows: &[TeamExportRow]) -> Result<Vec<u8>, CsvError> {
    let mut writer = ::csv::Writer::from_writer(UTF8_BOM.to_vec());
    writer.write_record(TEAM_HEADERS)?;

    for row in rows {
        writer.write_record([
            row.id.to_string(),
            row.name.clone(),
            row.description.clone().unwrap_or_default(),
            row.leader_name.clone().unwrap_or_default(),
            row.leader_email.clone().unwrap_or_default(),
            row.active_members.to_string(),
            row.total_members.to_string(),
            row.active_projects.to_string(),
            row.total_projects.to_string(),
            timestamp(row.created_at),
            timestamp(row.updated_at),
        ])?;
    }

    writer.into_inner().map_err(|e| CsvError::Io(e.into_error()))
}

/// Every live team, ordered by id
pub async fn export_teams(pool: &PgPool) -> Result<Vec<u8>, CsvError> {
    let rows = Team::export_rows(pool).await?;
    write_teams(&rows)
}

/// `teams_20250615_083000.csv`
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("teams_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row() -> TeamExportRow {
        let at = Utc.with_ymd_and_hms(2025, 6, 15, 8, 30, 5).unwrap();
        TeamExportRow {
            id: 4,
            name: "Backend, Core".to_string(),
            description: None,
            leader_name: Some("Jane Doe".to_string()),
            leader_email: Some("jane@example.com".to_string()),
            active_members: 3,
            total_members: 4,
            active_projects: 1,
            total_projects: 2,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_bom_and_exact_header() {
        let bytes = write_teams(&[]).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "ID,Name,Description,Current Leader,Leader Email,Active Members,Total Members,Active Projects,Total Projects,Created At,Updated At"
        );
    }

    #[test]
    fn test_row_formatting() {
        let bytes = write_teams(&[row()]).unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let line = text.lines().nth(1).unwrap();

        assert_eq!(
            line,
            "4,\"Backend, Core\",,Jane Doe,jane@example.com,3,4,1,2,2025-06-15 08:30:05,2025-06-15 08:30:05"
        );
    }

    #[test]
    fn test_filename() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(export_filename(now), "teams_20250102_030405.csv");
    }
}
