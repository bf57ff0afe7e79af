//! CSV bulk import and export
//!
//! An import reads the whole file, checks the header row, then handles each
//! record on its own: a record that fails to parse or validate becomes a
//! [`RowError`] and the import moves on. Row numbers are file line numbers,
//! so the header is line 1 and the first record line 2.
//!
//! The per-entity rules live behind [`RowImporter`]. The Postgres importers
//! in [`skills`] and [`teams`] borrow the caller's transaction and wrap each
//! insert in a savepoint, so a row rejected by a unique index does not
//! poison the rows around it. Validation runs against the same transaction,
//! which means a name repeated later in the same file is reported as
//! already existing.

pub mod export;
pub mod skills;
pub mod teams;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::services::error::{FieldError, ServiceError};

/// Byte order mark written in front of exports and stripped from imports
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One rejected record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl RowError {
    fn from_field(row: usize, error: FieldError) -> Self {
        Self {
            row,
            field: Some(error.field),
            message: error.message,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvImportResult {
    /// Data records seen (blank lines excluded)
    pub total_rows: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<RowError>,
}

/// Validation-only pass over a file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvPreview<T> {
    pub total_rows: usize,
    pub valid_rows: Vec<T>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    #[error("CSV file is empty")]
    Empty,

    #[error("Invalid CSV header: expected {expected}, found {found}")]
    InvalidHeader { expected: String, found: String },

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A failure that aborts the whole import (database down, …)
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl From<sqlx::Error> for CsvError {
    fn from(err: sqlx::Error) -> Self {
        CsvError::Service(ServiceError::Database(err))
    }
}

/// Entity-specific side of an import
#[async_trait]
pub trait RowImporter: Send {
    type Row: Send + Sync;

    /// Header names in column order, compared case-insensitively
    fn expected_headers(&self) -> &'static [&'static str];

    /// Turns a record into a row; only shape problems belong here
    fn parse_row(&self, record: &::csv::StringRecord) -> Result<Self::Row, FieldError>;

    /// Field rules and uniqueness; an empty list means the row is valid
    async fn validate(&mut self, row: &Self::Row) -> Result<Vec<FieldError>, ServiceError>;

    async fn persist(&mut self, row: Self::Row) -> Result<(), ServiceError>;
}

/// A parsed record together with its line number
struct NumberedRecord {
    row: usize,
    record: Result<::csv::StringRecord, String>,
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Checks the header row and returns every non-blank record
fn read_records(bytes: &[u8], expected: &[&str]) -> Result<Vec<NumberedRecord>, CsvError> {
    let bytes = strip_bom(bytes);
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(CsvError::Empty);
    }

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(::csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let matches = headers.len() >= expected.len()
        && expected
            .iter()
            .zip(headers.iter())
            .all(|(want, got)| want.eq_ignore_ascii_case(got));

    if !matches {
        return Err(CsvError::InvalidHeader {
            expected: expected.join(","),
            found: headers.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let fallback = index + 2;
        match result {
            Ok(record) => {
                if record.iter().all(|field| field.is_empty()) {
                    continue;
                }
                let row = record
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback);
                records.push(NumberedRecord {
                    row,
                    record: Ok(record),
                });
            }
            Err(e) => {
                let row = e.position().map(|p| p.line() as usize).unwrap_or(fallback);
                records.push(NumberedRecord {
                    row,
                    record: Err(e.to_string()),
                });
            }
        }
    }

    Ok(records)
}

/// Whether a persist failure only concerns the row itself
fn is_row_level(err: &ServiceError) -> bool {
    matches!(
        err,
        ServiceError::Duplicate(_) | ServiceError::Validation(_) | ServiceError::NotFound(_)
    )
}

/// Validates and persists every record of `bytes`
///
/// Commit and rollback are left to the caller that owns the transaction the
/// importer writes to.
pub async fn import_csv<I: RowImporter>(importer: &mut I, bytes: &[u8]) -> Result<CsvImportResult, CsvError> {
    let records = read_records(bytes, importer.expected_headers())?;
    let mut result = CsvImportResult {
        total_rows: records.len(),
        ..Default::default()
    };

    for NumberedRecord { row, record } in records {
        let record = match record {
            Ok(record) => record,
            Err(message) => {
                result.errors.push(RowError {
                    row,
                    field: None,
                    message,
                });
                continue;
            }
        };

        let parsed = match importer.parse_row(&record) {
            Ok(parsed) => parsed,
            Err(e) => {
                result.errors.push(RowError::from_field(row, e));
                continue;
            }
        };

        let problems = importer.validate(&parsed).await?;
        if !problems.is_empty() {
            debug!(row, count = problems.len(), "CSV row rejected");
            result
                .errors
                .extend(problems.into_iter().map(|e| RowError::from_field(row, e)));
            continue;
        }

        match importer.persist(parsed).await {
            Ok(()) => result.success_count += 1,
            Err(ServiceError::Validation(errors)) => {
                result
                    .errors
                    .extend(errors.into_iter().map(|e| RowError::from_field(row, e)));
            }
            Err(e) if is_row_level(&e) => {
                result.errors.push(RowError {
                    row,
                    field: None,
                    message: e.public_message(),
                });
            }
            Err(e) => {
                warn!(row, error = %e, "CSV import aborted");
                return Err(e.into());
            }
        }
    }

    result.error_count = result.errors.len();
    Ok(result)
}

/// Runs parsing and validation only
pub async fn preview_csv<I: RowImporter>(
    importer: &mut I,
    bytes: &[u8],
) -> Result<CsvPreview<I::Row>, CsvError> {
    let records = read_records(bytes, importer.expected_headers())?;
    let mut preview = CsvPreview {
        total_rows: records.len(),
        valid_rows: Vec::new(),
        errors: Vec::new(),
    };

    for NumberedRecord { row, record } in records {
        let record = match record {
            Ok(record) => record,
            Err(message) => {
                preview.errors.push(RowError {
                    row,
                    field: None,
                    message,
                });
                continue;
            }
        };

        let parsed = match importer.parse_row(&record) {
            Ok(parsed) => parsed,
            Err(e) => {
                preview.errors.push(RowError::from_field(row, e));
                continue;
            }
        };

        let problems = importer.validate(&parsed).await?;
        if problems.is_empty() {
            preview.valid_rows.push(parsed);
        } else {
            preview
                .errors
                .extend(problems.into_iter().map(|e| RowError::from_field(row, e)));
        }
    }

    Ok(preview)
}

/// Trimmed column value, `""` when the record is short
pub(crate) fn column<'r>(record: &'r ::csv::StringRecord, index: usize) -> &'r str {
    record.get(index).map(str::trim).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Keeps names in memory; rejects blanks and names already stored
    #[derive(Default)]
    struct NameImporter {
        stored: Vec<String>,
        fail_on: Option<String>,
        duplicate_on_persist: HashSet<String>,
    }

    #[async_trait]
    impl RowImporter for NameImporter {
        type Row = String;

        fn expected_headers(&self) -> &'static [&'static str] {
            &["Name", "Description"]
        }

        fn parse_row(&self, record: &::csv::StringRecord) -> Result<String, FieldError> {
            Ok(column(record, 0).to_string())
        }

        async fn validate(&mut self, row: &String) -> Result<Vec<FieldError>, ServiceError> {
            if row.is_empty() {
                return Ok(vec![FieldError::new("name", "Name is required")]);
            }
            if self.stored.iter().any(|s| s.eq_ignore_ascii_case(row)) {
                return Ok(vec![FieldError::new("name", format!("Skill name already exists: {}", row))]);
            }
            Ok(vec![])
        }

        async fn persist(&mut self, row: String) -> Result<(), ServiceError> {
            if self.fail_on.as_deref() == Some(row.as_str()) {
                return Err(ServiceError::Database(sqlx::Error::PoolTimedOut));
            }
            if self.duplicate_on_persist.contains(&row) {
                return Err(ServiceError::Duplicate(format!("Skill with name '{}' already exists", row)));
            }
            self.stored.push(row);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_blank_name_is_row_error_and_later_rows_persist() {
        let mut importer = NameImporter::default();
        let csv = "Name,Description\nJava,Language\n,Missing name\nPython,Language\n";

        let result = import_csv(&mut importer, csv.as_bytes()).await.unwrap();

        assert_eq!(result.total_rows, 3);
        assert_eq!(result.success_count, 2);
        assert_eq!(result.error_count, 1);
        assert_eq!(result.errors[0].row, 3);
        assert_eq!(result.errors[0].message, "Name is required");
        assert_eq!(importer.stored, vec!["Java", "Python"]);
    }

    #[tokio::test]
    async fn test_bom_and_header_case_are_tolerated() {
        let mut importer = NameImporter::default();
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"name,DESCRIPTION\r\nReact,UI\r\n");

        let result = import_csv(&mut importer, &bytes).await.unwrap();
        assert_eq!(result.success_count, 1);
        assert_eq!(importer.stored, vec!["React"]);
    }

    #[tokio::test]
    async fn test_wrong_header_rejects_file() {
        let mut importer = NameImporter::default();
        let err = import_csv(&mut importer, b"Title,Body\nJava,x\n").await.unwrap_err();
        assert!(matches!(err, CsvError::InvalidHeader { .. }));
        assert!(importer.stored.is_empty());
    }

    #[tokio::test]
    async fn test_empty_file() {
        let mut importer = NameImporter::default();
        let err = import_csv(&mut importer, b"  \n").await.unwrap_err();
        assert!(matches!(err, CsvError::Empty));
    }

    #[tokio::test]
    async fn test_repeated_name_in_same_file_is_reported() {
        let mut importer = NameImporter::default();
        let csv = "Name,Description\nJava,a\njava,b\n";

        let result = import_csv(&mut importer, csv.as_bytes()).await.unwrap();
        assert_eq!(result.success_count, 1);
        assert_eq!(result.errors[0].row, 3);
        assert_eq!(result.errors[0].message, "Skill name already exists: java");
    }

    #[tokio::test]
    async fn test_duplicate_on_persist_is_row_error() {
        let mut importer = NameImporter {
            duplicate_on_persist: HashSet::from(["Go".to_string()]),
            ..Default::default()
        };
        let csv = "Name,Description\nGo,a\nRust,b\n";

        let result = import_csv(&mut importer, csv.as_bytes()).await.unwrap();
        assert_eq!(result.success_count, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].field, None);
        assert_eq!(result.errors[0].message, "Skill with name 'Go' already exists");
    }

    #[tokio::test]
    async fn test_database_failure_aborts() {
        let mut importer = NameImporter {
            fail_on: Some("Rust".to_string()),
            ..Default::default()
        };
        let csv = "Name,Description\nGo,a\nRust,b\nZig,c\n";

        let err = import_csv(&mut importer, csv.as_bytes()).await.unwrap_err();
        assert!(matches!(err, CsvError::Service(ServiceError::Database(_))));
        assert_eq!(importer.stored, vec!["Go"]);
    }

    #[tokio::test]
    async fn test_blank_lines_are_skipped() {
        let mut importer = NameImporter::default();
        let csv = "Name,Description\nGo,a\n,\nRust,b\n";

        let result = import_csv(&mut importer, csv.as_bytes()).await.unwrap();
        assert_eq!(result.total_rows, 2);
        assert_eq!(result.success_count, 2);
    }

    #[tokio::test]
    async fn test_preview_persists_nothing() {
        let mut importer = NameImporter::default();
        let csv = "Name,Description\nGo,a\n,b\n";

        let preview = preview_csv(&mut importer, csv.as_bytes()).await.unwrap();
        assert_eq!(preview.total_rows, 2);
        assert_eq!(preview.valid_rows, vec!["Go"]);
        assert_eq!(preview.errors.len(), 1);
        assert!(importer.stored.is_empty());
    }
}
