//! Business operations
//!
//! Handlers call these functions; they own transaction boundaries. A
//! function that touches more than one row opens a transaction, performs
//! every write plus its activity-log entry on it, and commits once. Any
//! error drops the transaction, which rolls it back.

pub mod activity;
pub mod catalog;
pub mod error;
pub mod pagination;
pub mod projects;
pub mod teams;
pub mod users;

pub use error::{FieldError, ServiceError, ServiceResult};

/// Trims a required text field, failing with `message` when blank
pub(crate) fn require_text<'a>(field: &str, value: &'a str, message: &str) -> ServiceResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::invalid(field, message));
    }
    Ok(trimmed)
}

/// Trims an optional text field; blank becomes `None`
pub(crate) fn normalize_optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("name", "  Rust ", "Name is required").unwrap(), "Rust");

        match require_text("name", "   ", "Name is required") {
            Err(ServiceError::Validation(errors)) => {
                assert_eq!(errors, vec![FieldError::new("name", "Name is required")]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  text ")), Some("text"));
        assert_eq!(normalize_optional(Some("   ")), None);
        assert_eq!(normalize_optional(None), None);
    }
}
