//! # TeamHub Shared Library
//!
//! Domain types, persistence and business rules shared by the TeamHub API
//! server and the status worker.
//!
//! ## Module Organization
//!
//! - `db`: connection pool, migrations, soft-delete helpers
//! - `models`: database rows and their queries
//! - `ledger`: membership and leadership interval bookkeeping
//! - `status`: date-derived project status and the bulk refresh
//! - `services`: transactional operations used by HTTP handlers
//! - `csv`: bulk import and export
//! - `auth`: passwords, JWTs, admin session tokens, role checks

pub mod auth;
pub mod csv;
pub mod db;
pub mod ledger;
pub mod models;
pub mod services;
pub mod status;

/// Current version of the TeamHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
