//! Database module
//!
//! Handles SQLite connection and migrations.

pub mod connection;
pub mod migrations;

pub use connection::{Database, DbError, DbResult};

/// Migrated file-backed database in a temporary directory
#[cfg(test)]
pub(crate) fn test_database() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = Database::new(dir.path().join("aegiscare-test.db")).expect("open database");
    db.with_conn(migrations::run_migrations).expect("migrate");
    (dir, db)
}
