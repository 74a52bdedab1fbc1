//! Test utilities for database setup.
//!
//! Provides helpers that reuse the authoritative schema initialization,
//! eliminating schema duplication in test code.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::db::SqliteStore;
use crate::error::StoreError;

const DB_FILE: &str = "serbian_flash.db";

/// Test environment with a migrated database file in a temporary directory.
///
/// The directory is removed when the environment is dropped.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    /// Store over the database file, with all migrations applied
    pub store: SqliteStore,
}

impl TestEnv {
    /// Create a test environment using `crate::db::init_db()`.
    pub fn new() -> Result<Self, StoreError> {
        let temp = TempDir::new().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let store = SqliteStore::open(&temp.path().join(DB_FILE))?;
        Ok(Self { temp, store })
    }

    /// Get the temporary directory path for creating test files.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Path of the database file, for reopening it.
    pub fn db_path(&self) -> PathBuf {
        self.temp.path().join(DB_FILE)
    }
}
