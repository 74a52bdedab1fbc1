pub mod profiles;
pub mod progress;
pub mod schema;
pub mod sessions;
pub mod store;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// Re-export all public items from submodules
pub use profiles::*;
pub use progress::*;
pub use schema::run_migrations;
pub use sessions::*;
pub use store::SqliteStore;

pub type DbPool = Arc<Mutex<Connection>>;

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }
}

/// Error returned when database lock cannot be acquired
#[derive(Debug)]
pub struct DbLockError;

impl std::fmt::Display for DbLockError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Database unavailable")
  }
}

impl std::error::Error for DbLockError {}

/// Try to acquire the database lock, returning an error if poisoned
pub fn try_lock(pool: &DbPool) -> std::result::Result<MutexGuard<'_, Connection>, DbLockError> {
  pool.lock().map_err(|_: PoisonError<_>| {
    tracing::error!("Database mutex poisoned - a thread panicked while holding the lock");
    DbLockError
  })
}

pub fn init_db(path: &Path) -> Result<DbPool> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).ok();
  }

  // Create backup before migrations if database exists
  if path.exists() {
    let backup_path = path.with_extension("db.backup");
    if let Err(e) = std::fs::copy(path, &backup_path) {
      tracing::warn!("Could not create database backup: {}", e);
    }
  }

  let conn = Connection::open(path)?;
  run_migrations(&conn)?;
  Ok(Arc::new(Mutex::new(conn)))
}

/// Fixed-width UTC timestamp so stored values sort lexically in time order
pub(crate) fn format_ts(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(column: usize, value: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(value)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_timestamps_sort_lexically() {
    let early = DateTime::parse_from_rfc3339("2025-01-01T00:00:00.5Z").unwrap().with_timezone(&Utc);
    let late = DateTime::parse_from_rfc3339("2025-01-01T00:00:01Z").unwrap().with_timezone(&Utc);
    assert!(format_ts(early) < format_ts(late));
    assert_eq!(parse_ts(0, &format_ts(late)).unwrap(), late);
  }

  #[test]
  fn test_parse_ts_rejects_garbage() {
    assert!(parse_ts(3, "yesterday").is_err());
  }

  #[test]
  fn test_init_db_creates_backup_of_existing_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested/serbian_flash.db");

    init_db(&path).unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("db.backup").exists());

    init_db(&path).unwrap();
    assert!(path.with_extension("db.backup").exists());
  }

  #[test]
  fn test_log_warn() {
    let failed: std::result::Result<Vec<i32>, DbLockError> = Err(DbLockError);
    assert_eq!(failed.log_warn("loading"), None);
    let ok: std::result::Result<i32, DbLockError> = Ok(3);
    assert_eq!(ok.log_warn("loading"), Some(3));
  }
}
