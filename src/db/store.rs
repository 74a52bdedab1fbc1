//! SQLite-backed implementation of the storage boundaries.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{sessions::SessionWrite, try_lock, DbPool};
use crate::domain::{ProgressRecord, ReviewStrategy, SessionRecord, SessionUpdate, UserProfile};
use crate::error::StoreError;
use crate::session::generate_session_id;
use crate::store::{ProfilePreferenceSource, ProfileStore, ReviewStateStore, SessionStore};

/// Shared handle to one SQLite database. Cheap to clone.
#[derive(Clone)]
pub struct SqliteStore {
  pool: DbPool,
}

impl SqliteStore {
  pub fn new(pool: DbPool) -> Self {
    Self { pool }
  }

  /// Open (and migrate) the database file at `path`.
  pub fn open(path: &Path) -> Result<Self, StoreError> {
    Ok(Self::new(super::init_db(path)?))
  }

  /// Private in-memory database, mostly for tests.
  pub fn open_in_memory() -> Result<Self, StoreError> {
    let conn = Connection::open_in_memory()?;
    super::run_migrations(&conn)?;
    Ok(Self::new(Arc::new(Mutex::new(conn))))
  }

  pub fn pool(&self) -> &DbPool {
    &self.pool
  }
}

impl ReviewStateStore for SqliteStore {
  fn get(&self, user_id: &str, word_id: &str) -> Result<Option<ProgressRecord>, StoreError> {
    let conn = try_lock(&self.pool)?;
    Ok(super::get_progress(&conn, user_id, word_id)?)
  }

  fn put(&self, record: &ProgressRecord) -> Result<(), StoreError> {
    let conn = try_lock(&self.pool)?;
    Ok(super::upsert_progress(&conn, record)?)
  }

  fn query_due(
    &self,
    user_id: &str,
    due_before: DateTime<Utc>,
    limit: usize,
  ) -> Result<Vec<ProgressRecord>, StoreError> {
    let conn = try_lock(&self.pool)?;
    Ok(super::get_due_progress(&conn, user_id, due_before, limit)?)
  }

  fn list_by_user(&self, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
    let conn = try_lock(&self.pool)?;
    Ok(super::get_user_progress(&conn, user_id)?)
  }
}

impl SessionStore for SqliteStore {
  fn create(&self, session: &SessionRecord) -> Result<String, StoreError> {
    let conn = try_lock(&self.pool)?;
    let session_id = generate_session_id();
    super::insert_session(&conn, &session_id, session)?;
    Ok(session_id)
  }

  fn update(&self, session_id: &str, update: &SessionUpdate) -> Result<(), StoreError> {
    let conn = try_lock(&self.pool)?;
    match super::update_session(&conn, session_id, update)? {
      SessionWrite::Applied => Ok(()),
      SessionWrite::Closed => {
        tracing::debug!("Ignoring update to closed session {}", session_id);
        Ok(())
      }
      SessionWrite::Missing => Err(StoreError::NotFound(format!("session {}", session_id))),
    }
  }

  fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
    let conn = try_lock(&self.pool)?;
    Ok(super::get_session(&conn, session_id)?)
  }

  fn list_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<SessionRecord>, StoreError> {
    let conn = try_lock(&self.pool)?;
    Ok(super::get_user_sessions(&conn, user_id, limit)?)
  }
}

impl ProfilePreferenceSource for SqliteStore {
  fn get_review_strategy(&self, user_id: &str) -> Result<ReviewStrategy, StoreError> {
    let conn = try_lock(&self.pool)?;
    Ok(super::get_review_strategy(&conn, user_id)?)
  }
}

impl ProfileStore for SqliteStore {
  fn get_profile(&self, user_id: &str) -> Result<UserProfile, StoreError> {
    let conn = try_lock(&self.pool)?;
    Ok(super::get_profile(&conn, user_id)?)
  }

  fn set_review_strategy(&self, user_id: &str, strategy: ReviewStrategy) -> Result<(), StoreError> {
    let conn = try_lock(&self.pool)?;
    Ok(super::set_review_strategy(&conn, user_id, strategy)?)
  }

  fn increment_sessions_completed(&self, user_id: &str) -> Result<u32, StoreError> {
    let conn = try_lock(&self.pool)?;
    Ok(super::increment_sessions_completed(&conn, user_id)?)
  }
}
