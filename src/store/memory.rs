//! In-memory store implementing every storage boundary.
//!
//! Used by tests and by the API tests in `tests/`. Outages can be switched on
//! to exercise the failure paths.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{ProfilePreferenceSource, ProfileStore, ReviewStateStore, SessionStore};
use crate::domain::{ProgressRecord, ReviewStrategy, SessionRecord, SessionUpdate, UserProfile};
use crate::error::StoreError;
use crate::session::generate_session_id;

#[derive(Default)]
struct Tables {
  progress: HashMap<(String, String), ProgressRecord>,
  sessions: HashMap<String, SessionRecord>,
  profiles: HashMap<String, UserProfile>,
}

#[derive(Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
  unavailable: AtomicBool,
  writes_unavailable: AtomicBool,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Make every call fail with `StoreError::Unavailable`.
  pub fn set_unavailable(&self, unavailable: bool) {
    self.unavailable.store(unavailable, Ordering::SeqCst);
  }

  /// Make only writes fail; reads keep working.
  pub fn set_writes_unavailable(&self, unavailable: bool) {
    self.writes_unavailable.store(unavailable, Ordering::SeqCst);
  }

  fn read(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
    if self.unavailable.load(Ordering::SeqCst) {
      return Err(StoreError::Unavailable("memory store offline".into()));
    }
    self
      .tables
      .lock()
      .map_err(|_| StoreError::Unavailable("memory store poisoned".into()))
  }

  fn write(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
    if self.writes_unavailable.load(Ordering::SeqCst) {
      return Err(StoreError::Unavailable("memory store read-only".into()));
    }
    self.read()
  }
}

impl ReviewStateStore for MemoryStore {
  fn get(&self, user_id: &str, word_id: &str) -> Result<Option<ProgressRecord>, StoreError> {
    let tables = self.read()?;
    Ok(tables
      .progress
      .get(&(user_id.to_string(), word_id.to_string()))
      .cloned())
  }

  fn put(&self, record: &ProgressRecord) -> Result<(), StoreError> {
    let mut tables = self.write()?;
    tables.progress.insert(
      (record.user_id().to_string(), record.word_id().to_string()),
      record.clone(),
    );
    Ok(())
  }

  fn query_due(
    &self,
    user_id: &str,
    due_before: DateTime<Utc>,
    limit: usize,
  ) -> Result<Vec<ProgressRecord>, StoreError> {
    let tables = self.read()?;
    let mut due: Vec<ProgressRecord> = tables
      .progress
      .values()
      .filter(|r| r.user_id() == user_id && r.is_due(due_before))
      .cloned()
      .collect();
    due.sort_by(|a, b| {
      a.next_review()
        .cmp(&b.next_review())
        .then_with(|| a.word_id().cmp(b.word_id()))
    });
    due.truncate(limit);
    Ok(due)
  }

  fn list_by_user(&self, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
    let tables = self.read()?;
    Ok(tables
      .progress
      .values()
      .filter(|r| r.user_id() == user_id)
      .cloned()
      .collect())
  }
}

impl SessionStore for MemoryStore {
  fn create(&self, session: &SessionRecord) -> Result<String, StoreError> {
    let mut tables = self.write()?;
    let session_id = generate_session_id();
    let mut stored = session.clone();
    stored.session_id = session_id.clone();
    tables.sessions.insert(session_id.clone(), stored);
    Ok(session_id)
  }

  fn update(&self, session_id: &str, update: &SessionUpdate) -> Result<(), StoreError> {
    let mut tables = self.write()?;
    let session = tables
      .sessions
      .get_mut(session_id)
      .ok_or_else(|| StoreError::NotFound(format!("session {}", session_id)))?;
    if !session.apply(update) {
      tracing::debug!("Ignoring update to closed session {}", session_id);
    }
    Ok(())
  }

  fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
    let tables = self.read()?;
    Ok(tables.sessions.get(session_id).cloned())
  }

  fn list_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<SessionRecord>, StoreError> {
    let tables = self.read()?;
    let mut sessions: Vec<SessionRecord> = tables
      .sessions
      .values()
      .filter(|s| s.user_id == user_id)
      .cloned()
      .collect();
    sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    sessions.truncate(limit);
    Ok(sessions)
  }
}

impl ProfilePreferenceSource for MemoryStore {
  fn get_review_strategy(&self, user_id: &str) -> Result<ReviewStrategy, StoreError> {
    let tables = self.read()?;
    Ok(tables
      .profiles
      .get(user_id)
      .map(|p| p.review_strategy)
      .unwrap_or_default())
  }
}

impl ProfileStore for MemoryStore {
  fn get_profile(&self, user_id: &str) -> Result<UserProfile, StoreError> {
    let tables = self.read()?;
    Ok(tables
      .profiles
      .get(user_id)
      .cloned()
      .unwrap_or_else(|| UserProfile::new(user_id)))
  }

  fn set_review_strategy(&self, user_id: &str, strategy: ReviewStrategy) -> Result<(), StoreError> {
    let mut tables = self.write()?;
    tables
      .profiles
      .entry(user_id.to_string())
      .or_insert_with(|| UserProfile::new(user_id))
      .review_strategy = strategy;
    Ok(())
  }

  fn increment_sessions_completed(&self, user_id: &str) -> Result<u32, StoreError> {
    let mut tables = self.write()?;
    let profile = tables
      .profiles
      .entry(user_id.to_string())
      .or_insert_with(|| UserProfile::new(user_id));
    profile.total_sessions_completed += 1;
    Ok(profile.total_sessions_completed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{AnswerCounters, SessionType};
  use chrono::Duration;

  fn record(user: &str, word: &str, next_review: DateTime<Utc>) -> ProgressRecord {
    let counters = AnswerCounters {
      correct: 1,
      incorrect: 0,
      streak: 1,
    };
    ProgressRecord::new(user, word, counters, next_review - Duration::days(1), next_review)
  }

  #[test]
  fn test_put_overwrites() {
    let store = MemoryStore::new();
    let now = Utc::now();
    store.put(&record("u1", "kuća", now)).unwrap();
    store.put(&record("u1", "kuća", now + Duration::days(3))).unwrap();

    let stored = ReviewStateStore::get(&store, "u1", "kuća").unwrap().unwrap();
    assert_eq!(stored.next_review(), now + Duration::days(3));
    assert_eq!(ReviewStateStore::list_by_user(&store, "u1").unwrap().len(), 1);
  }

  #[test]
  fn test_query_due_filters_sorts_and_limits() {
    let store = MemoryStore::new();
    let now = Utc::now();
    store.put(&record("u1", "a", now - Duration::days(1))).unwrap();
    store.put(&record("u1", "b", now - Duration::days(5))).unwrap();
    store.put(&record("u1", "c", now + Duration::days(1))).unwrap();
    store.put(&record("u2", "d", now - Duration::days(9))).unwrap();

    let due = store.query_due("u1", now, 10).unwrap();
    let words: Vec<&str> = due.iter().map(|r| r.word_id()).collect();
    assert_eq!(words, vec!["b", "a"]);

    assert_eq!(store.query_due("u1", now, 1).unwrap().len(), 1);
  }

  #[test]
  fn test_outage() {
    let store = MemoryStore::new();
    store.set_unavailable(true);
    assert!(matches!(
      ReviewStateStore::get(&store, "u1", "x"),
      Err(StoreError::Unavailable(_))
    ));

    store.set_unavailable(false);
    store.set_writes_unavailable(true);
    assert!(ReviewStateStore::get(&store, "u1", "x").unwrap().is_none());
    assert!(store.put(&record("u1", "x", Utc::now())).is_err());
  }

  #[test]
  fn test_session_update_unknown_id() {
    let store = MemoryStore::new();
    let result = store.update("missing", &SessionUpdate::default());
    assert!(matches!(result, Err(StoreError::NotFound(_))));
  }

  #[test]
  fn test_sessions_newest_first() {
    let store = MemoryStore::new();
    let now = Utc::now();
    let old = store
      .create(&SessionRecord::new("u1", SessionType::Flashcard, now - Duration::hours(2)))
      .unwrap();
    let new = store
      .create(&SessionRecord::new("u1", SessionType::Review, now))
      .unwrap();

    let sessions = SessionStore::list_by_user(&store, "u1", 10).unwrap();
    let ids: Vec<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();
    assert_eq!(ids, vec![new.as_str(), old.as_str()]);
  }

  #[test]
  fn test_profile_defaults_and_updates() {
    let store = MemoryStore::new();
    assert_eq!(store.get_review_strategy("u1").unwrap(), ReviewStrategy::Exponential);

    store.set_review_strategy("u1", ReviewStrategy::Sm2).unwrap();
    assert_eq!(store.get_review_strategy("u1").unwrap(), ReviewStrategy::Sm2);

    assert_eq!(store.increment_sessions_completed("u1").unwrap(), 1);
    assert_eq!(store.increment_sessions_completed("u1").unwrap(), 2);
    assert_eq!(store.get_profile("u1").unwrap().total_sessions_completed, 2);
  }
}
