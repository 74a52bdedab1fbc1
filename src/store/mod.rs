//! Storage boundaries used by the tracker and the session accumulator.
//!
//! Every collaborator is passed in explicitly, so tests can swap the SQLite
//! store for [`memory::MemoryStore`].

pub mod memory;

use chrono::{DateTime, Utc};

use crate::domain::{ProgressRecord, ReviewStrategy, SessionRecord, SessionUpdate, UserProfile};
use crate::error::StoreError;

pub use memory::MemoryStore;

/// Durable progress records keyed by (user, word).
///
/// Each call is atomic on its own; a read followed by a write is not.
pub trait ReviewStateStore: Send + Sync {
  fn get(&self, user_id: &str, word_id: &str) -> Result<Option<ProgressRecord>, StoreError>;

  /// Create the record or overwrite the mutable fields of an existing one.
  fn put(&self, record: &ProgressRecord) -> Result<(), StoreError>;

  /// Records with `next_review <= due_before`, oldest due date first, at most `limit`.
  fn query_due(
    &self,
    user_id: &str,
    due_before: DateTime<Utc>,
    limit: usize,
  ) -> Result<Vec<ProgressRecord>, StoreError>;

  /// Every record of one learner, in no particular order.
  fn list_by_user(&self, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError>;
}

/// Durable study session records.
pub trait SessionStore: Send + Sync {
  /// Store a new session and return its generated id.
  fn create(&self, session: &SessionRecord) -> Result<String, StoreError>;

  /// Apply a partial update. Closed sessions are left untouched; an unknown
  /// id is `NotFound`.
  fn update(&self, session_id: &str, update: &SessionUpdate) -> Result<(), StoreError>;

  fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError>;

  /// Most recent sessions first.
  fn list_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<SessionRecord>, StoreError>;
}

/// Source of the per-learner scheduling preference.
pub trait ProfilePreferenceSource: Send + Sync {
  /// Learners without a stored preference get the default strategy.
  fn get_review_strategy(&self, user_id: &str) -> Result<ReviewStrategy, StoreError>;
}

/// Writable learner profiles.
pub trait ProfileStore: ProfilePreferenceSource {
  fn get_profile(&self, user_id: &str) -> Result<UserProfile, StoreError>;

  fn set_review_strategy(&self, user_id: &str, strategy: ReviewStrategy) -> Result<(), StoreError>;

  /// Bump the completed-session counter and return the new value.
  fn increment_sessions_completed(&self, user_id: &str) -> Result<u32, StoreError>;
}
