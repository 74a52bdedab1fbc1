//! Public study API for one learner.
//!
//! Answers go to the progress tracker first; the session tally only moves once
//! the progress write succeeded.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::db::LogOnError;
use crate::domain::{ProgressRecord, SessionRecord, SessionType};
use crate::error::StudyError;
use crate::session::{SessionAccumulator, SessionStats};
use crate::store::{ProfileStore, SessionStore};
use crate::tracker::{DueWords, ProgressTracker};

pub struct StudyService {
  user_id: String,
  tracker: ProgressTracker,
  profiles: Arc<dyn ProfileStore>,
  accumulator: SessionAccumulator,
}

impl StudyService {
  pub fn new(
    user_id: impl Into<String>,
    tracker: ProgressTracker,
    sessions: Arc<dyn SessionStore>,
    profiles: Arc<dyn ProfileStore>,
  ) -> Self {
    let user_id = user_id.into();
    let accumulator = SessionAccumulator::new(user_id.clone(), sessions);
    Self {
      user_id,
      tracker,
      profiles,
      accumulator,
    }
  }

  pub fn user_id(&self) -> &str {
    &self.user_id
  }

  /// Record an answer. On failure the session tally is left unchanged.
  pub fn record_answer(&mut self, word_id: &str, correct: bool, now: DateTime<Utc>) -> Result<ProgressRecord, StudyError> {
    let record = self.tracker.record_answer(&self.user_id, word_id, correct, now)?;
    self.accumulator.record_answer(word_id, correct);
    Ok(record)
  }

  /// Due words for review. A failed read yields an empty queue with a warning.
  pub fn get_due_words(&self, now: DateTime<Utc>, limit: usize) -> DueWords {
    self.tracker.review_queue(&self.user_id, now, limit)
  }

  pub fn start_session(&mut self, session_type: SessionType, now: DateTime<Utc>) -> Result<String, StudyError> {
    Ok(self.accumulator.start_session(session_type, now)?)
  }

  /// Close the running session, if any, and count it on the learner's profile.
  pub fn end_session(&mut self, now: DateTime<Utc>) -> Result<Option<SessionRecord>, StudyError> {
    let closed = self.accumulator.end_session(now)?;
    if closed.is_some() {
      // The closed session record is authoritative; the counter is best effort
      self
        .profiles
        .increment_sessions_completed(&self.user_id)
        .log_warn("Failed to update completed session count");
    }
    Ok(closed)
  }

  pub fn session(&self) -> &SessionAccumulator {
    &self.accumulator
  }

  /// Stats of the running session.
  pub fn session_stats(&self) -> Result<SessionStats, StudyError> {
    self.accumulator.stats().ok_or(StudyError::NoActiveSession)
  }
}
