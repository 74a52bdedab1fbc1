//! Study session tracking.
//!
//! [`SessionAccumulator`] keeps a local tally of one learner's running session
//! and pushes it to the [`SessionStore`] when the session ends. A session whose
//! client disappears before `end_session` simply stays open in the store.
//!
//! [`SessionRegistry`] holds per-learner state in memory and forgets entries
//! after a period of inactivity.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config;
use crate::domain::{SessionRecord, SessionType, SessionUpdate};
use crate::error::StoreError;
use crate::store::SessionStore;

/// Snapshot of the running session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
  pub session_id: String,
  pub session_type: SessionType,
  pub start_time: DateTime<Utc>,
  pub words_studied: Vec<String>,
  pub correct_answers: u32,
  pub total_answers: u32,
}

struct ActiveSession {
  session_id: String,
  session_type: SessionType,
  start_time: DateTime<Utc>,
  /// First-answered order
  words: Vec<String>,
  seen: HashSet<String>,
  correct_answers: u32,
  total_answers: u32,
}

pub struct SessionAccumulator {
  user_id: String,
  store: Arc<dyn SessionStore>,
  active: Option<ActiveSession>,
}

impl SessionAccumulator {
  pub fn new(user_id: impl Into<String>, store: Arc<dyn SessionStore>) -> Self {
    Self {
      user_id: user_id.into(),
      store,
      active: None,
    }
  }

  pub fn user_id(&self) -> &str {
    &self.user_id
  }

  /// Open a new session in the store and reset the local tally.
  ///
  /// An unfinished previous session is dropped locally and left open in the
  /// store. Local state is untouched if the store call fails.
  pub fn start_session(&mut self, session_type: SessionType, now: DateTime<Utc>) -> Result<String, StoreError> {
    let record = SessionRecord::new(self.user_id.clone(), session_type, now);
    let session_id = self.store.create(&record)?;

    if let Some(previous) = self.active.take() {
      tracing::warn!(
        "Starting a new session for {} while {} was still open",
        self.user_id,
        previous.session_id
      );
    }

    tracing::info!(
      user_id = %self.user_id,
      session_id = %session_id,
      session_type = session_type.as_str(),
      "Study session started"
    );

    self.active = Some(ActiveSession {
      session_id: session_id.clone(),
      session_type,
      start_time: now,
      words: Vec::new(),
      seen: HashSet::new(),
      correct_answers: 0,
      total_answers: 0,
    });
    Ok(session_id)
  }

  /// Count one answer. Returns false when no session is running.
  ///
  /// A repeated word is listed once but every answer is counted.
  pub fn record_answer(&mut self, word_id: &str, correct: bool) -> bool {
    let Some(active) = self.active.as_mut() else {
      return false;
    };

    if active.seen.insert(word_id.to_string()) {
      active.words.push(word_id.to_string());
    }
    active.total_answers += 1;
    if correct {
      active.correct_answers += 1;
    }
    true
  }

  /// Push the final tally, close the stored session and clear local state.
  ///
  /// Returns the closed record, or None when no session was running. If the
  /// store call fails the local tally is kept so the caller can retry.
  pub fn end_session(&mut self, now: DateTime<Utc>) -> Result<Option<SessionRecord>, StoreError> {
    let Some(active) = self.active.as_ref() else {
      return Ok(None);
    };

    // Clock skew must never produce a session that ends before it started
    let end_time = now.max(active.start_time);
    let update = SessionUpdate {
      end_time: Some(end_time),
      words_studied: Some(active.words.clone()),
      correct_answers: Some(active.correct_answers),
      total_answers: Some(active.total_answers),
    };
    self.store.update(&active.session_id, &update)?;

    let closed = SessionRecord {
      user_id: self.user_id.clone(),
      session_id: active.session_id.clone(),
      start_time: active.start_time,
      end_time: Some(end_time),
      words_studied: active.words.clone(),
      correct_answers: active.correct_answers,
      total_answers: active.total_answers,
      session_type: active.session_type,
    };
    self.active = None;

    tracing::info!(
      user_id = %self.user_id,
      session_id = %closed.session_id,
      words = closed.words_studied.len(),
      correct = closed.correct_answers,
      total = closed.total_answers,
      "Study session ended"
    );
    Ok(Some(closed))
  }

  pub fn is_active(&self) -> bool {
    self.active.is_some()
  }

  pub fn session_id(&self) -> Option<&str> {
    self.active.as_ref().map(|a| a.session_id.as_str())
  }

  pub fn words_studied(&self) -> &[String] {
    self.active.as_ref().map(|a| a.words.as_slice()).unwrap_or(&[])
  }

  pub fn correct_answers(&self) -> u32 {
    self.active.as_ref().map(|a| a.correct_answers).unwrap_or(0)
  }

  pub fn total_answers(&self) -> u32 {
    self.active.as_ref().map(|a| a.total_answers).unwrap_or(0)
  }

  pub fn accuracy(&self) -> f64 {
    let total = self.total_answers();
    if total > 0 {
      self.correct_answers() as f64 / total as f64
    } else {
      0.0
    }
  }

  pub fn stats(&self) -> Option<SessionStats> {
    self.active.as_ref().map(|a| SessionStats {
      session_id: a.session_id.clone(),
      session_type: a.session_type,
      start_time: a.start_time,
      words_studied: a.words.clone(),
      correct_answers: a.correct_answers,
      total_answers: a.total_answers,
    })
  }
}

/// Entry with last access time for expiration
struct RegistryEntry<S> {
  value: Arc<Mutex<S>>,
  last_access: DateTime<Utc>,
}

/// In-memory per-learner state that expires after inactivity.
///
/// The map lock is only held to look an entry up; work on the entry runs under
/// that learner's own lock, so learners never wait on each other.
pub struct SessionRegistry<S> {
  entries: Mutex<HashMap<String, RegistryEntry<S>>>,
  expiry: Duration,
}

impl<S> SessionRegistry<S> {
  pub fn new(expiry: Duration) -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
      expiry,
    }
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, RegistryEntry<S>>> {
    // State is rebuilt on demand, so a poisoned map is still usable
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn run<R>(value: &Mutex<S>, f: impl FnOnce(&mut S) -> R) -> R {
    let mut guard = value.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut guard)
  }

  /// Run `f` on the entry for `key`, creating it with `create` if needed.
  pub fn with_entry<R>(&self, key: &str, create: impl FnOnce() -> S, f: impl FnOnce(&mut S) -> R) -> R {
    let value = {
      let now = Utc::now();
      let mut entries = self.lock();

      // Clean up expired entries occasionally (~10% chance)
      if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
        Self::retain_fresh(&mut entries, now - self.expiry);
      }

      let entry = entries.entry(key.to_string()).or_insert_with(|| RegistryEntry {
        value: Arc::new(Mutex::new(create())),
        last_access: now,
      });
      entry.last_access = now;
      entry.value.clone()
    };
    Self::run(&value, f)
  }

  /// Run `f` on an existing entry without creating one.
  pub fn with_existing<R>(&self, key: &str, f: impl FnOnce(&mut S) -> R) -> Option<R> {
    let value = {
      let mut entries = self.lock();
      let entry = entries.get_mut(key)?;
      entry.last_access = Utc::now();
      entry.value.clone()
    };
    Some(Self::run(&value, f))
  }

  /// Drop entries idle since before `now - expiry`. Returns how many were dropped.
  pub fn cleanup_expired(&self, now: DateTime<Utc>) -> usize {
    let mut entries = self.lock();
    let before = entries.len();
    Self::retain_fresh(&mut entries, now - self.expiry);
    before - entries.len()
  }

  fn retain_fresh(entries: &mut HashMap<String, RegistryEntry<S>>, cutoff: DateTime<Utc>) {
    entries.retain(|_, entry| entry.last_access > cutoff);
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl<S> Default for SessionRegistry<S> {
  fn default() -> Self {
    Self::new(Duration::hours(config::SESSION_EXPIRY_HOURS))
  }
}

/// Generate a new session ID
pub fn generate_session_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}
