//! The answer -> review state transition.
//!
//! `record_answer` is a read followed by a write against the store with no
//! transaction around both. Two concurrent answers to the same word can race
//! and one of them is lost; a retried call counts the answer twice.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::config;
use crate::domain::{DifficultyLevel, ProgressRecord};
use crate::error::StoreError;
use crate::srs;
use crate::store::{ProfilePreferenceSource, ReviewStateStore};

/// Review queue, possibly degraded to empty when the store could not be read
#[derive(Debug, Clone, Default, Serialize)]
pub struct DueWords {
  pub words: Vec<ProgressRecord>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub warning: Option<String>,
}

/// Aggregate view over all tracked words of one learner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
  pub total_words: usize,
  pub learned_words: usize,
  pub due_words: usize,
  pub easy_words: usize,
  pub medium_words: usize,
  pub hard_words: usize,
}

impl ProgressSummary {
  pub fn from_records(records: &[ProgressRecord], now: DateTime<Utc>) -> Self {
    let mut summary = Self {
      total_words: records.len(),
      ..Default::default()
    };
    for record in records {
      if record.is_learned() {
        summary.learned_words += 1;
      }
      if record.is_due(now) {
        summary.due_words += 1;
      }
      match record.difficulty_level() {
        DifficultyLevel::Easy => summary.easy_words += 1,
        DifficultyLevel::Medium => summary.medium_words += 1,
        DifficultyLevel::Hard => summary.hard_words += 1,
      }
    }
    summary
  }

  /// Share of tracked words that are learned, as a whole percentage
  pub fn learned_percentage(&self) -> usize {
    if self.total_words > 0 {
      (self.learned_words * 100) / self.total_words
    } else {
      0
    }
  }
}

#[derive(Clone)]
pub struct ProgressTracker {
  progress: Arc<dyn ReviewStateStore>,
  preferences: Arc<dyn ProfilePreferenceSource>,
}

impl ProgressTracker {
  pub fn new(progress: Arc<dyn ReviewStateStore>, preferences: Arc<dyn ProfilePreferenceSource>) -> Self {
    Self { progress, preferences }
  }

  /// Apply one answer to the learner's record for `word_id` and persist it.
  ///
  /// Nothing is written when loading the record or the strategy fails, and a
  /// failed write is returned to the caller.
  pub fn record_answer(
    &self,
    user_id: &str,
    word_id: &str,
    correct: bool,
    now: DateTime<Utc>,
  ) -> Result<ProgressRecord, StoreError> {
    let previous = self.progress.get(user_id, word_id)?;

    let counters = previous
      .as_ref()
      .map(|p| p.counters())
      .unwrap_or_default()
      .after_answer(correct);

    // Read on every answer so a changed preference applies immediately
    let strategy = self.preferences.get_review_strategy(user_id)?;
    let schedule = srs::schedule(previous.as_ref(), counters.streak, correct, strategy, now);

    let record = ProgressRecord::new(user_id, word_id, counters, now, schedule.next_review);
    self.progress.put(&record)?;

    tracing::debug!(
      user_id,
      word_id,
      correct,
      strategy = strategy.as_str(),
      streak = counters.streak,
      interval_days = schedule.interval_days,
      difficulty = record.difficulty_level().as_str(),
      learned = record.is_learned(),
      "Recorded answer"
    );

    Ok(record)
  }

  /// Stored record for one word; None until the word is first answered.
  pub fn word_progress(&self, user_id: &str, word_id: &str) -> Result<Option<ProgressRecord>, StoreError> {
    self.progress.get(user_id, word_id)
  }

  /// Words due at `now`, most overdue first, at most `limit`.
  pub fn due_words(
    &self,
    user_id: &str,
    now: DateTime<Utc>,
    limit: usize,
  ) -> Result<Vec<ProgressRecord>, StoreError> {
    if limit == 0 {
      return Ok(Vec::new());
    }
    self.progress.query_due(user_id, now, limit)
  }

  /// Due words for review, capped at `MAX_DUE_LIMIT`. A failed read yields an
  /// empty queue with a warning.
  pub fn review_queue(&self, user_id: &str, now: DateTime<Utc>, limit: usize) -> DueWords {
    let limit = limit.min(config::MAX_DUE_LIMIT);
    match self.due_words(user_id, now, limit) {
      Ok(words) => DueWords { words, warning: None },
      Err(e) => {
        tracing::warn!("Failed to load review queue for {}: {}", user_id, e);
        DueWords {
          words: Vec::new(),
          warning: Some(e.user_message().to_string()),
        }
      }
    }
  }

  pub fn progress_summary(&self, user_id: &str, now: DateTime<Utc>) -> Result<ProgressSummary, StoreError> {
    let records = self.progress.list_by_user(user_id)?;
    Ok(ProgressSummary::from_records(&records, now))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::ReviewStrategy;
  use crate::store::{MemoryStore, ProfileStore};
  use chrono::Duration;

  fn tracker() -> (Arc<MemoryStore>, ProgressTracker) {
    let store = Arc::new(MemoryStore::new());
    let tracker = ProgressTracker::new(store.clone(), store.clone());
    (store, tracker)
  }

  fn start() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-02-03T18:00:00Z")
      .unwrap()
      .with_timezone(&Utc)
  }

  #[test]
  fn test_first_answer_creates_record() {
    let (_store, tracker) = tracker();
    let record = tracker.record_answer("u1", "knjiga", true, start()).unwrap();

    assert_eq!(record.correct_count(), 1);
    assert_eq!(record.incorrect_count(), 0);
    assert_eq!(record.streak_count(), 1);
    assert_eq!(record.last_reviewed(), start());
    assert_eq!(record.next_review(), start() + Duration::days(2));
    assert_eq!(record.difficulty_level(), DifficultyLevel::Easy);
    assert!(!record.is_learned());
  }

  #[test]
  fn test_first_answer_wrong() {
    let (_store, tracker) = tracker();
    let record = tracker.record_answer("u1", "knjiga", false, start()).unwrap();

    assert_eq!(record.correct_count(), 0);
    assert_eq!(record.incorrect_count(), 1);
    assert_eq!(record.streak_count(), 0);
    assert_eq!(record.difficulty_level(), DifficultyLevel::Hard);
    assert_eq!(record.next_review(), start() + Duration::days(1));
  }

  #[test]
  fn test_mixed_sequence_exponential() {
    let (_store, tracker) = tracker();
    let mut now = start();
    let mut last = None;
    for correct in [true, false, true, true] {
      last = Some(tracker.record_answer("u1", "prozor", correct, now).unwrap());
      now += Duration::hours(30);
    }
    let record = last.unwrap();
    let answered_at = now - Duration::hours(30);

    assert_eq!(record.correct_count(), 3);
    assert_eq!(record.incorrect_count(), 1);
    assert_eq!(record.streak_count(), 2);
    assert_eq!(record.difficulty_level(), DifficultyLevel::Medium);
    assert!(!record.is_learned());
    assert_eq!(record.next_review(), answered_at + Duration::days(4));
  }

  #[test]
  fn test_learned_and_unlearned() {
    let (_store, tracker) = tracker();
    let mut now = start();
    let mut record = None;
    for _ in 0..5 {
      record = Some(tracker.record_answer("u1", "drvo", true, now).unwrap());
      now += Duration::days(1);
    }
    assert!(record.unwrap().is_learned());

    // 5/6 is still above 0.8
    let after_miss = tracker.record_answer("u1", "drvo", false, now).unwrap();
    assert!(after_miss.is_learned());

    // 5/7 drops below the threshold
    let after_second_miss = tracker.record_answer("u1", "drvo", false, now).unwrap();
    assert!(!after_second_miss.is_learned());
    assert_eq!(after_second_miss.difficulty_level(), DifficultyLevel::Medium);
  }

  #[test]
  fn test_derived_state_matches_counters_for_any_sequence() {
    // Walk every answer sequence up to length 7
    for mask in 0u32..(1 << 7) {
      let (_store, tracker) = tracker();
      let mut previous: Option<ProgressRecord> = None;
      for bit in 0..7 {
        let correct = mask & (1 << bit) != 0;
        let record = tracker.record_answer("u1", "w", correct, start()).unwrap();

        let counters = record.counters();
        let attempts = counters.correct + counters.incorrect;
        let accuracy = counters.correct as f64 / attempts as f64;
        assert_eq!(record.is_learned(), accuracy > 0.8 && attempts >= 5);
        assert_eq!(record.difficulty_level(), DifficultyLevel::from_accuracy(accuracy));

        if let Some(prev) = &previous {
          if correct {
            assert_eq!(record.streak_count(), prev.streak_count() + 1);
            assert_eq!(record.incorrect_count(), prev.incorrect_count());
          } else {
            assert_eq!(record.streak_count(), 0);
            assert_eq!(record.correct_count(), prev.correct_count());
          }
        }
        previous = Some(record);
      }
    }
  }

  #[test]
  fn test_sixteen_in_a_row_doubles_every_time() {
    let (_store, tracker) = tracker();
    let mut record = None;
    for _ in 0..16 {
      record = Some(tracker.record_answer("u1", "reka", true, start()).unwrap());
    }
    let record = record.unwrap();
    assert_eq!(record.streak_count(), 16);
    assert_eq!(record.next_review(), start() + Duration::days(65_536));
  }

  #[test]
  fn test_strategy_change_applies_to_next_answer() {
    let (store, tracker) = tracker();
    let first = tracker.record_answer("u1", "nebo", true, start()).unwrap();
    assert_eq!(first.next_review(), start() + Duration::days(2));

    store.set_review_strategy("u1", ReviewStrategy::Sm2).unwrap();
    let later = start() + Duration::days(2);
    let second = tracker.record_answer("u1", "nebo", true, later).unwrap();
    assert_eq!(second.next_review(), later + Duration::days(6));
  }

  #[test]
  fn test_sm2_third_success_uses_previous_interval() {
    let (store, tracker) = tracker();
    store.set_review_strategy("u1", ReviewStrategy::Sm2).unwrap();

    let mut now = start();
    let mut intervals = Vec::new();
    for _ in 0..3 {
      let record = tracker.record_answer("u1", "zemlja", true, now).unwrap();
      intervals.push((record.next_review() - now).num_days());
      now = record.next_review();
    }
    assert_eq!(intervals, vec![1, 6, 15]);
  }

  #[test]
  fn test_write_failure_is_surfaced() {
    let (store, tracker) = tracker();
    tracker.record_answer("u1", "ptica", true, start()).unwrap();

    store.set_writes_unavailable(true);
    let result = tracker.record_answer("u1", "ptica", true, start());
    assert!(matches!(result, Err(StoreError::Unavailable(_))));

    store.set_writes_unavailable(false);
    let stored = tracker.word_progress("u1", "ptica").unwrap().unwrap();
    assert_eq!(stored.correct_count(), 1);
  }

  #[test]
  fn test_due_words() {
    let (_store, tracker) = tracker();
    tracker.record_answer("u1", "a", true, start()).unwrap(); // due +2d
    tracker.record_answer("u1", "b", false, start()).unwrap(); // due +1d
    tracker.record_answer("u1", "c", true, start() + Duration::days(5)).unwrap(); // due +7d

    let now = start() + Duration::days(3);
    let due = tracker.due_words("u1", now, 10).unwrap();
    let words: Vec<&str> = due.iter().map(|r| r.word_id()).collect();
    assert_eq!(words, vec!["b", "a"]);
    assert!(due.iter().all(|r| r.next_review() <= now));

    assert_eq!(tracker.due_words("u1", now, 1).unwrap().len(), 1);
    assert!(tracker.due_words("u1", now, 0).unwrap().is_empty());
  }

  #[test]
  fn test_review_queue_degrades_on_read_failure() {
    let (store, tracker) = tracker();
    tracker.record_answer("u1", "voz", false, start()).unwrap();

    let queue = tracker.review_queue("u1", start() + Duration::days(1), 10);
    assert_eq!(queue.words.len(), 1);
    assert!(queue.warning.is_none());

    store.set_unavailable(true);
    let degraded = tracker.review_queue("u1", start() + Duration::days(1), 10);
    assert!(degraded.words.is_empty());
    assert!(degraded.warning.is_some());
  }

  #[test]
  fn test_progress_summary() {
    let (_store, tracker) = tracker();
    for _ in 0..5 {
      tracker.record_answer("u1", "learned", true, start()).unwrap();
    }
    tracker.record_answer("u1", "hard", false, start()).unwrap();

    let summary = tracker.progress_summary("u1", start() + Duration::days(1)).unwrap();
    assert_eq!(summary.total_words, 2);
    assert_eq!(summary.learned_words, 1);
    assert_eq!(summary.due_words, 1);
    assert_eq!(summary.easy_words, 1);
    assert_eq!(summary.hard_words, 1);
    assert_eq!(summary.learned_percentage(), 50);
  }
}
