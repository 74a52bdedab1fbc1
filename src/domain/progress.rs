use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{EASY_ACCURACY_THRESHOLD, HARD_ACCURACY_THRESHOLD, LEARNED_MIN_ATTEMPTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
  Easy,
  Medium,
  Hard,
}

impl DifficultyLevel {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Easy => "easy",
      Self::Medium => "medium",
      Self::Hard => "hard",
    }
  }

  /// Classify a word by its lifetime accuracy. Boundaries are exclusive:
  /// exactly 0.8 is medium, exactly 0.5 is medium.
  pub fn from_accuracy(accuracy: f64) -> Self {
    if accuracy > EASY_ACCURACY_THRESHOLD {
      Self::Easy
    } else if accuracy < HARD_ACCURACY_THRESHOLD {
      Self::Hard
    } else {
      Self::Medium
    }
  }
}

/// Raw answer counters for one (user, word) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerCounters {
  pub correct: u32,
  pub incorrect: u32,
  pub streak: u32,
}

impl AnswerCounters {
  /// Counters after one more answer.
  pub fn after_answer(self, correct: bool) -> Self {
    if correct {
      Self {
        correct: self.correct + 1,
        incorrect: self.incorrect,
        streak: self.streak + 1,
      }
    } else {
      Self {
        correct: self.correct,
        incorrect: self.incorrect + 1,
        streak: 0,
      }
    }
  }

  pub fn attempts(&self) -> u32 {
    self.correct + self.incorrect
  }

  /// Fraction of correct answers, 0.0 when nothing has been answered.
  pub fn accuracy(&self) -> f64 {
    let attempts = self.attempts();
    if attempts > 0 {
      self.correct as f64 / attempts as f64
    } else {
      0.0
    }
  }

  pub fn difficulty(&self) -> DifficultyLevel {
    DifficultyLevel::from_accuracy(self.accuracy())
  }

  pub fn is_learned(&self) -> bool {
    self.accuracy() > EASY_ACCURACY_THRESHOLD && self.attempts() >= LEARNED_MIN_ATTEMPTS
  }
}

/// Review state for one (user, word) pair.
///
/// `difficulty_level` and `is_learned` are persisted for querying but are
/// never set directly: every constructor derives them from the counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressRecord {
  user_id: String,
  word_id: String,
  correct_count: u32,
  incorrect_count: u32,
  streak_count: u32,
  last_reviewed: DateTime<Utc>,
  next_review: DateTime<Utc>,
  difficulty_level: DifficultyLevel,
  is_learned: bool,
}

impl ProgressRecord {
  /// Build a record from counters and review timestamps.
  pub fn new(
    user_id: impl Into<String>,
    word_id: impl Into<String>,
    counters: AnswerCounters,
    last_reviewed: DateTime<Utc>,
    next_review: DateTime<Utc>,
  ) -> Self {
    let mut record = Self {
      user_id: user_id.into(),
      word_id: word_id.into(),
      correct_count: counters.correct,
      incorrect_count: counters.incorrect,
      streak_count: counters.streak,
      last_reviewed,
      next_review,
      difficulty_level: DifficultyLevel::Medium,
      is_learned: false,
    };
    record.recompute_derived();
    record
  }

  fn recompute_derived(&mut self) {
    let counters = self.counters();
    self.difficulty_level = counters.difficulty();
    self.is_learned = counters.is_learned();
  }

  pub fn user_id(&self) -> &str {
    &self.user_id
  }

  pub fn word_id(&self) -> &str {
    &self.word_id
  }

  pub fn counters(&self) -> AnswerCounters {
    AnswerCounters {
      correct: self.correct_count,
      incorrect: self.incorrect_count,
      streak: self.streak_count,
    }
  }

  pub fn correct_count(&self) -> u32 {
    self.correct_count
  }

  pub fn incorrect_count(&self) -> u32 {
    self.incorrect_count
  }

  pub fn streak_count(&self) -> u32 {
    self.streak_count
  }

  pub fn last_reviewed(&self) -> DateTime<Utc> {
    self.last_reviewed
  }

  pub fn next_review(&self) -> DateTime<Utc> {
    self.next_review
  }

  pub fn difficulty_level(&self) -> DifficultyLevel {
    self.difficulty_level
  }

  pub fn is_learned(&self) -> bool {
    self.is_learned
  }

  pub fn accuracy(&self) -> f64 {
    self.counters().accuracy()
  }

  pub fn is_due(&self, now: DateTime<Utc>) -> bool {
    self.next_review <= now
  }

  /// Length of the last scheduled interval in whole days, at least 1.
  pub fn scheduled_interval_days(&self) -> i64 {
    let seconds = (self.next_review - self.last_reviewed).num_seconds() as f64;
    ((seconds / 86_400.0).round() as i64).max(1)
  }
}
