use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of study activity a session groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
  #[default]
  Flashcard,
  Quiz,
  Review,
}

impl SessionType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Flashcard => "flashcard",
      Self::Quiz => "quiz",
      Self::Review => "review",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "flashcard" => Some(Self::Flashcard),
      "quiz" => Some(Self::Quiz),
      "review" => Some(Self::Review),
      _ => None,
    }
  }
}

/// Whether a stored session was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
  Completed,
  /// No end time: still running, or the client went away before closing it
  InProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
  pub user_id: String,
  pub session_id: String,
  pub start_time: DateTime<Utc>,
  pub end_time: Option<DateTime<Utc>>,
  /// Word ids in the order they were first answered, no duplicates
  pub words_studied: Vec<String>,
  pub correct_answers: u32,
  pub total_answers: u32,
  pub session_type: SessionType,
}

impl SessionRecord {
  /// A fresh session with zero counters. The id is assigned by the store.
  pub fn new(user_id: impl Into<String>, session_type: SessionType, start_time: DateTime<Utc>) -> Self {
    Self {
      user_id: user_id.into(),
      session_id: String::new(),
      start_time,
      end_time: None,
      words_studied: Vec::new(),
      correct_answers: 0,
      total_answers: 0,
      session_type,
    }
  }

  pub fn status(&self) -> SessionStatus {
    if self.end_time.is_some() {
      SessionStatus::Completed
    } else {
      SessionStatus::InProgress
    }
  }

  pub fn accuracy(&self) -> f64 {
    if self.total_answers > 0 {
      self.correct_answers as f64 / self.total_answers as f64
    } else {
      0.0
    }
  }

  /// Apply a partial update. Closed sessions are never changed.
  pub fn apply(&mut self, update: &SessionUpdate) -> bool {
    if self.end_time.is_some() {
      return false;
    }
    if let Some(words) = &update.words_studied {
      self.words_studied = words.clone();
    }
    if let Some(correct) = update.correct_answers {
      self.correct_answers = correct;
    }
    if let Some(total) = update.total_answers {
      self.total_answers = total;
    }
    if let Some(end) = update.end_time {
      self.end_time = Some(end);
    }
    true
  }
}

/// Partial field update for a stored session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
  pub end_time: Option<DateTime<Utc>>,
  pub words_studied: Option<Vec<String>>,
  pub correct_answers: Option<u32>,
  pub total_answers: Option<u32>,
}
