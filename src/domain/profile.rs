use serde::Serialize;

use super::ReviewStrategy;

/// Per-learner preferences and lifetime counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
  pub user_id: String,
  pub review_strategy: ReviewStrategy,
  pub total_sessions_completed: u32,
}

impl UserProfile {
  /// Profile used for learners who never saved any preference.
  pub fn new(user_id: impl Into<String>) -> Self {
    Self {
      user_id: user_id.into(),
      review_strategy: ReviewStrategy::default(),
      total_sessions_completed: 0,
    }
  }
}
