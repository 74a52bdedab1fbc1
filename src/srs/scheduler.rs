//! Next-review computation.
//!
//! Pure functions: the strategy is passed in by the caller, so nothing here
//! touches a store or the clock.

use chrono::{DateTime, Duration, Utc};

use super::exponential::exponential_interval_days;
use super::sm2::sm2_interval_days;
use crate::config::LATEST_REVIEW_TIMESTAMP;
use crate::domain::{ProgressRecord, ReviewStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleResult {
  pub interval_days: i64,
  pub next_review: DateTime<Utc>,
}

/// Compute the interval and due date for a word that was just answered.
///
/// `previous` is the record as it was before this answer (None for a first
/// encounter) and `new_streak` is the streak after it.
pub fn schedule(
  previous: Option<&ProgressRecord>,
  new_streak: u32,
  correct: bool,
  strategy: ReviewStrategy,
  now: DateTime<Utc>,
) -> ScheduleResult {
  let raw = match strategy {
    ReviewStrategy::Sm2 => sm2_interval_days(previous, new_streak, correct),
    ReviewStrategy::Exponential => exponential_interval_days(new_streak, correct),
  };
  // Only the calendar limit bounds the interval
  let latest = latest_review();
  let interval_days = raw.clamp(1, (latest - now).num_days().max(1));
  let next_review = Duration::try_days(interval_days)
    .and_then(|d| now.checked_add_signed(d))
    .map_or(latest, |next| next.min(latest));

  ScheduleResult {
    interval_days,
    next_review,
  }
}

/// Latest date a review can be scheduled for
pub fn latest_review() -> DateTime<Utc> {
  DateTime::from_timestamp(LATEST_REVIEW_TIMESTAMP, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub fn compute_next_review(
  previous: Option<&ProgressRecord>,
  new_streak: u32,
  correct: bool,
  strategy: ReviewStrategy,
  now: DateTime<Utc>,
) -> DateTime<Utc> {
  schedule(previous, new_streak, correct, strategy, now).next_review
}
