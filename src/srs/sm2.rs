use crate::domain::ProgressRecord;

/// Multiplier applied to the previous interval from the third success on
const EASE_FACTOR: f64 = 2.5;

/// Assumed previous interval when a word reaches a long streak with no stored record
const DEFAULT_PREVIOUS_INTERVAL_DAYS: i64 = 6;

/// Simplified SM-2 interval in days.
///
/// The ease factor is fixed, so only the streak and the length of the last
/// scheduled interval matter.
pub fn sm2_interval_days(previous: Option<&ProgressRecord>, new_streak: u32, correct: bool) -> i64 {
  if !correct {
    return 1;
  }

  match new_streak {
    0 | 1 => 1,
    2 => 6,
    _ => {
      let previous_interval = previous
        .map(|p| p.scheduled_interval_days())
        .unwrap_or(DEFAULT_PREVIOUS_INTERVAL_DAYS);
      ((previous_interval as f64) * EASE_FACTOR).round().max(1.0) as i64
    }
  }
}
