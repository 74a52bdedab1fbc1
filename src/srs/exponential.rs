/// Exponential interval in days: `2^streak` after a correct answer, one day
/// after a wrong one. Only the current streak is considered.
pub fn exponential_interval_days(new_streak: u32, correct: bool) -> i64 {
  if correct {
    2_i64.saturating_pow(new_streak)
  } else {
    1
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_doubles_with_streak() {
    assert_eq!(exponential_interval_days(1, true), 2);
    assert_eq!(exponential_interval_days(2, true), 4);
    assert_eq!(exponential_interval_days(3, true), 8);
  }

  #[test]
  fn test_wrong_answer_is_one_day() {
    assert_eq!(exponential_interval_days(0, false), 1);
  }

  #[test]
  fn test_huge_streak_saturates() {
    assert_eq!(exponential_interval_days(200, true), i64::MAX);
  }
}
