use serde::{Deserialize, Serialize};

/// Interval growth formula used to schedule the next review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStrategy {
  /// Simplified SM-2: 1 day, 6 days, then the previous interval times 2.5
  Sm2,
  /// Interval doubles with every consecutive correct answer
  #[default]
  Exponential,
}

impl ReviewStrategy {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Sm2 => "sm2",
      Self::Exponential => "exponential",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "sm2" => Some(Self::Sm2),
      "exponential" => Some(Self::Exponential),
      _ => None,
    }
  }

  /// Parse a stored preference, falling back to exponential for anything
  /// unset or unrecognized.
  pub fn parse_lenient(value: Option<&str>) -> Self {
    match value {
      None => Self::default(),
      Some(s) => Self::from_str(s).unwrap_or_else(|| {
        tracing::warn!("Unrecognized review strategy '{}', using exponential", s);
        Self::default()
      }),
    }
  }
}
