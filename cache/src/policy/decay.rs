use super::{EvictionScorer, ScoreContext, ScoreInput};
use crate::time;

/// Weighs access frequency against a bounded, linearly decaying recency term:
///
/// `access_count * frequency_weight + (1 - min(age / window, 1)) * recency_weight`
///
/// A freshly touched entry gets the full recency weight; an entry as old as
/// the tier's horizon gets none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeDecayScorer {
  pub frequency_weight: f64,
  pub recency_weight: f64,
}

impl Default for AgeDecayScorer {
  fn default() -> Self {
    Self {
      frequency_weight: 0.7,
      recency_weight: 0.3,
    }
  }
}

impl AgeDecayScorer {
  pub fn new(frequency_weight: f64, recency_weight: f64) -> Self {
    Self {
      frequency_weight,
      recency_weight,
    }
  }

  /// Recency in `[0, 1]`.
  pub fn freshness(input: &ScoreInput, ctx: &ScoreContext) -> f64 {
    let age = time::age_millis(ctx.now, input.timestamp) as f64;
    let window = ctx.recency_window.as_millis() as f64;
    if window <= 0.0 {
      return if age == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - (age / window).min(1.0)
  }
}

impl EvictionScorer for AgeDecayScorer {
  fn score(&self, input: &ScoreInput, ctx: &ScoreContext) -> f64 {
    input.access_count as f64 * self.frequency_weight
      + Self::freshness(input, ctx) * self.recency_weight
  }
}
