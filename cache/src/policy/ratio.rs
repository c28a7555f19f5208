use super::{EvictionScorer, ScoreContext, ScoreInput};

/// The first-generation scoring formula, `access_count * 0.7 + (timestamp / now) * 0.3`.
///
/// The second term sits just under 0.3 for any realistic timestamp, so the
/// ranking is driven almost entirely by access count and recency only breaks
/// exact frequency ties. Prefer [`AgeDecayScorer`](super::AgeDecayScorer);
/// this is kept for collections whose eviction order must stay as it was.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestampRatioScorer;

impl EvictionScorer for TimestampRatioScorer {
  fn score(&self, input: &ScoreInput, ctx: &ScoreContext) -> f64 {
    let recency = if ctx.now > 0 {
      input.timestamp as f64 / ctx.now as f64
    } else {
      0.0
    };
    input.access_count as f64 * 0.7 + recency * 0.3
  }
}
