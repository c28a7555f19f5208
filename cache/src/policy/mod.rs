pub mod decay;
pub mod eviction;
pub mod expiration;
pub mod ratio;

pub use decay::AgeDecayScorer;
pub use ratio::TimestampRatioScorer;

use crate::config::CacheConfig;
use crate::entry::CacheEntry;

use std::fmt::Debug;
use std::time::Duration;

/// Recency window used when neither the entry's tier nor the regular tier
/// has a finite horizon.
pub const FALLBACK_RECENCY_WINDOW: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// The metadata an eviction score is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreInput {
  pub access_count: u64,
  pub timestamp: i64,
  pub retained: bool,
}

impl<T> From<&CacheEntry<T>> for ScoreInput {
  fn from(entry: &CacheEntry<T>) -> Self {
    Self {
      access_count: entry.access_count,
      timestamp: entry.timestamp,
      retained: entry.retained,
    }
  }
}

/// The instant and scale a score is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreContext {
  /// Epoch milliseconds at eviction time.
  pub now: i64,
  /// The age at which an entry's recency contribution reaches zero.
  pub recency_window: Duration,
}

impl ScoreContext {
  /// The context for scoring an entry of the given tier.
  pub fn for_tier(config: &CacheConfig, retained: bool, now: i64) -> Self {
    let tier = config.tier(retained);
    let recency_window = if !tier.never_expires() {
      tier.horizon
    } else if !config.regular.never_expires() {
      config.regular.horizon
    } else {
      FALLBACK_RECENCY_WINDOW
    };
    Self {
      now,
      recency_window,
    }
  }
}

/// Ranks entries for eviction. Entries with the lowest score go first.
///
/// Implementations must be monotonic: a higher access count, or a more
/// recent timestamp, never lowers the score.
pub trait EvictionScorer: Debug + Send + Sync {
  fn score(&self, input: &ScoreInput, ctx: &ScoreContext) -> f64;
}
