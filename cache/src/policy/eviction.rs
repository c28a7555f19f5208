//! Count- and size-bounded eviction.
//!
//! Two pressures are applied in order on every write:
//!
//! 1. **Per-tier count ceiling.** Regular and retained entries are ranked
//!    separately and each tier keeps its highest-scoring entries up to its own
//!    `max_items`. A retained entry is never displaced by regular entries.
//! 2. **Collection byte ceiling.** If the serialized blob is over
//!    `max_size_bytes`, the lowest-scoring entries of either tier are dropped
//!    one at a time until the blob fits within the prune target (80% of the
//!    ceiling by default) or nothing is left.

use super::{EvictionScorer, ScoreContext, ScoreInput};
use crate::config::CacheConfig;
use crate::entry::{self, CacheCollection, CacheEntry};

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

/// What an [`enforce`] pass removed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EvictionReport {
  pub by_capacity: usize,
  pub by_size: usize,
  /// Keys of every evicted entry, in eviction order.
  pub evicted: Vec<String>,
}

impl EvictionReport {
  #[inline]
  pub fn total(&self) -> usize {
    self.by_capacity + self.by_size
  }

  pub fn evicted_key(&self, key: &str) -> bool {
    self.evicted.iter().any(|k| k == key)
  }
}

/// Applies the count ceilings, then the size ceiling.
pub fn enforce<T: Serialize>(
  collection: &mut CacheCollection<T>,
  config: &CacheConfig,
  now: i64,
  scorer: &dyn EvictionScorer,
) -> EvictionReport {
  let mut report = EvictionReport::default();

  for retained in [false, true] {
    let evicted = enforce_tier_ceiling(collection, config, retained, now, scorer);
    report.by_capacity += evicted.len();
    report.evicted.extend(evicted);
  }

  if let Some(max) = config.max_size_bytes {
    let target = config.size_prune_target().unwrap_or(max);
    let evicted = enforce_size_ceiling(collection, config, max, target, now, scorer);
    report.by_size = evicted.len();
    report.evicted.extend(evicted);
  }

  if report.total() > 0 {
    debug!(
      storage_key = %config.storage_key,
      by_capacity = report.by_capacity,
      by_size = report.by_size,
      remaining = collection.len(),
      "Evicted cache entries."
    );
  }
  report
}

struct Ranked {
  index: usize,
  score: f64,
  timestamp: i64,
}

/// Lowest value first: lower score, then older, then by key.
fn cmp_ranked<T>(a: &Ranked, b: &Ranked, entries: &[CacheEntry<T>]) -> Ordering {
  a.score
    .total_cmp(&b.score)
    .then(a.timestamp.cmp(&b.timestamp))
    .then_with(|| entries[a.index].key.cmp(&entries[b.index].key))
}

fn rank<T>(
  entries: &[CacheEntry<T>],
  config: &CacheConfig,
  now: i64,
  scorer: &dyn EvictionScorer,
  include: impl Fn(&CacheEntry<T>) -> bool,
) -> Vec<Ranked> {
  let mut ranked: Vec<Ranked> = entries
    .iter()
    .enumerate()
    .filter(|(_, e)| include(e))
    .map(|(index, e)| {
      let ctx = ScoreContext::for_tier(config, e.retained, now);
      Ranked {
        index,
        score: scorer.score(&ScoreInput::from(e), &ctx),
        timestamp: e.timestamp,
      }
    })
    .collect();
  ranked.sort_by(|a, b| cmp_ranked(a, b, entries));
  ranked
}

/// Drops entries whose `doomed` flag is set, returning their keys.
fn remove_marked<T>(collection: &mut CacheCollection<T>, doomed: &[bool]) -> Vec<String> {
  let mut evicted = Vec::new();
  let mut index = 0;
  collection.entries.retain(|e| {
    let keep = !doomed[index];
    index += 1;
    if !keep {
      evicted.push(e.key.clone());
    }
    keep
  });
  evicted
}

fn enforce_tier_ceiling<T>(
  collection: &mut CacheCollection<T>,
  config: &CacheConfig,
  retained: bool,
  now: i64,
  scorer: &dyn EvictionScorer,
) -> Vec<String> {
  let max = config.tier(retained).max_items;
  let tier_len = collection.iter().filter(|e| e.retained == retained).count();
  if tier_len <= max {
    return Vec::new();
  }

  let ranked = rank(&collection.entries, config, now, scorer, |e| e.retained == retained);
  let mut doomed = vec![false; collection.len()];
  for r in ranked.iter().take(tier_len - max) {
    doomed[r.index] = true;
  }
  remove_marked(collection, &doomed)
}

fn enforce_size_ceiling<T: Serialize>(
  collection: &mut CacheCollection<T>,
  config: &CacheConfig,
  max: u64,
  target: u64,
  now: i64,
  scorer: &dyn EvictionScorer,
) -> Vec<String> {
  let lens: Vec<u64> = collection.iter().map(CacheEntry::serialized_len).collect();
  let mut size = entry::blob_size(lens.iter().copied());
  if size <= max {
    return Vec::new();
  }

  let ranked = rank(&collection.entries, config, now, scorer, |_| true);
  let mut doomed = vec![false; collection.len()];
  let mut remaining = collection.len() as u64;
  let mut payload_bytes: u64 = lens.iter().sum();

  for r in &ranked {
    if size <= target {
      break;
    }
    doomed[r.index] = true;
    remaining -= 1;
    payload_bytes -= lens[r.index];
    size = entry::ENVELOPE_BYTES + payload_bytes + remaining.saturating_sub(1);
  }

  debug!(storage_key = %config.storage_key, size_bytes = size, max, target, "Pruned cache to size ceiling.");
  remove_marked(collection, &doomed)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::TierConfig;
  use crate::policy::AgeDecayScorer;
  use std::time::Duration;

  const NOW: i64 = 1_700_000_000_000;

  fn config(regular_max: usize, retained_max: usize) -> CacheConfig {
    CacheConfig::chord_sheets()
      .regular(regular_max, Duration::from_secs(7 * 24 * 60 * 60))
      .retained(retained_max, TierConfig::NEVER)
      .max_size_bytes(None)
  }

  fn push(collection: &mut CacheCollection<String>, key: &str, ts: i64, count: u64, retained: bool) {
    let mut e = CacheEntry::new(key.to_string(), format!("payload of {key}"), ts, retained);
    e.access_count = count;
    collection.entries.push(e);
  }

  fn keys(collection: &CacheCollection<String>) -> Vec<&str> {
    let mut keys: Vec<&str> = collection.iter().map(|e| e.key.as_str()).collect();
    keys.sort_unstable();
    keys
  }

  #[test]
  fn under_ceiling_is_untouched() {
    let mut c = CacheCollection::new();
    push(&mut c, "a", NOW, 1, false);
    let report = enforce(&mut c, &config(2, 2), NOW, &AgeDecayScorer::default());
    assert_eq!(report, EvictionReport::default());
    assert_eq!(c.len(), 1);
  }

  #[test]
  fn count_ceiling_drops_lowest_scoring_of_the_tier() {
    let mut c = CacheCollection::new();
    push(&mut c, "old", NOW - 3000, 1, false);
    push(&mut c, "older_but_busy", NOW - 9000, 4, false);
    push(&mut c, "new", NOW - 1000, 1, false);

    let report = enforce(&mut c, &config(2, 2), NOW, &AgeDecayScorer::default());
    assert_eq!(report.by_capacity, 1);
    assert_eq!(report.evicted, vec!["old".to_string()]);
    assert_eq!(keys(&c), vec!["new", "older_but_busy"]);
  }

  #[test]
  fn retained_entries_only_answer_to_their_own_ceiling() {
    let mut c = CacheCollection::new();
    push(&mut c, "fav", NOW - 100_000, 1, true);
    for i in 0..5 {
      push(&mut c, &format!("r{i}"), NOW - i, 10, false);
    }

    let report = enforce(&mut c, &config(3, 1), NOW, &AgeDecayScorer::default());
    assert_eq!(report.by_capacity, 2);
    assert!(c.get("fav").is_some());
    assert_eq!(c.iter().filter(|e| !e.retained).count(), 3);
  }

  #[test]
  fn retained_ceiling_applies_within_the_tier() {
    let mut c = CacheCollection::new();
    push(&mut c, "fav_a", NOW - 2000, 1, true);
    push(&mut c, "fav_b", NOW - 1000, 1, true);
    push(&mut c, "fav_c", NOW, 1, true);

    let report = enforce(&mut c, &config(10, 2), NOW, &AgeDecayScorer::default());
    assert_eq!(report.evicted, vec!["fav_a".to_string()]);
  }

  #[test]
  fn exact_ties_evict_oldest_then_by_key() {
    let mut c = CacheCollection::new();
    push(&mut c, "b", NOW, 1, false);
    push(&mut c, "a", NOW, 1, false);
    push(&mut c, "c", NOW, 1, false);

    let report = enforce(&mut c, &config(2, 2), NOW, &AgeDecayScorer::default());
    assert_eq!(report.evicted, vec!["a".to_string()]);
  }

  #[test]
  fn size_ceiling_prunes_to_target() {
    let mut c = CacheCollection::new();
    for i in 0..20 {
      push(&mut c, &format!("key_{i:02}"), NOW - (20 - i) * 1000, 1, i % 4 == 0);
    }
    let full = c.estimated_size_bytes();
    let max = full - 1;
    let config = config(100, 100).max_size_bytes(Some(max));

    let report = enforce(&mut c, &config, NOW, &AgeDecayScorer::default());
    assert!(report.by_size > 0);
    assert_eq!(report.by_capacity, 0);
    assert!(c.estimated_size_bytes() <= config.size_prune_target().unwrap());
    // Pruning stops as soon as the target is met.
    let target = config.size_prune_target().unwrap();
    assert!(c.estimated_size_bytes() + 200 > target);
    // The oldest entry went first.
    assert_eq!(report.evicted[0], "key_00");
  }

  #[test]
  fn size_ceiling_can_empty_the_collection() {
    let mut c = CacheCollection::new();
    push(&mut c, "only", NOW, 1, false);
    let config = config(10, 10).max_size_bytes(Some(20));

    let report = enforce(&mut c, &config, NOW, &AgeDecayScorer::default());
    assert_eq!(report.by_size, 1);
    assert!(c.is_empty());
  }
}
