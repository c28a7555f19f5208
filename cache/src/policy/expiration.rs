//! Age-based staleness.
//!
//! Expiration is lazy: an entry is only checked when it is read or when a
//! sweep runs. There is no background timer.

use crate::config::CacheConfig;
use crate::entry::{CacheCollection, CacheEntry};
use crate::time;

/// `true` once more than the tier's horizon has elapsed since the entry was
/// last written or read.
#[inline]
pub fn is_expired<T>(entry: &CacheEntry<T>, config: &CacheConfig, now: i64) -> bool {
  let horizon = config.tier(entry.retained).horizon;
  u128::from(time::age_millis(now, entry.timestamp)) > horizon.as_millis()
}

/// The last instant (epoch milliseconds) at which the entry is still fresh,
/// or `None` if its tier never expires.
pub fn expires_at<T>(entry: &CacheEntry<T>, config: &CacheConfig) -> Option<i64> {
  let tier = config.tier(entry.retained);
  if tier.never_expires() {
    return None;
  }
  Some(
    entry
      .timestamp
      .saturating_add(time::duration_to_millis(tier.horizon)),
  )
}

/// The result of a sweep.
#[derive(Debug)]
pub struct Sweep<T> {
  pub survivors: CacheCollection<T>,
  pub removed_count: usize,
}

/// Removes every expired entry, whatever its tier.
pub fn sweep<T>(mut collection: CacheCollection<T>, config: &CacheConfig, now: i64) -> Sweep<T> {
  let removed_count = sweep_in_place(&mut collection, config, now);
  Sweep {
    survivors: collection,
    removed_count,
  }
}

pub(crate) fn sweep_in_place<T>(collection: &mut CacheCollection<T>, config: &CacheConfig, now: i64) -> usize {
  let before = collection.len();
  collection
    .entries
    .retain(|entry| !is_expired(entry, config, now));
  before - collection.len()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::TierConfig;
  use std::time::Duration;

  const DAY_MS: i64 = 24 * 60 * 60 * 1000;

  fn config() -> CacheConfig {
    CacheConfig::chord_sheets()
      .regular(30, Duration::from_millis(DAY_MS as u64))
      .retained(500, TierConfig::NEVER)
  }

  fn entry(timestamp: i64, retained: bool) -> CacheEntry<()> {
    CacheEntry::new(format!("k-{timestamp}-{retained}"), (), timestamp, retained)
  }

  #[test]
  fn horizon_boundary_is_exclusive() {
    let config = config();
    let e = entry(0, false);
    assert!(!is_expired(&e, &config, DAY_MS));
    assert!(is_expired(&e, &config, DAY_MS + 1));
    assert_eq!(expires_at(&e, &config), Some(DAY_MS));
  }

  #[test]
  fn never_horizon_does_not_expire() {
    let config = config();
    let e = entry(0, true);
    assert!(!is_expired(&e, &config, i64::MAX));
    assert_eq!(expires_at(&e, &config), None);
  }

  #[test]
  fn finite_retained_horizon_applies_to_retained_entries() {
    let config = config().retained(10, Duration::from_millis(10 * DAY_MS as u64));
    let e = entry(0, true);
    assert!(!is_expired(&e, &config, 5 * DAY_MS));
    assert!(is_expired(&e, &config, 11 * DAY_MS));
  }

  #[test]
  fn sweep_removes_expired_of_every_tier() {
    let config = config().retained(10, Duration::from_millis(2 * DAY_MS as u64));
    let mut collection = CacheCollection::new();
    collection.entries.push(entry(0, false));
    collection.entries.push(entry(0, true));
    collection.entries.push(entry(2 * DAY_MS, false));

    let swept = sweep(collection, &config, 3 * DAY_MS);
    assert_eq!(swept.removed_count, 2);
    assert_eq!(swept.survivors.len(), 1);
    assert_eq!(swept.survivors.entries[0].timestamp, 2 * DAY_MS);
  }
}
