mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{builder, harness, harness_with, numbered, sheet, REGULAR_TTL, START};
use fibre_chordcache::{ManualClock, MemoryBackend, TierConfig, WriteOptions};

#[test]
fn test_sync_regular_entry_expires_on_read() {
  let h = harness();
  let parts = ("Nirvana", "Lithium");
  h.cache.set(parts, sheet(parts.0, parts.1), WriteOptions::default());

  h.clock.advance(REGULAR_TTL);
  assert!(h.cache.get(parts).is_some(), "an entry exactly at its horizon is still fresh");

  h.clock.advance(REGULAR_TTL + Duration::from_millis(1));
  assert_eq!(h.cache.get(parts), None);
  assert!(h.persisted().is_empty(), "a stale entry is removed by the read that finds it");

  let metrics = h.cache.metrics();
  assert_eq!(metrics.evicted_by_expiry, 1);
  assert_eq!(metrics.misses, 1);
}

#[test]
fn test_sync_retained_entry_never_expires() {
  let h = harness();
  h.cache.set(("Eagles", "Hotel California"), sheet("Eagles", "Hotel California"), WriteOptions::retained());
  h.cache.set(("Nirvana", "Lithium"), sheet("Nirvana", "Lithium"), WriteOptions::default());

  h.clock.advance(Duration::from_secs(10 * 365 * 24 * 60 * 60));

  assert_eq!(h.cache.clear_expired(), 1);
  assert!(h.cache.is_cached(("Eagles", "Hotel California")));
  assert!(!h.cache.is_cached(("Nirvana", "Lithium")));
  assert_eq!(h.cache.stats().total_items, 1);
}

#[test]
fn test_sync_retained_tier_with_finite_horizon() {
  let h = harness_with(|b| b.retained_tier(500, Duration::from_secs(24 * 60 * 60)));
  let parts = ("Eagles", "Hotel California");
  h.cache.set(parts, sheet(parts.0, parts.1), WriteOptions::retained());

  h.clock.advance(Duration::from_secs(2 * 60 * 60));
  assert!(h.cache.is_retained(parts), "the regular horizon does not apply to retained entries");

  h.clock.advance(Duration::from_secs(23 * 60 * 60));
  assert!(!h.cache.is_retained(parts));
  assert!(h.cache.list_retained().is_empty());
}

#[test]
fn test_sync_predicates_report_stale_entries_without_removing_them() {
  let h = harness();
  let parts = ("Nirvana", "Lithium");
  h.cache.set(parts, sheet(parts.0, parts.1), WriteOptions::default());
  h.clock.advance(REGULAR_TTL * 2);

  assert!(!h.cache.is_cached(parts));
  assert!(!h.cache.is_retained(parts));

  let stats = h.cache.stats();
  assert_eq!(stats.total_items, 1);
  assert_eq!(stats.expired_items, 1);
  assert_eq!(h.persisted().len(), 1);
}

#[test]
fn test_sync_clear_expired_reports_zero_when_nothing_is_stale() {
  let h = harness();
  for i in 0..5 {
    h.cache.set((&*format!("Artist {i}"), &*format!("Song {i}")), numbered(i), WriteOptions::default());
  }
  assert_eq!(h.cache.clear_expired(), 0);
  assert_eq!(h.cache.stats().total_items, 5);
}

#[test]
fn test_sync_set_retained_on_stale_entry_removes_it() {
  let h = harness();
  let parts = ("Nirvana", "Lithium");
  h.cache.set(parts, sheet(parts.0, parts.1), WriteOptions::default());
  h.clock.advance(REGULAR_TTL * 2);

  assert!(!h.cache.set_retained_status(parts, true));
  assert!(h.persisted().is_empty());
}

#[test]
fn test_sync_demotion_restarts_the_regular_horizon() {
  let h = harness();
  let parts = ("Eagles", "Hotel California");
  h.cache.set(parts, sheet(parts.0, parts.1), WriteOptions::retained());

  // Retained for a long time, then demoted: the regular horizon counts
  // from the demotion, not from the first write.
  h.clock.advance(REGULAR_TTL * 10);
  assert!(h.cache.set_retained_status(parts, false));
  h.clock.advance(REGULAR_TTL / 2);
  assert!(h.cache.is_cached(parts));

  h.clock.advance(REGULAR_TTL);
  assert!(!h.cache.is_cached(parts));
}

#[test]
fn test_sync_sweep_on_build_purges_stale_entries() {
  let backend = Arc::new(MemoryBackend::new());
  let clock = Arc::new(ManualClock::new(START));

  let first = builder(Arc::clone(&backend), Arc::clone(&clock)).build().unwrap();
  first.set(("Nirvana", "Lithium"), sheet("Nirvana", "Lithium"), WriteOptions::default());
  first.set(("Eagles", "Hotel California"), sheet("Eagles", "Hotel California"), WriteOptions::retained());
  clock.advance(REGULAR_TTL * 3);

  let second = builder(Arc::clone(&backend), Arc::clone(&clock))
    .sweep_on_build(true)
    .build()
    .unwrap();

  let stats = second.stats();
  assert_eq!(stats.total_items, 1);
  assert_eq!(stats.expired_items, 0);
  assert_eq!(second.metrics().evicted_by_expiry, 1);
}

#[test]
fn test_sync_never_horizon_config_is_reported() {
  let h = harness();
  assert!(h.cache.config().retained.never_expires());
  assert_eq!(h.cache.config().retained.horizon, TierConfig::NEVER);
  assert_eq!(h.cache.config().regular.horizon, REGULAR_TTL);
}
