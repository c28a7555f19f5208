use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_utils::CachePadded;

/// In-process counters for one cache handle. All fields are atomic so any
/// clone of the handle can record without locking.
///
/// These counters live only as long as the process; they are not persisted
/// with the collection.
#[derive(Debug)]
pub struct Metrics {
  // --- Hit/Miss Ratios ---
  pub(crate) hits: CachePadded<AtomicU64>,
  pub(crate) misses: CachePadded<AtomicU64>,

  // --- Writes ---
  pub(crate) inserts: CachePadded<AtomicU64>,
  pub(crate) updates: CachePadded<AtomicU64>,
  pub(crate) removals: CachePadded<AtomicU64>,
  pub(crate) invalid_keys: CachePadded<AtomicU64>,
  pub(crate) rejected_payloads: CachePadded<AtomicU64>,

  // --- Eviction Stats ---
  pub(crate) evicted_by_capacity: CachePadded<AtomicU64>,
  pub(crate) evicted_by_size: CachePadded<AtomicU64>,
  pub(crate) evicted_by_expiry: CachePadded<AtomicU64>,

  // --- Store Health ---
  pub(crate) store_write_failures: CachePadded<AtomicU64>,
  pub(crate) corruption_resets: CachePadded<AtomicU64>,
  pub(crate) malformed_entries_dropped: CachePadded<AtomicU64>,

  created_at: Instant,
}

impl Default for Metrics {
  fn default() -> Self {
    Self {
      hits: CachePadded::new(AtomicU64::new(0)),
      misses: CachePadded::new(AtomicU64::new(0)),
      inserts: CachePadded::new(AtomicU64::new(0)),
      updates: CachePadded::new(AtomicU64::new(0)),
      removals: CachePadded::new(AtomicU64::new(0)),
      invalid_keys: CachePadded::new(AtomicU64::new(0)),
      rejected_payloads: CachePadded::new(AtomicU64::new(0)),
      evicted_by_capacity: CachePadded::new(AtomicU64::new(0)),
      evicted_by_size: CachePadded::new(AtomicU64::new(0)),
      evicted_by_expiry: CachePadded::new(AtomicU64::new(0)),
      store_write_failures: CachePadded::new(AtomicU64::new(0)),
      corruption_resets: CachePadded::new(AtomicU64::new(0)),
      malformed_entries_dropped: CachePadded::new(AtomicU64::new(0)),
      created_at: Instant::now(),
    }
  }
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub(crate) fn record(counter: &AtomicU64, amount: usize) {
    if amount > 0 {
      counter.fetch_add(amount as u64, Ordering::Relaxed);
    }
  }

  /// Creates a point-in-time snapshot of the current metrics.
  pub(crate) fn snapshot(&self) -> MetricsSnapshot {
    let hits = self.hits.load(Ordering::Relaxed);
    let misses = self.misses.load(Ordering::Relaxed);
    let total_lookups = hits + misses;

    MetricsSnapshot {
      hits,
      misses,
      hit_ratio: if total_lookups == 0 {
        0.0
      } else {
        hits as f64 / total_lookups as f64
      },
      inserts: self.inserts.load(Ordering::Relaxed),
      updates: self.updates.load(Ordering::Relaxed),
      removals: self.removals.load(Ordering::Relaxed),
      invalid_keys: self.invalid_keys.load(Ordering::Relaxed),
      rejected_payloads: self.rejected_payloads.load(Ordering::Relaxed),
      evicted_by_capacity: self.evicted_by_capacity.load(Ordering::Relaxed),
      evicted_by_size: self.evicted_by_size.load(Ordering::Relaxed),
      evicted_by_expiry: self.evicted_by_expiry.load(Ordering::Relaxed),
      store_write_failures: self.store_write_failures.load(Ordering::Relaxed),
      corruption_resets: self.corruption_resets.load(Ordering::Relaxed),
      malformed_entries_dropped: self.malformed_entries_dropped.load(Ordering::Relaxed),
      uptime_secs: self.created_at.elapsed().as_secs(),
    }
  }
}

/// A point-in-time, public-facing snapshot of the cache's metrics.
#[derive(Clone)]
pub struct MetricsSnapshot {
  /// Lookups that returned a payload.
  pub hits: u64,
  /// Lookups that found nothing, found an expired entry, or had an invalid key.
  pub misses: u64,
  /// The cache hit ratio (hits / (hits + misses)).
  pub hit_ratio: f64,
  /// Writes that created a new entry.
  pub inserts: u64,
  /// Writes that replaced an existing entry.
  pub updates: u64,
  /// Entries removed explicitly through `remove`.
  pub removals: u64,
  /// Operations rejected because a key component was blank.
  pub invalid_keys: u64,
  /// Writes rejected because the payload does not serialize to a JSON object.
  pub rejected_payloads: u64,
  /// Entries evicted to satisfy a per-tier count ceiling.
  pub evicted_by_capacity: u64,
  /// Entries evicted to satisfy the byte-size ceiling.
  pub evicted_by_size: u64,
  /// Entries removed because their horizon had passed.
  pub evicted_by_expiry: u64,
  /// Saves the backend rejected.
  pub store_write_failures: u64,
  /// Times a corrupt blob was discarded.
  pub corruption_resets: u64,
  /// Individual entries dropped while loading.
  pub malformed_entries_dropped: u64,
  /// The number of seconds the handle has been alive.
  pub uptime_secs: u64,
}

impl fmt::Debug for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricsSnapshot")
      .field("hits", &self.hits)
      .field("misses", &self.misses)
      .field("hit_ratio", &format!("{:.2}%", self.hit_ratio * 100.0))
      .field("inserts", &self.inserts)
      .field("updates", &self.updates)
      .field("removals", &self.removals)
      .field("invalid_keys", &self.invalid_keys)
      .field("rejected_payloads", &self.rejected_payloads)
      .field("evicted_by_capacity", &self.evicted_by_capacity)
      .field("evicted_by_size", &self.evicted_by_size)
      .field("evicted_by_expiry", &self.evicted_by_expiry)
      .field("store_write_failures", &self.store_write_failures)
      .field("corruption_resets", &self.corruption_resets)
      .field("malformed_entries_dropped", &self.malformed_entries_dropped)
      .field("uptime_secs", &self.uptime_secs)
      .finish()
  }
}
