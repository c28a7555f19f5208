use crate::config::CacheConfig;
use crate::entry::{CacheCollection, CacheEntry};
use crate::key::{self, CanonicalKey};
use crate::metrics::Metrics;
use crate::policy::eviction::{self, EvictionReport};
use crate::policy::{expiration, EvictionScorer};
use crate::time::Clock;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace, warn};

/// How a write treats the entry's tier flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
  /// `Some(flag)` sets the tier explicitly. `None` keeps the existing entry's
  /// tier, or the regular tier for a new entry.
  pub retained: Option<bool>,
}

impl WriteOptions {
  /// Write into the retained tier.
  pub fn retained() -> Self {
    Self {
      retained: Some(true),
    }
  }

  /// Write into the regular tier, demoting an existing retained entry.
  pub fn regular() -> Self {
    Self {
      retained: Some(false),
    }
  }

  /// Keep whatever tier the entry already has.
  pub fn preserve() -> Self {
    Self::default()
  }
}

/// A diagnostic summary of a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
  pub total_items: usize,
  pub retained_items: usize,
  pub default_items: usize,
  /// Entries past their horizon that have not been swept yet.
  pub expired_items: usize,
  pub estimated_size_bytes: u64,
}

/// The outcome of looking a key up for a read.
pub(crate) enum Lookup {
  /// Nothing stored; no write needed.
  Miss,
  /// The entry was stale and has been removed; the collection must be saved.
  Expired,
  /// Fresh entry at this index, already touched; the collection must be saved.
  Hit(usize),
}

/// The outcome of a tier change.
pub(crate) enum TierChange {
  Absent,
  /// The entry was stale and has been removed; the collection must be saved.
  Expired,
  Changed,
}

/// Everything about a cache except where its collection lives. Both handle
/// flavours run their load → mutate → save cycles through these methods.
pub(crate) struct CacheShared {
  pub(crate) config: CacheConfig,
  pub(crate) clock: Arc<dyn Clock>,
  pub(crate) scorer: Arc<dyn EvictionScorer>,
  pub(crate) metrics: Arc<Metrics>,
}

impl fmt::Debug for CacheShared {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheShared")
      .field("config", &self.config)
      .field("scorer", &self.scorer)
      .field("metrics", &self.metrics.snapshot())
      .finish_non_exhaustive()
  }
}

impl CacheShared {
  #[inline]
  pub(crate) fn now(&self) -> i64 {
    self.clock.now_millis()
  }

  /// Normalizes a key pair, logging and counting a rejection.
  pub(crate) fn canonical_key(&self, parts: (&str, &str), operation: &'static str) -> Option<CanonicalKey> {
    match key::normalize(parts.0, parts.1) {
      Ok(key) => Some(key),
      Err(e) => {
        Metrics::record(&self.metrics.invalid_keys, 1);
        warn!(
          storage_key = %self.config.storage_key,
          operation,
          primary = parts.0,
          secondary = parts.1,
          error = %e,
          "Rejected cache key."
        );
        None
      }
    }
  }

  /// Payloads are persisted as JSON objects and entries holding anything else
  /// are dropped on load, so such a write could never be read back. Logs and
  /// counts a rejection.
  pub(crate) fn accepts_payload<T: Serialize>(&self, key: &CanonicalKey, payload: &T) -> bool {
    let reason = match serde_json::to_value(payload) {
      Ok(Value::Object(_)) => return true,
      Ok(_) => "payload does not serialize to a JSON object".to_string(),
      Err(e) => e.to_string(),
    };
    Metrics::record(&self.metrics.rejected_payloads, 1);
    warn!(storage_key = %self.config.storage_key, key = %key, reason, "Rejected cache payload.");
    false
  }

  pub(crate) fn apply_set<T: Serialize>(
    &self,
    collection: &mut CacheCollection<T>,
    key: CanonicalKey,
    payload: T,
    options: WriteOptions,
  ) -> EvictionReport {
    let now = self.now();

    match collection.position(key.as_str()) {
      Some(index) => {
        let entry = &mut collection.entries[index];
        entry.payload = payload;
        if let Some(retained) = options.retained {
          entry.retained = retained;
        }
        entry.touch(now);
        Metrics::record(&self.metrics.updates, 1);
      }
      None => {
        let retained = options.retained.unwrap_or(false);
        collection
          .entries
          .push(CacheEntry::new(key.as_str().to_string(), payload, now, retained));
        Metrics::record(&self.metrics.inserts, 1);
      }
    }

    let report = self.enforce(collection, now);
    if report.evicted_key(key.as_str()) {
      debug!(storage_key = %self.config.storage_key, key = %key, "Written entry scored lowest and was evicted.");
    }
    report
  }

  pub(crate) fn apply_get<T>(&self, collection: &mut CacheCollection<T>, key: &CanonicalKey) -> Lookup {
    let now = self.now();
    let Some(index) = collection.position(key.as_str()) else {
      Metrics::record(&self.metrics.misses, 1);
      trace!(storage_key = %self.config.storage_key, key = %key, "Cache miss.");
      return Lookup::Miss;
    };

    if expiration::is_expired(&collection.entries[index], &self.config, now) {
      collection.entries.swap_remove(index);
      Metrics::record(&self.metrics.misses, 1);
      Metrics::record(&self.metrics.evicted_by_expiry, 1);
      debug!(storage_key = %self.config.storage_key, key = %key, "Cache entry expired on read.");
      return Lookup::Expired;
    }

    collection.entries[index].touch(now);
    Metrics::record(&self.metrics.hits, 1);
    trace!(storage_key = %self.config.storage_key, key = %key, "Cache hit.");
    Lookup::Hit(index)
  }

  pub(crate) fn apply_set_retained<T: Serialize>(
    &self,
    collection: &mut CacheCollection<T>,
    key: &CanonicalKey,
    retained: bool,
  ) -> TierChange {
    let now = self.now();
    let Some(index) = collection.position(key.as_str()) else {
      return TierChange::Absent;
    };

    if expiration::is_expired(&collection.entries[index], &self.config, now) {
      collection.entries.swap_remove(index);
      Metrics::record(&self.metrics.evicted_by_expiry, 1);
      return TierChange::Expired;
    }

    let entry = &mut collection.entries[index];
    entry.retained = retained;
    entry.timestamp = now;
    debug!(
      storage_key = %self.config.storage_key,
      key = %key,
      retained,
      expires_at = ?expiration::expires_at(entry, &self.config),
      "Changed cache entry tier."
    );

    self.enforce(collection, now);
    TierChange::Changed
  }

  pub(crate) fn apply_remove<T>(&self, collection: &mut CacheCollection<T>, key: &CanonicalKey) -> bool {
    let removed = collection.remove(key.as_str()).is_some();
    if removed {
      Metrics::record(&self.metrics.removals, 1);
    }
    removed
  }

  pub(crate) fn apply_clear_expired<T>(&self, collection: &mut CacheCollection<T>) -> usize {
    let removed = expiration::sweep_in_place(collection, &self.config, self.now());
    Metrics::record(&self.metrics.evicted_by_expiry, removed);
    if removed > 0 {
      debug!(storage_key = %self.config.storage_key, removed, "Swept expired cache entries.");
    }
    removed
  }

  /// The entry for `key` if present and fresh. Never mutates.
  pub(crate) fn peek<'a, T>(
    &self,
    collection: &'a CacheCollection<T>,
    key: &CanonicalKey,
  ) -> Option<&'a CacheEntry<T>> {
    let now = self.now();
    collection
      .get(key.as_str())
      .filter(|entry| !expiration::is_expired(entry, &self.config, now))
  }

  /// Fresh retained entries, newest first, more-used first on ties.
  pub(crate) fn live_retained<T>(&self, collection: CacheCollection<T>) -> Vec<CacheEntry<T>> {
    let now = self.now();
    let mut retained: Vec<CacheEntry<T>> = collection
      .entries
      .into_iter()
      .filter(|e| e.retained && !expiration::is_expired(e, &self.config, now))
      .collect();
    retained.sort_by(|a, b| {
      b.timestamp
        .cmp(&a.timestamp)
        .then(b.access_count.cmp(&a.access_count))
    });
    retained
  }

  pub(crate) fn stats<T: Serialize>(&self, collection: &CacheCollection<T>) -> CacheStats {
    let now = self.now();
    let retained_items = collection.iter().filter(|e| e.retained).count();
    CacheStats {
      total_items: collection.len(),
      retained_items,
      default_items: collection.len() - retained_items,
      expired_items: collection
        .iter()
        .filter(|e| expiration::is_expired(e, &self.config, now))
        .count(),
      estimated_size_bytes: collection.estimated_size_bytes(),
    }
  }

  fn enforce<T: Serialize>(&self, collection: &mut CacheCollection<T>, now: i64) -> EvictionReport {
    let report = eviction::enforce(collection, &self.config, now, self.scorer.as_ref());
    Metrics::record(&self.metrics.evicted_by_capacity, report.by_capacity);
    Metrics::record(&self.metrics.evicted_by_size, report.by_size);
    report
  }
}
