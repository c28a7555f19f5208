use super::Cache;
use crate::backend::{KvBackend, MemoryBackend};
use crate::config::CacheConfig;
use crate::key;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::model::ChordSheet;
use crate::shared::{CacheStats, Lookup, TierChange, WriteOptions};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// The chord-sheet cache, keyed by `(artist, title)`.
pub type ChordSheetCache<B = MemoryBackend> = Cache<ChordSheet, B>;

impl<T, B> Cache<T, B>
where
  T: Serialize + DeserializeOwned,
  B: KvBackend,
{
  pub fn config(&self) -> &CacheConfig {
    &self.inner.shared.config
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.inner.shared.metrics.snapshot()
  }

  /// Stores `payload` under the key derived from `parts`.
  ///
  /// An existing entry keeps its access count (plus one) and, unless
  /// `options` says otherwise, its tier. The write is followed by an
  /// eviction pass, which may remove other entries or, if it scores lowest,
  /// this one. A blank key component, or a payload that does not serialize
  /// to a JSON object, makes this a logged no-op.
  pub fn set(&self, parts: (&str, &str), payload: T, options: WriteOptions) {
    let shared = &self.inner.shared;
    let Some(key) = shared.canonical_key(parts, "set") else {
      return;
    };
    if !shared.accepts_payload(&key, &payload) {
      return;
    }

    let _guard = self.inner.op_lock.lock();
    let mut collection = self.inner.store.load();
    shared.apply_set(&mut collection, key, payload, options);
    self.inner.store.save(&collection);
  }

  /// Returns the payload for `parts`, counting the access.
  ///
  /// A stale entry is removed and reported as a miss. A blank key component
  /// is always a miss.
  pub fn get(&self, parts: (&str, &str)) -> Option<T> {
    let shared = &self.inner.shared;
    let Some(key) = shared.canonical_key(parts, "get") else {
      Metrics::record(&shared.metrics.misses, 1);
      return None;
    };

    let _guard = self.inner.op_lock.lock();
    let mut collection = self.inner.store.load();
    match shared.apply_get(&mut collection, &key) {
      Lookup::Miss => None,
      Lookup::Expired => {
        self.inner.store.save(&collection);
        None
      }
      Lookup::Hit(index) => {
        self.inner.store.save(&collection);
        Some(collection.take_payload(index))
      }
    }
  }

  /// Moves an entry between tiers. Its timestamp is refreshed so the new
  /// tier's horizon counts from now. Returns `false` if there is no fresh
  /// entry for `parts`.
  pub fn set_retained_status(&self, parts: (&str, &str), retained: bool) -> bool {
    let shared = &self.inner.shared;
    let Some(key) = shared.canonical_key(parts, "set_retained_status") else {
      return false;
    };

    let _guard = self.inner.op_lock.lock();
    let mut collection = self.inner.store.load();
    match shared.apply_set_retained(&mut collection, &key, retained) {
      TierChange::Absent => false,
      TierChange::Expired => {
        self.inner.store.save(&collection);
        false
      }
      TierChange::Changed => {
        self.inner.store.save(&collection);
        true
      }
    }
  }

  /// `true` if a fresh entry exists for `parts` and sits in the retained tier.
  pub fn is_retained(&self, parts: (&str, &str)) -> bool {
    let shared = &self.inner.shared;
    let Some(key) = shared.canonical_key(parts, "is_retained") else {
      return false;
    };

    let _guard = self.inner.op_lock.lock();
    let collection = self.inner.store.load();
    shared
      .peek(&collection, &key)
      .is_some_and(|entry| entry.retained)
  }

  /// `true` if a fresh entry exists for `parts`. Does not count as an access.
  pub fn is_cached(&self, parts: (&str, &str)) -> bool {
    let shared = &self.inner.shared;
    let Some(key) = shared.canonical_key(parts, "is_cached") else {
      return false;
    };

    let _guard = self.inner.op_lock.lock();
    let collection = self.inner.store.load();
    shared.peek(&collection, &key).is_some()
  }

  /// Fresh retained payloads, most recently touched first.
  pub fn list_retained(&self) -> Vec<T> {
    let _guard = self.inner.op_lock.lock();
    let collection = self.inner.store.load();
    self
      .inner
      .shared
      .live_retained(collection)
      .into_iter()
      .map(|entry| entry.payload)
      .collect()
  }

  /// The reconstructed `(primary, secondary)` components of every fresh
  /// retained entry, in [`list_retained`](Self::list_retained) order.
  /// Casing and accents are not recovered.
  pub fn retained_keys(&self) -> Vec<(String, String)> {
    let _guard = self.inner.op_lock.lock();
    let collection = self.inner.store.load();
    self
      .inner
      .shared
      .live_retained(collection)
      .iter()
      .filter_map(|entry| key::split_key(&entry.key))
      .collect()
  }

  /// Removes the entry for `parts`, returning whether one existed.
  pub fn remove(&self, parts: (&str, &str)) -> bool {
    let shared = &self.inner.shared;
    let Some(key) = shared.canonical_key(parts, "remove") else {
      return false;
    };

    let _guard = self.inner.op_lock.lock();
    let mut collection = self.inner.store.load();
    let removed = shared.apply_remove(&mut collection, &key);
    if removed {
      self.inner.store.save(&collection);
    }
    removed
  }

  /// Sweeps every expired entry, returning how many were removed.
  pub fn clear_expired(&self) -> usize {
    let _guard = self.inner.op_lock.lock();
    let mut collection = self.inner.store.load();
    let removed = self.inner.shared.apply_clear_expired(&mut collection);
    if removed > 0 {
      self.inner.store.save(&collection);
    }
    removed
  }

  /// Deletes the whole collection.
  pub fn clear_all(&self) {
    let _guard = self.inner.op_lock.lock();
    self.inner.store.clear();
  }

  pub fn stats(&self) -> CacheStats {
    let _guard = self.inner.op_lock.lock();
    let collection = self.inner.store.load();
    self.inner.shared.stats(&collection)
  }
}

impl<B: KvBackend> Cache<ChordSheet, B> {
  /// Stores a sheet under its own `(artist, title)`.
  pub fn put_sheet(&self, sheet: ChordSheet, options: WriteOptions) {
    let (artist, title) = {
      let (artist, title) = sheet.key_parts();
      (artist.to_owned(), title.to_owned())
    };
    self.set((artist.as_str(), title.as_str()), sheet, options);
  }
}
