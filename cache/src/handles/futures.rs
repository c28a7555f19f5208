use super::AsyncCache;
use crate::backend::AsyncKvBackend;
use crate::config::CacheConfig;
use crate::key;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::model::ChordSheet;
use crate::shared::{CacheStats, Lookup, TierChange, WriteOptions};

use serde::de::DeserializeOwned;
use serde::Serialize;

// Each method mirrors its counterpart on `Cache`; see there for semantics.
impl<T, B> AsyncCache<T, B>
where
  T: Serialize + DeserializeOwned + Send,
  B: AsyncKvBackend,
{
  pub fn config(&self) -> &CacheConfig {
    &self.inner.shared.config
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.inner.shared.metrics.snapshot()
  }

  pub async fn set(&self, parts: (&str, &str), payload: T, options: WriteOptions) {
    let shared = &self.inner.shared;
    let Some(key) = shared.canonical_key(parts, "set") else {
      return;
    };
    if !shared.accepts_payload(&key, &payload) {
      return;
    }

    let _guard = self.inner.op_lock.lock().await;
    let mut collection = self.inner.store.load_async().await;
    shared.apply_set(&mut collection, key, payload, options);
    self.inner.store.save_async(&collection).await;
  }

  pub async fn get(&self, parts: (&str, &str)) -> Option<T> {
    let shared = &self.inner.shared;
    let Some(key) = shared.canonical_key(parts, "get") else {
      Metrics::record(&shared.metrics.misses, 1);
      return None;
    };

    let _guard = self.inner.op_lock.lock().await;
    let mut collection = self.inner.store.load_async().await;
    match shared.apply_get(&mut collection, &key) {
      Lookup::Miss => None,
      Lookup::Expired => {
        self.inner.store.save_async(&collection).await;
        None
      }
      Lookup::Hit(index) => {
        self.inner.store.save_async(&collection).await;
        Some(collection.take_payload(index))
      }
    }
  }

  pub async fn set_retained_status(&self, parts: (&str, &str), retained: bool) -> bool {
    let shared = &self.inner.shared;
    let Some(key) = shared.canonical_key(parts, "set_retained_status") else {
      return false;
    };

    let _guard = self.inner.op_lock.lock().await;
    let mut collection = self.inner.store.load_async().await;
    let changed = match shared.apply_set_retained(&mut collection, &key, retained) {
      TierChange::Absent => return false,
      TierChange::Expired => false,
      TierChange::Changed => true,
    };
    self.inner.store.save_async(&collection).await;
    changed
  }

  pub async fn is_retained(&self, parts: (&str, &str)) -> bool {
    let shared = &self.inner.shared;
    let Some(key) = shared.canonical_key(parts, "is_retained") else {
      return false;
    };

    let _guard = self.inner.op_lock.lock().await;
    let collection = self.inner.store.load_async().await;
    shared
      .peek(&collection, &key)
      .is_some_and(|entry| entry.retained)
  }

  pub async fn is_cached(&self, parts: (&str, &str)) -> bool {
    let shared = &self.inner.shared;
    let Some(key) = shared.canonical_key(parts, "is_cached") else {
      return false;
    };

    let _guard = self.inner.op_lock.lock().await;
    let collection = self.inner.store.load_async().await;
    shared.peek(&collection, &key).is_some()
  }

  pub async fn list_retained(&self) -> Vec<T> {
    let _guard = self.inner.op_lock.lock().await;
    let collection = self.inner.store.load_async().await;
    self
      .inner
      .shared
      .live_retained(collection)
      .into_iter()
      .map(|entry| entry.payload)
      .collect()
  }

  pub async fn retained_keys(&self) -> Vec<(String, String)> {
    let _guard = self.inner.op_lock.lock().await;
    let collection = self.inner.store.load_async().await;
    self
      .inner
      .shared
      .live_retained(collection)
      .iter()
      .filter_map(|entry| key::split_key(&entry.key))
      .collect()
  }

  pub async fn remove(&self, parts: (&str, &str)) -> bool {
    let shared = &self.inner.shared;
    let Some(key) = shared.canonical_key(parts, "remove") else {
      return false;
    };

    let _guard = self.inner.op_lock.lock().await;
    let mut collection = self.inner.store.load_async().await;
    let removed = shared.apply_remove(&mut collection, &key);
    if removed {
      self.inner.store.save_async(&collection).await;
    }
    removed
  }

  pub async fn clear_expired(&self) -> usize {
    let _guard = self.inner.op_lock.lock().await;
    let mut collection = self.inner.store.load_async().await;
    let removed = self.inner.shared.apply_clear_expired(&mut collection);
    if removed > 0 {
      self.inner.store.save_async(&collection).await;
    }
    removed
  }

  pub async fn clear_all(&self) {
    let _guard = self.inner.op_lock.lock().await;
    self.inner.store.clear_async().await;
  }

  pub async fn stats(&self) -> CacheStats {
    let _guard = self.inner.op_lock.lock().await;
    let collection = self.inner.store.load_async().await;
    self.inner.shared.stats(&collection)
  }
}

impl<B: AsyncKvBackend> AsyncCache<ChordSheet, B> {
  pub async fn put_sheet(&self, sheet: ChordSheet, options: WriteOptions) {
    let (artist, title) = {
      let (artist, title) = sheet.key_parts();
      (artist.to_owned(), title.to_owned())
    };
    self.set((artist.as_str(), title.as_str()), sheet, options).await;
  }
}
