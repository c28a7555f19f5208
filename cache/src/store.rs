use crate::backend::KvBackend;
#[cfg(feature = "tokio")]
use crate::backend::AsyncKvBackend;
use crate::entry::{CacheCollection, CacheEntry};
use crate::metrics::Metrics;

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use ahash::{HashMap, HashMapExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Loads and saves one logical cache as a single serialized blob.
///
/// Loading never fails: a missing blob is an empty collection, a corrupt
/// blob is deleted and replaced by an empty collection, and structurally
/// invalid entries are dropped individually. Saving never fails either; a
/// rejected write is logged and counted.
pub struct PersistentStore<T, B> {
  backend: B,
  storage_key: String,
  metrics: Arc<Metrics>,
  _payload: PhantomData<fn() -> T>,
}

impl<T, B> fmt::Debug for PersistentStore<T, B> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PersistentStore")
      .field("storage_key", &self.storage_key)
      .finish_non_exhaustive()
  }
}

impl<T, B> PersistentStore<T, B>
where
  T: Serialize + DeserializeOwned,
  B: KvBackend,
{
  pub fn new(backend: B, storage_key: impl Into<String>) -> Self {
    Self::with_metrics(backend, storage_key.into(), Arc::new(Metrics::new()))
  }

  pub(crate) fn with_metrics(backend: B, storage_key: String, metrics: Arc<Metrics>) -> Self {
    Self {
      backend,
      storage_key,
      metrics,
      _payload: PhantomData,
    }
  }

  pub fn storage_key(&self) -> &str {
    &self.storage_key
  }

  pub fn backend(&self) -> &B {
    &self.backend
  }

  pub fn load(&self) -> CacheCollection<T> {
    let raw = match KvBackend::read(&self.backend, &self.storage_key) {
      Ok(Some(raw)) => raw,
      Ok(None) => return CacheCollection::new(),
      Err(e) => {
        warn!(storage_key = %self.storage_key, error = %e, "Cache blob could not be read; starting cold.");
        return CacheCollection::new();
      }
    };

    match decode(&raw) {
      Ok(decoded) => self.accept(decoded),
      Err(reason) => {
        self.report_corruption(&reason);
        if let Err(e) = KvBackend::delete(&self.backend, &self.storage_key) {
          warn!(storage_key = %self.storage_key, error = %e, "Failed to discard corrupt cache blob.");
        }
        CacheCollection::new()
      }
    }
  }

  /// Persists `collection`, returning whether the write reached the backend.
  pub fn save(&self, collection: &CacheCollection<T>) -> bool {
    let blob = match serde_json::to_string(collection) {
      Ok(blob) => blob,
      Err(e) => {
        self.report_write_failure(&e);
        return false;
      }
    };

    match KvBackend::write(&self.backend, &self.storage_key, &blob) {
      Ok(()) => true,
      Err(e) => {
        self.report_write_failure(&e);
        false
      }
    }
  }

  /// Deletes the whole blob.
  pub fn clear(&self) -> bool {
    match KvBackend::delete(&self.backend, &self.storage_key) {
      Ok(()) => true,
      Err(e) => {
        self.report_write_failure(&e);
        false
      }
    }
  }
}

#[cfg(feature = "tokio")]
impl<T, B> PersistentStore<T, B>
where
  T: Serialize + DeserializeOwned,
  B: AsyncKvBackend,
{
  pub(crate) fn new_async(backend: B, storage_key: String, metrics: Arc<Metrics>) -> Self {
    Self {
      backend,
      storage_key,
      metrics,
      _payload: PhantomData,
    }
  }

  pub(crate) async fn load_async(&self) -> CacheCollection<T> {
    let raw = match AsyncKvBackend::read(&self.backend, &self.storage_key).await {
      Ok(Some(raw)) => raw,
      Ok(None) => return CacheCollection::new(),
      Err(e) => {
        warn!(storage_key = %self.storage_key, error = %e, "Cache blob could not be read; starting cold.");
        return CacheCollection::new();
      }
    };

    match decode(&raw) {
      Ok(decoded) => self.accept(decoded),
      Err(reason) => {
        self.report_corruption(&reason);
        if let Err(e) = AsyncKvBackend::delete(&self.backend, &self.storage_key).await {
          warn!(storage_key = %self.storage_key, error = %e, "Failed to discard corrupt cache blob.");
        }
        CacheCollection::new()
      }
    }
  }

  pub(crate) async fn save_async(&self, collection: &CacheCollection<T>) -> bool {
    let blob = match serde_json::to_string(collection) {
      Ok(blob) => blob,
      Err(e) => {
        self.report_write_failure(&e);
        return false;
      }
    };

    match AsyncKvBackend::write(&self.backend, &self.storage_key, &blob).await {
      Ok(()) => true,
      Err(e) => {
        self.report_write_failure(&e);
        false
      }
    }
  }

  pub(crate) async fn clear_async(&self) -> bool {
    match AsyncKvBackend::delete(&self.backend, &self.storage_key).await {
      Ok(()) => true,
      Err(e) => {
        self.report_write_failure(&e);
        false
      }
    }
  }
}

// Bookkeeping shared by the sync and async paths.
impl<T, B> PersistentStore<T, B> {
  fn accept(&self, decoded: Decoded<T>) -> CacheCollection<T> {
    if decoded.dropped > 0 {
      self
        .metrics
        .malformed_entries_dropped
        .fetch_add(decoded.dropped as u64, Ordering::Relaxed);
      warn!(
        storage_key = %self.storage_key,
        dropped = decoded.dropped,
        kept = decoded.collection.len(),
        "Dropped malformed cache entries while loading."
      );
    }
    decoded.collection
  }

  fn report_corruption(&self, reason: &str) {
    self.metrics.corruption_resets.fetch_add(1, Ordering::Relaxed);
    warn!(storage_key = %self.storage_key, reason, "Cache blob is corrupt; resetting to an empty collection.");
  }

  fn report_write_failure(&self, error: &dyn fmt::Display) {
    self.metrics.store_write_failures.fetch_add(1, Ordering::Relaxed);
    warn!(storage_key = %self.storage_key, error = %error, "Failed to persist cache collection.");
  }
}

struct Decoded<T> {
  collection: CacheCollection<T>,
  dropped: usize,
}

/// Parses a blob, rejecting it whole if it is not `{"entries": [...]}` and
/// dropping individual entries that are malformed. When a key appears more
/// than once, the most recently touched entry wins.
fn decode<T: DeserializeOwned>(raw: &str) -> Result<Decoded<T>, String> {
  let value: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
  let Value::Object(mut root) = value else {
    return Err("blob is not a JSON object".to_string());
  };
  let Some(Value::Array(items)) = root.remove("entries") else {
    return Err("blob has no `entries` array".to_string());
  };

  let mut entries: Vec<CacheEntry<T>> = Vec::with_capacity(items.len());
  let mut index_of: HashMap<String, usize> = HashMap::with_capacity(items.len());
  let mut dropped = 0;

  for item in items {
    let entry = match decode_entry::<T>(item) {
      Ok(entry) => entry,
      Err(reason) => {
        debug!(reason = %reason, "Dropping malformed cache entry.");
        dropped += 1;
        continue;
      }
    };

    match index_of.get(&entry.key) {
      Some(&existing) => {
        dropped += 1;
        if entry.timestamp > entries[existing].timestamp {
          entries[existing] = entry;
        }
      }
      None => {
        index_of.insert(entry.key.clone(), entries.len());
        entries.push(entry);
      }
    }
  }

  Ok(Decoded {
    collection: CacheCollection { entries },
    dropped,
  })
}

fn decode_entry<T: DeserializeOwned>(item: Value) -> Result<CacheEntry<T>, String> {
  let Value::Object(fields) = item else {
    return Err("entry is not an object".to_string());
  };

  match fields.get("key") {
    Some(Value::String(key)) if !key.trim().is_empty() => {}
    _ => return Err("entry has no key".to_string()),
  }
  match fields.get("payload") {
    Some(Value::Object(_)) => {}
    Some(_) => return Err("entry payload is not an object".to_string()),
    None => return Err("entry has no payload".to_string()),
  }

  serde_json::from_value(Value::Object(fields)).map_err(|e| e.to_string())
}
