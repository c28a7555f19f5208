use super::KvBackend;
use crate::error::BackendError;

use ahash::{HashMap, HashMapExt};
use parking_lot::Mutex;

/// An in-process backend, optionally bounded by a byte quota.
///
/// The quota counts the bytes of every stored key and value, the way browser
/// storage areas do, and rejects a write that would exceed it with
/// [`BackendError::QuotaExceeded`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
  blobs: Mutex<HashMap<String, String>>,
  quota: Mutex<Option<u64>>,
}

impl MemoryBackend {
  pub fn new() -> Self {
    Self {
      blobs: Mutex::new(HashMap::new()),
      quota: Mutex::new(None),
    }
  }

  /// Creates a backend that rejects writes once `quota` bytes are in use.
  pub fn with_quota(quota: u64) -> Self {
    let backend = Self::new();
    backend.set_quota(Some(quota));
    backend
  }

  pub fn set_quota(&self, quota: Option<u64>) {
    *self.quota.lock() = quota;
  }

  /// Total bytes of keys and values currently stored.
  pub fn used_bytes(&self) -> u64 {
    self
      .blobs
      .lock()
      .iter()
      .map(|(k, v)| (k.len() + v.len()) as u64)
      .sum()
  }
}

impl KvBackend for MemoryBackend {
  fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
    Ok(self.blobs.lock().get(key).cloned())
  }

  fn write(&self, key: &str, value: &str) -> Result<(), BackendError> {
    let mut blobs = self.blobs.lock();

    if let Some(quota) = *self.quota.lock() {
      let others: u64 = blobs
        .iter()
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| (k.len() + v.len()) as u64)
        .sum();
      let attempted = others + (key.len() + value.len()) as u64;
      if attempted > quota {
        return Err(BackendError::QuotaExceeded { attempted, quota });
      }
    }

    blobs.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn delete(&self, key: &str) -> Result<(), BackendError> {
    self.blobs.lock().remove(key);
    Ok(())
  }
}
