use serde::{Deserialize, Serialize};

/// Byte length of an empty serialized collection, `{"entries":[]}`.
pub(crate) const ENVELOPE_BYTES: u64 = 14;

/// A cached payload together with its access-tracking metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
  /// The canonical key. Unique within a collection.
  pub key: String,
  /// The cached domain object.
  pub payload: T,
  /// Last write or last access, in epoch milliseconds.
  #[serde(default)]
  pub timestamp: i64,
  /// Starts at 1 on first write; bumped on every read hit and every re-write.
  #[serde(default = "first_access")]
  pub access_count: u64,
  /// Retained-tier flag.
  #[serde(default)]
  pub retained: bool,
}

fn first_access() -> u64 {
  1
}

impl<T> CacheEntry<T> {
  pub(crate) fn new(key: String, payload: T, timestamp: i64, retained: bool) -> Self {
    Self {
      key,
      payload,
      timestamp,
      access_count: 1,
      retained,
    }
  }

  /// Records a read hit or a re-write at `now`.
  #[inline]
  pub(crate) fn touch(&mut self, now: i64) {
    self.access_count = self.access_count.saturating_add(1);
    self.timestamp = now;
  }
}

impl<T: Serialize> CacheEntry<T> {
  /// Exact byte length of this entry in the compact JSON blob.
  ///
  /// A payload that cannot be serialized is counted as zero; such an entry
  /// will fail the subsequent save anyway.
  pub(crate) fn serialized_len(&self) -> u64 {
    serde_json::to_vec(self).map_or(0, |bytes| bytes.len() as u64)
  }
}

/// Every entry stored under one storage key.
///
/// Order carries no meaning. At most one entry exists per canonical key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheCollection<T> {
  pub entries: Vec<CacheEntry<T>>,
}

impl<T> Default for CacheCollection<T> {
  fn default() -> Self {
    Self {
      entries: Vec::new(),
    }
  }
}

impl<T> CacheCollection<T> {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &CacheEntry<T>> {
    self.entries.iter()
  }

  pub(crate) fn position(&self, key: &str) -> Option<usize> {
    self.entries.iter().position(|e| e.key == key)
  }

  pub fn get(&self, key: &str) -> Option<&CacheEntry<T>> {
    self.entries.iter().find(|e| e.key == key)
  }

  pub(crate) fn remove(&mut self, key: &str) -> Option<CacheEntry<T>> {
    let index = self.position(key)?;
    Some(self.entries.swap_remove(index))
  }

  /// Moves the payload at `index` out of the collection.
  pub(crate) fn take_payload(mut self, index: usize) -> T {
    self.entries.swap_remove(index).payload
  }
}

impl<T: Serialize> CacheCollection<T> {
  /// Exact byte length of the compact JSON blob for this collection.
  pub fn estimated_size_bytes(&self) -> u64 {
    blob_size(self.entries.iter().map(CacheEntry::serialized_len))
  }
}

/// Size of a blob holding entries of the given serialized lengths:
/// the envelope, each entry, and the commas between them.
pub(crate) fn blob_size(entry_lens: impl Iterator<Item = u64>) -> u64 {
  let (count, sum) = entry_lens.fold((0u64, 0u64), |(n, s), len| (n + 1, s + len));
  ENVELOPE_BYTES + sum + count.saturating_sub(1)
}
