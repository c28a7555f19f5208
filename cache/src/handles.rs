mod sync;
#[cfg(feature = "tokio")]
mod futures;

pub use sync::ChordSheetCache;

use crate::backend::MemoryBackend;
use crate::shared::CacheShared;
use crate::store::PersistentStore;

use std::fmt;
use std::sync::Arc;

/// A persistent cache over a synchronous [`KvBackend`](crate::backend::KvBackend).
///
/// Every operation loads the whole collection, mutates it and saves it back
/// while holding a per-handle lock, so operations on clones of one handle are
/// atomic with respect to each other, across threads.
///
/// `T` must serialize to a JSON object (a struct or a map). Writes of any
/// other payload are rejected and counted in
/// [`MetricsSnapshot::rejected_payloads`](crate::metrics::MetricsSnapshot::rejected_payloads).
pub struct Cache<T, B = MemoryBackend> {
  pub(crate) inner: Arc<SyncInner<T, B>>,
}

pub(crate) struct SyncInner<T, B> {
  pub(crate) shared: CacheShared,
  pub(crate) store: PersistentStore<T, B>,
  pub(crate) op_lock: parking_lot::Mutex<()>,
}

impl<T, B> Clone for Cache<T, B> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<T, B> fmt::Debug for Cache<T, B> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Cache")
      .field("shared", &self.inner.shared)
      .field("store", &self.inner.store)
      .finish()
  }
}

/// A persistent cache over an [`AsyncKvBackend`](crate::backend::AsyncKvBackend).
///
/// Operations are queued behind a single async lock that is held across the
/// awaited load and save, so two in-flight operations can never interleave
/// and lose each other's writes.
#[cfg(feature = "tokio")]
pub struct AsyncCache<T, B = MemoryBackend> {
  pub(crate) inner: Arc<AsyncInner<T, B>>,
}

#[cfg(feature = "tokio")]
pub(crate) struct AsyncInner<T, B> {
  pub(crate) shared: CacheShared,
  pub(crate) store: PersistentStore<T, B>,
  pub(crate) op_lock: tokio::sync::Mutex<()>,
}

#[cfg(feature = "tokio")]
impl<T, B> Clone for AsyncCache<T, B> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

#[cfg(feature = "tokio")]
impl<T, B> fmt::Debug for AsyncCache<T, B> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AsyncCache")
      .field("shared", &self.inner.shared)
      .field("store", &self.inner.store)
      .finish()
  }
}
