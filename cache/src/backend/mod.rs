//! The key-value media a cache collection can be persisted to.
//!
//! A backend stores opaque string blobs under string storage keys. It knows
//! nothing about entries, tiers or expiration; the whole collection for one
//! logical cache is a single blob.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use crate::error::BackendError;

#[cfg(feature = "tokio")]
use futures_util::future::{self, BoxFuture};

/// A synchronous key-value medium.
pub trait KvBackend: Send + Sync {
  /// Returns the blob stored under `key`, or `None` if there is none.
  fn read(&self, key: &str) -> Result<Option<String>, BackendError>;

  /// Replaces the blob stored under `key`.
  fn write(&self, key: &str, value: &str) -> Result<(), BackendError>;

  /// Deletes the blob stored under `key`. Deleting a missing key succeeds.
  fn delete(&self, key: &str) -> Result<(), BackendError>;
}

impl<B: KvBackend + ?Sized> KvBackend for std::sync::Arc<B> {
  fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
    (**self).read(key)
  }

  fn write(&self, key: &str, value: &str) -> Result<(), BackendError> {
    (**self).write(key, value)
  }

  fn delete(&self, key: &str) -> Result<(), BackendError> {
    (**self).delete(key)
  }
}

/// An asynchronous key-value medium.
///
/// Every synchronous [`KvBackend`] is also an `AsyncKvBackend` whose futures
/// complete immediately.
#[cfg(feature = "tokio")]
pub trait AsyncKvBackend: Send + Sync {
  fn read<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, BackendError>>;

  fn write<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), BackendError>>;

  fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), BackendError>>;
}

#[cfg(feature = "tokio")]
impl<B: KvBackend> AsyncKvBackend for B {
  fn read<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, BackendError>> {
    Box::pin(future::ready(KvBackend::read(self, key)))
  }

  fn write<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), BackendError>> {
    Box::pin(future::ready(KvBackend::write(self, key, value)))
  }

  fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), BackendError>> {
    Box::pin(future::ready(KvBackend::delete(self, key)))
  }
}
