use crate::backend::{KvBackend, MemoryBackend};
#[cfg(feature = "tokio")]
use crate::backend::AsyncKvBackend;
use crate::config::{CacheConfig, TierConfig};
use crate::error::BuildError;
use crate::handles::{Cache, SyncInner};
#[cfg(feature = "tokio")]
use crate::handles::{AsyncCache, AsyncInner};
use crate::metrics::Metrics;
use crate::policy::{AgeDecayScorer, EvictionScorer};
use crate::shared::CacheShared;
use crate::store::PersistentStore;
use crate::time::{Clock, SystemClock};

use core::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A builder for creating `Cache` and `AsyncCache` instances.
///
/// Defaults: the [`CacheConfig::chord_sheets`] preset, an in-memory backend,
/// the wall clock and the [`AgeDecayScorer`].
pub struct CacheBuilder<T, B = MemoryBackend> {
  config: CacheConfig,
  backend: B,
  clock: Option<Arc<dyn Clock>>,
  scorer: Option<Arc<dyn EvictionScorer>>,
  sweep_on_build: bool,
  _payload: PhantomData<fn() -> T>,
}

// Manual Debug implementation for CacheBuilder.
impl<T, B> fmt::Debug for CacheBuilder<T, B> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheBuilder")
      .field("config", &self.config)
      .field("clock", &self.clock)
      .field("scorer", &self.scorer)
      .field("sweep_on_build", &self.sweep_on_build)
      .finish_non_exhaustive()
  }
}

// --- Default Constructor ---
impl<T> CacheBuilder<T, MemoryBackend> {
  /// Creates a new `CacheBuilder` with default settings.
  pub fn new() -> Self {
    Self::with_backend(MemoryBackend::new())
  }
}

impl<T> Default for CacheBuilder<T, MemoryBackend> {
  fn default() -> Self {
    Self::new()
  }
}

// --- General Configuration Methods ---
impl<T, B> CacheBuilder<T, B> {
  /// Creates a builder persisting to `backend`.
  pub fn with_backend(backend: B) -> Self {
    Self {
      config: CacheConfig::default(),
      backend,
      clock: None,
      scorer: None,
      sweep_on_build: false,
      _payload: PhantomData,
    }
  }

  /// Swaps the backend, keeping every other setting.
  pub fn backend<B2>(self, backend: B2) -> CacheBuilder<T, B2> {
    CacheBuilder {
      config: self.config,
      backend,
      clock: self.clock,
      scorer: self.scorer,
      sweep_on_build: self.sweep_on_build,
      _payload: PhantomData,
    }
  }

  /// Replaces the whole configuration.
  pub fn config(mut self, config: CacheConfig) -> Self {
    self.config = config;
    self
  }

  /// Sets the backend key the collection is stored under.
  pub fn storage_key(mut self, key: impl Into<String>) -> Self {
    self.config.storage_key = key.into();
    self
  }

  /// Sets the regular tier's ceiling and expiration horizon.
  pub fn regular_tier(mut self, max_items: usize, horizon: Duration) -> Self {
    self.config.regular = TierConfig::new(max_items, horizon);
    self
  }

  /// Sets the retained tier's ceiling and expiration horizon. Pass
  /// [`TierConfig::NEVER`] for entries that never expire.
  pub fn retained_tier(mut self, max_items: usize, horizon: Duration) -> Self {
    self.config.retained = TierConfig::new(max_items, horizon);
    self
  }

  /// Sets the byte-size ceiling of the serialized collection.
  pub fn max_size_bytes(mut self, max: u64) -> Self {
    self.config.max_size_bytes = Some(max);
    self
  }

  /// Disables size-based pruning.
  pub fn unbounded_size(mut self) -> Self {
    self.config.max_size_bytes = None;
    self
  }

  /// Sets the fraction of the size ceiling that pruning settles at.
  pub fn size_prune_ratio(mut self, ratio: f64) -> Self {
    self.config.size_prune_ratio = ratio;
    self
  }

  /// Sets the time source. Defaults to the wall clock.
  pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = Some(clock);
    self
  }

  /// Sets the eviction scorer. Defaults to [`AgeDecayScorer`].
  pub fn scorer<S>(mut self, scorer: S) -> Self
  where
    S: EvictionScorer + 'static,
  {
    self.scorer = Some(Arc::new(scorer));
    self
  }

  /// Sweeps expired entries once when the cache is built.
  pub fn sweep_on_build(mut self, enabled: bool) -> Self {
    self.sweep_on_build = enabled;
    self
  }

  /// Validates the configuration and assembles the parts shared by both
  /// handle flavours.
  fn into_parts(self) -> Result<(CacheShared, B, bool), BuildError> {
    self.config.validate()?;

    let shared = CacheShared {
      config: self.config,
      clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
      scorer: self
        .scorer
        .unwrap_or_else(|| Arc::new(AgeDecayScorer::default())),
      metrics: Arc::new(Metrics::new()),
    };
    Ok((shared, self.backend, self.sweep_on_build))
  }
}

// --- Build Methods ---
impl<T, B> CacheBuilder<T, B>
where
  T: Serialize + DeserializeOwned,
  B: KvBackend,
{
  /// Builds a synchronous `Cache`.
  pub fn build(self) -> Result<Cache<T, B>, BuildError> {
    let (shared, backend, sweep) = self.into_parts()?;
    let store = PersistentStore::with_metrics(
      backend,
      shared.config.storage_key.clone(),
      Arc::clone(&shared.metrics),
    );

    let cache = Cache {
      inner: Arc::new(SyncInner {
        shared,
        store,
        op_lock: parking_lot::Mutex::new(()),
      }),
    };
    if sweep {
      cache.clear_expired();
    }
    Ok(cache)
  }
}

#[cfg(feature = "tokio")]
impl<T, B> CacheBuilder<T, B>
where
  T: Serialize + DeserializeOwned + Send,
  B: AsyncKvBackend,
{
  /// Builds an asynchronous `AsyncCache`.
  ///
  /// This is `async` only so that a sweep requested with
  /// [`sweep_on_build`](Self::sweep_on_build) can run against the backend.
  pub async fn build_async(self) -> Result<AsyncCache<T, B>, BuildError> {
    let (shared, backend, sweep) = self.into_parts()?;
    let store = PersistentStore::new_async(
      backend,
      shared.config.storage_key.clone(),
      Arc::clone(&shared.metrics),
    );

    let cache = AsyncCache {
      inner: Arc::new(AsyncInner {
        shared,
        store,
        op_lock: tokio::sync::Mutex::new(()),
      }),
    };
    if sweep {
      cache.clear_expired().await;
    }
    Ok(cache)
  }
}
