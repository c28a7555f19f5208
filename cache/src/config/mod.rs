//! Cache limits and horizons.
//!
//! A [`CacheConfig`] can be built in code (starting from a preset) or read
//! from YAML:
//!
//! ```yaml
//! storage_key: chord-sheet-cache
//! regular:
//!   max_items: 30
//!   expire_after: 7d
//! retained:
//!   max_items: 500
//!   expire_after: never
//! max_size_bytes: 4194304
//! size_prune_ratio: 0.8
//! ```
//!
//! Omitted fields take the chord-sheet preset's values. An explicit
//! `max_size_bytes: null` lifts the size ceiling.

mod raw;

pub use raw::{CacheConfigRaw, TierConfigRaw};

use crate::error::{BuildError, ConfigError};

use std::fs;
use std::path::Path;
use std::time::Duration;

/// Fraction of the size ceiling that pruning brings the blob down to.
pub const DEFAULT_SIZE_PRUNE_RATIO: f64 = 0.8;

/// Size ceiling of the chord-sheet preset (4 MiB).
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 4 * 1024 * 1024;

/// Limits for one retention tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierConfig {
  /// Most entries the tier may hold after a write.
  pub max_items: usize,
  /// How long an entry stays fresh after its last write or access.
  /// [`TierConfig::NEVER`] disables expiration.
  pub horizon: Duration,
}

impl TierConfig {
  /// The horizon meaning "never expires".
  pub const NEVER: Duration = Duration::MAX;

  pub const fn new(max_items: usize, horizon: Duration) -> Self {
    Self { max_items, horizon }
  }

  #[inline]
  pub fn never_expires(&self) -> bool {
    self.horizon == Self::NEVER
  }
}

/// Configuration of one logical cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
  /// The backend key the collection blob is stored under. Each logical cache
  /// needs its own.
  pub storage_key: String,
  /// Limits for ephemeral entries.
  pub regular: TierConfig,
  /// Limits for entries the user chose to keep.
  pub retained: TierConfig,
  /// Ceiling on the serialized collection, if any.
  pub max_size_bytes: Option<u64>,
  /// Target fraction of `max_size_bytes` after size pruning.
  pub size_prune_ratio: f64,
}

impl CacheConfig {
  /// Chord sheets: a small rolling window of recently viewed sheets plus a
  /// large, non-expiring set of saved favorites.
  pub fn chord_sheets() -> Self {
    Self {
      storage_key: "chord-sheet-cache".to_string(),
      regular: TierConfig::new(30, Duration::from_secs(7 * 24 * 60 * 60)),
      retained: TierConfig::new(500, TierConfig::NEVER),
      max_size_bytes: Some(DEFAULT_MAX_SIZE_BYTES),
      size_prune_ratio: DEFAULT_SIZE_PRUNE_RATIO,
    }
  }

  /// Search results: short-lived, never retained.
  pub fn search_results() -> Self {
    Self {
      storage_key: "search-result-cache".to_string(),
      regular: TierConfig::new(50, Duration::from_secs(60 * 60)),
      retained: TierConfig::new(0, TierConfig::NEVER),
      max_size_bytes: Some(1024 * 1024),
      size_prune_ratio: DEFAULT_SIZE_PRUNE_RATIO,
    }
  }

  pub fn storage_key(mut self, key: impl Into<String>) -> Self {
    self.storage_key = key.into();
    self
  }

  pub fn regular(mut self, max_items: usize, horizon: Duration) -> Self {
    self.regular = TierConfig::new(max_items, horizon);
    self
  }

  pub fn retained(mut self, max_items: usize, horizon: Duration) -> Self {
    self.retained = TierConfig::new(max_items, horizon);
    self
  }

  pub fn max_size_bytes(mut self, max: Option<u64>) -> Self {
    self.max_size_bytes = max;
    self
  }

  pub fn size_prune_ratio(mut self, ratio: f64) -> Self {
    self.size_prune_ratio = ratio;
    self
  }

  /// The limits that apply to an entry in the given tier.
  #[inline]
  pub fn tier(&self, retained: bool) -> &TierConfig {
    if retained {
      &self.retained
    } else {
      &self.regular
    }
  }

  /// The byte size pruning brings the blob down to, if a ceiling is set.
  pub fn size_prune_target(&self) -> Option<u64> {
    self
      .max_size_bytes
      .map(|max| (max as f64 * self.size_prune_ratio).floor() as u64)
  }

  pub(crate) fn validate(&self) -> Result<(), BuildError> {
    if self.storage_key.trim().is_empty() {
      return Err(BuildError::EmptyStorageKey);
    }
    if self.regular.max_items == 0 {
      return Err(BuildError::ZeroCapacity);
    }
    if self.max_size_bytes == Some(0) {
      return Err(BuildError::ZeroSizeLimit);
    }
    if !(self.size_prune_ratio > 0.0 && self.size_prune_ratio <= 1.0) {
      return Err(BuildError::InvalidPruneRatio);
    }
    Ok(())
  }

  /// Parses and validates a YAML configuration.
  pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
    let raw: CacheConfigRaw =
      serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
    let config = CacheConfig::try_from(raw)?;
    config.validate()?;
    Ok(config)
  }

  /// Reads, parses and validates a YAML configuration file.
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let yaml = fs::read_to_string(path)?;
    Self::from_yaml_str(&yaml)
  }
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self::chord_sheets()
  }
}
