use std::fmt;
use std::io;

use thiserror::Error;

/// Errors that can occur when building a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
  /// The regular tier was configured with a maximum of zero items, which
  /// would make every ephemeral write evict itself.
  ZeroCapacity,
  /// The storage key naming the persisted blob is empty.
  EmptyStorageKey,
  /// A byte-size ceiling of zero was configured. Use `None` to disable it.
  ZeroSizeLimit,
  /// The size prune ratio must lie in `(0, 1]`.
  InvalidPruneRatio,
}

impl fmt::Display for BuildError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildError::ZeroCapacity => write!(f, "regular tier capacity cannot be zero"),
      BuildError::EmptyStorageKey => write!(f, "storage key cannot be empty"),
      BuildError::ZeroSizeLimit => write!(
        f,
        "size ceiling cannot be zero; leave it unset to disable size pruning"
      ),
      BuildError::InvalidPruneRatio => write!(f, "size prune ratio must be within (0, 1]"),
    }
  }
}

impl std::error::Error for BuildError {}

/// Errors raised while reading a cache configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Failed to read configuration file: {0}")]
  Read(#[from] io::Error),

  #[error("Failed to parse configuration: {0}")]
  Parse(String),

  #[error("Invalid configuration value for '{field}': {message}")]
  InvalidValue { field: String, message: String },

  #[error("Configuration rejected: {0}")]
  Rejected(#[from] BuildError),
}

/// Failures reported by a key-value backend.
#[derive(Debug, Error)]
pub enum BackendError {
  /// The medium refused the write because it would exceed its capacity.
  #[error("storage quota exceeded: writing {attempted} bytes would exceed the {quota} byte quota")]
  QuotaExceeded { attempted: u64, quota: u64 },

  #[error("backend I/O failure: {0}")]
  Io(#[from] io::Error),

  #[error("backend unavailable: {0}")]
  Unavailable(String),
}

/// The reason a pair of key components could not be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyError {
  #[error("primary key component is empty")]
  EmptyPrimary,

  #[error("secondary key component is empty")]
  EmptySecondary,
}
