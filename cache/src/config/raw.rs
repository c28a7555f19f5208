use super::{CacheConfig, TierConfig, DEFAULT_MAX_SIZE_BYTES, DEFAULT_SIZE_PRUNE_RATIO};
use crate::error::ConfigError;

use std::time::Duration;

use serde::Deserialize;

/// The on-disk shape of a [`CacheConfig`]. Durations are humantime strings
/// (`"90s"`, `"7d"`, `"1h 30m"`) or `"never"`. Omitted fields mirror
/// [`CacheConfig::chord_sheets`]; `max_size_bytes: null` means no size ceiling.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CacheConfigRaw {
  pub storage_key: String,
  #[serde(default = "default_regular")]
  pub regular: TierConfigRaw,
  #[serde(default = "default_retained")]
  pub retained: TierConfigRaw,
  #[serde(default = "default_max_size_bytes")]
  pub max_size_bytes: Option<u64>,
  #[serde(default = "default_prune_ratio")]
  pub size_prune_ratio: f64,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TierConfigRaw {
  pub max_items: usize,
  #[serde(default = "default_never")]
  pub expire_after: String,
}

fn default_regular() -> TierConfigRaw {
  TierConfigRaw {
    max_items: 30,
    expire_after: "7d".to_string(),
  }
}

fn default_retained() -> TierConfigRaw {
  TierConfigRaw {
    max_items: 500,
    expire_after: default_never(),
  }
}

fn default_never() -> String {
  "never".to_string()
}

fn default_max_size_bytes() -> Option<u64> {
  Some(DEFAULT_MAX_SIZE_BYTES)
}

fn default_prune_ratio() -> f64 {
  DEFAULT_SIZE_PRUNE_RATIO
}

fn parse_horizon(field: &str, value: &str) -> Result<Duration, ConfigError> {
  let value = value.trim();
  if value.eq_ignore_ascii_case("never") {
    return Ok(TierConfig::NEVER);
  }
  humantime::parse_duration(value).map_err(|e| ConfigError::InvalidValue {
    field: field.to_string(),
    message: e.to_string(),
  })
}

impl TryFrom<CacheConfigRaw> for CacheConfig {
  type Error = ConfigError;

  fn try_from(raw: CacheConfigRaw) -> Result<Self, Self::Error> {
    let regular = TierConfig::new(
      raw.regular.max_items,
      parse_horizon("regular.expire_after", &raw.regular.expire_after)?,
    );
    let retained = TierConfig::new(
      raw.retained.max_items,
      parse_horizon("retained.expire_after", &raw.retained.expire_after)?,
    );

    Ok(CacheConfig {
      storage_key: raw.storage_key,
      regular,
      retained,
      max_size_bytes: raw.max_size_bytes,
      size_prune_ratio: raw.size_prune_ratio,
    })
  }
}
