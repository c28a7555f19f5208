use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// A source of "now" as epoch milliseconds.
///
/// Entry timestamps are persisted, so they must be wall-clock based rather
/// than relative to a process-local `Instant`.
pub trait Clock: Debug + Send + Sync {
  fn now_millis(&self) -> i64;
}

/// The wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  #[inline]
  fn now_millis(&self) -> i64 {
    chrono::Utc::now().timestamp_millis()
  }
}

/// A clock that only moves when told to. Useful for exercising expiration
/// and recency scoring without sleeping.
#[derive(Debug, Default)]
pub struct ManualClock {
  now: AtomicI64,
}

impl ManualClock {
  pub fn new(start_millis: i64) -> Self {
    Self {
      now: AtomicI64::new(start_millis),
    }
  }

  pub fn set(&self, millis: i64) {
    self.now.store(millis, Ordering::Relaxed);
  }

  pub fn advance(&self, by: Duration) {
    self.now.fetch_add(duration_to_millis(by), Ordering::Relaxed);
  }
}

impl Clock for ManualClock {
  #[inline]
  fn now_millis(&self) -> i64 {
    self.now.load(Ordering::Relaxed)
  }
}

/// Converts a duration to whole milliseconds, saturating at `i64::MAX`.
#[inline]
pub(crate) fn duration_to_millis(duration: Duration) -> i64 {
  i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Elapsed milliseconds between `timestamp` and `now`. A timestamp in the
/// future (clock skew) counts as zero age.
#[inline]
pub(crate) fn age_millis(now: i64, timestamp: i64) -> u64 {
  u64::try_from(now.saturating_sub(timestamp)).unwrap_or(0)
}
