#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use fibre_chordcache::model::ChordSheet;
use fibre_chordcache::store::PersistentStore;
use fibre_chordcache::{Cache, CacheBuilder, CacheCollection, ManualClock, MemoryBackend, TierConfig};

pub const STORAGE_KEY: &str = "chord-sheet-cache";
pub const START: i64 = 1_700_000_000_000;
pub const REGULAR_TTL: Duration = Duration::from_secs(60 * 60);

pub struct Harness {
  pub cache: Cache<ChordSheet, Arc<MemoryBackend>>,
  pub backend: Arc<MemoryBackend>,
  pub clock: Arc<ManualClock>,
}

impl Harness {
  /// Reads the persisted collection straight from the backend.
  pub fn persisted(&self) -> CacheCollection<ChordSheet> {
    PersistentStore::new(Arc::clone(&self.backend), STORAGE_KEY).load()
  }

  /// Moves time forward by one millisecond so consecutive writes get
  /// distinct timestamps.
  pub fn tick(&self) {
    self.clock.advance(Duration::from_millis(1));
  }
}

pub fn builder(backend: Arc<MemoryBackend>, clock: Arc<ManualClock>) -> CacheBuilder<ChordSheet, Arc<MemoryBackend>> {
  CacheBuilder::with_backend(backend)
    .storage_key(STORAGE_KEY)
    .regular_tier(30, REGULAR_TTL)
    .retained_tier(500, TierConfig::NEVER)
    .unbounded_size()
    .clock(clock)
}

pub fn harness() -> Harness {
  harness_with(|b| b)
}

pub fn harness_with(
  configure: impl FnOnce(CacheBuilder<ChordSheet, Arc<MemoryBackend>>) -> CacheBuilder<ChordSheet, Arc<MemoryBackend>>,
) -> Harness {
  let backend = Arc::new(MemoryBackend::new());
  let clock = Arc::new(ManualClock::new(START));
  let cache = configure(builder(Arc::clone(&backend), Arc::clone(&clock)))
    .build()
    .unwrap();
  Harness {
    cache,
    backend,
    clock,
  }
}

pub fn sheet(artist: &str, title: &str) -> ChordSheet {
  ChordSheet::new(artist, title, format!("[G]{title} by [C]{artist} [D]"))
}

pub fn numbered(i: usize) -> ChordSheet {
  sheet(&format!("Artist {i}"), &format!("Song {i}"))
}
