//! A persistent, tiered cache for chord sheets and catalog search results.
//!
//! Each logical cache keeps its whole collection as one JSON blob in a
//! key-value medium, and every operation is a load → mutate → save cycle.
//!
//! # Features
//! - **Canonical Keys**: Entries are addressed by a `(primary, secondary)` pair
//!   (artist and title) folded into a case- and accent-insensitive key.
//! - **Two Tiers**: Ephemeral entries expire and are capped quickly; retained
//!   entries (favorites) have their own, much larger ceiling and horizon.
//! - **Scored Eviction**: Per-tier count ceilings and a byte-size ceiling,
//!   both resolved by a frequency/recency score.
//! - **Self-Healing Persistence**: Corrupt blobs reset to empty, malformed
//!   entries are dropped, rejected writes are logged and absorbed.
//! - **Sync & Async**: `Cache` over a blocking backend, `AsyncCache` over an
//!   async one with every operation serialized.
//!
//! ```
//! use fibre_chordcache::{model::ChordSheet, CacheBuilder, WriteOptions};
//!
//! let cache = CacheBuilder::<ChordSheet>::new().build().unwrap();
//! let sheet = ChordSheet::new("Eagles", "Hotel California", "[Bm]On a dark desert highway");
//!
//! cache.put_sheet(sheet.clone(), WriteOptions::retained());
//! assert_eq!(cache.get(("EAGLES", "hotel california")), Some(sheet));
//! assert!(cache.is_retained(("Eagles", "Hotel California")));
//! ```

// Public modules that form the API
pub mod backend;
pub mod builder;
pub mod config;
pub mod entry;
pub mod error;
pub mod handles;
pub mod key;
pub mod metrics;
pub mod model;
pub mod policy;
pub mod store;
pub mod time;

// Internal, crate-only modules
mod shared;

// Re-export the primary user-facing types for convenience
pub use backend::{FileBackend, KvBackend, MemoryBackend};
#[cfg(feature = "tokio")]
pub use backend::AsyncKvBackend;
pub use builder::CacheBuilder;
pub use config::{CacheConfig, TierConfig};
pub use entry::{CacheCollection, CacheEntry};
#[cfg(feature = "tokio")]
pub use handles::AsyncCache;
pub use handles::{Cache, ChordSheetCache};
pub use key::CanonicalKey;
pub use metrics::MetricsSnapshot;
pub use shared::{CacheStats, WriteOptions};
pub use time::{Clock, ManualClock, SystemClock};
