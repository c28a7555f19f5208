#![cfg(feature = "tokio")]

mod common;

use std::sync::Arc;

use common::{numbered, sheet, START};
use fibre_chordcache::error::BackendError;
use fibre_chordcache::model::ChordSheet;
use fibre_chordcache::store::PersistentStore;
use fibre_chordcache::{
  AsyncCache, AsyncKvBackend, CacheBuilder, KvBackend, ManualClock, MemoryBackend, WriteOptions,
};
use futures_util::future::{join_all, BoxFuture};

async fn build() -> AsyncCache<ChordSheet> {
  CacheBuilder::new()
    .regular_tier(1_000, common::REGULAR_TTL)
    .unbounded_size()
    .clock(Arc::new(ManualClock::new(START)))
    .build_async()
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_concurrent_spawned_sets_are_all_kept() {
  let cache = build().await;
  let num_tasks = 10;
  let writes_per_task = 20;

  let tasks: Vec<_> = (0..num_tasks)
    .map(|t| {
      let cache = cache.clone();
      tokio::spawn(async move {
        for i in 0..writes_per_task {
          let n = t * writes_per_task + i;
          let (artist, title) = (format!("Artist {n}"), format!("Song {n}"));
          cache
            .set((artist.as_str(), title.as_str()), numbered(n), WriteOptions::default())
            .await;
        }
      })
    })
    .collect();

  for task in tasks {
    task.await.unwrap();
  }

  assert_eq!(cache.stats().await.total_items, num_tasks * writes_per_task);
}

#[tokio::test]
async fn test_async_joined_reads_and_tier_changes() {
  let cache = build().await;
  let parts = ("Eagles", "Hotel California");
  cache.set(parts, sheet(parts.0, parts.1), WriteOptions::default()).await;

  let reads = (0..25).map(|_| cache.get(parts));
  let results = join_all(reads).await;
  assert!(results.iter().all(Option::is_some));

  assert!(cache.set_retained_status(parts, true).await);
  assert!(cache.is_retained(parts).await);
  assert_eq!(cache.metrics().hits, 25);
}

#[tokio::test]
async fn test_async_backend_shared_with_sync_handle() {
  let backend = Arc::new(MemoryBackend::new());
  let clock = Arc::new(ManualClock::new(START));
  let async_cache = CacheBuilder::<ChordSheet, _>::with_backend(Arc::clone(&backend))
    .clock(clock.clone())
    .build_async()
    .await
    .unwrap();
  async_cache
    .put_sheet(sheet("Oasis", "Wonderwall"), WriteOptions::retained())
    .await;

  let sync_cache = CacheBuilder::<ChordSheet, _>::with_backend(Arc::clone(&backend))
    .clock(clock)
    .build()
    .unwrap();
  assert!(sync_cache.is_retained(("Oasis", "Wonderwall")));
}

/// A backend that gives up the worker on every read and write, so a load and
/// its save are always split by an await point.
struct YieldingBackend {
  inner: Arc<MemoryBackend>,
}

impl AsyncKvBackend for YieldingBackend {
  fn read<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, BackendError>> {
    Box::pin(async move {
      tokio::task::yield_now().await;
      KvBackend::read(&*self.inner, key)
    })
  }

  fn write<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), BackendError>> {
    Box::pin(async move {
      tokio::task::yield_now().await;
      KvBackend::write(&*self.inner, key, value)
    })
  }

  fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), BackendError>> {
    Box::pin(async move {
      tokio::task::yield_now().await;
      KvBackend::delete(&*self.inner, key)
    })
  }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_sets_over_a_yielding_backend_do_not_lose_updates() {
  let memory = Arc::new(MemoryBackend::new());
  let cache = CacheBuilder::<ChordSheet, _>::with_backend(YieldingBackend {
    inner: Arc::clone(&memory),
  })
  .regular_tier(1_000, common::REGULAR_TTL)
  .unbounded_size()
  .clock(Arc::new(ManualClock::new(START)))
  .build_async()
  .await
  .unwrap();

  let tasks: Vec<_> = (0..50)
    .map(|n| {
      let cache = cache.clone();
      tokio::spawn(async move {
        let (artist, title) = (format!("Artist {n}"), format!("Song {n}"));
        cache
          .set((artist.as_str(), title.as_str()), numbered(n), WriteOptions::default())
          .await;
      })
    })
    .collect();
  for task in tasks {
    task.await.unwrap();
  }

  assert_eq!(cache.stats().await.total_items, 50);
  assert_eq!(cache.metrics().inserts, 50);
  let persisted = PersistentStore::<ChordSheet, _>::new(memory, common::STORAGE_KEY).load();
  assert_eq!(persisted.len(), 50);
}
