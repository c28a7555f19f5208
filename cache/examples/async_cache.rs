use fibre_chordcache::config::CacheConfig;
use fibre_chordcache::model::{SearchHit, SearchResultPage};
use fibre_chordcache::{CacheBuilder, WriteOptions};
use std::time::Duration;

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  // The search-result preset, but with a short horizon so the example can
  // watch an entry go stale.
  let config = CacheConfig::search_results().regular(50, Duration::from_secs(2));
  let cache = CacheBuilder::<SearchResultPage>::new()
    .config(config)
    .build_async()
    .await
    .expect("Failed to build cache");

  let page = SearchResultPage {
    query: "wonderwall".to_string(),
    hits: vec![SearchHit {
      artist: "Oasis".to_string(),
      title: "Wonderwall".to_string(),
      url: "https://example.com/oasis/wonderwall".to_string(),
    }],
  };

  // Several tasks write concurrently; every write is serialized.
  let mut tasks = Vec::new();
  for query in ["wonderwall", "lithium", "creep", "yellow"] {
    let cache = cache.clone();
    let mut page = page.clone();
    page.query = query.to_string();
    tasks.push(tokio::spawn(async move {
      cache.set(("songs", query), page, WriteOptions::default()).await;
    }));
  }
  for task in tasks {
    task.await.expect("Writer task panicked");
  }

  println!("Cached pages: {}", cache.stats().await.total_items);
  println!("Hit: {:?}", cache.get(("songs", "wonderwall")).await.map(|p| p.hits.len()));

  println!("\nWaiting for 3 seconds for the pages to expire...");
  tokio::time::sleep(Duration::from_secs(3)).await;

  println!("Swept {} stale pages.", cache.clear_expired().await);
  println!("\nCache metrics: {:#?}", cache.metrics());
}
