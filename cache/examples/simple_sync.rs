use fibre_chordcache::model::ChordSheet;
use fibre_chordcache::{CacheBuilder, FileBackend, WriteOptions};
use std::env;

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  // Persist the chord-sheet cache as a JSON file in the system temp directory.
  let root = env::temp_dir().join("fibre_chordcache_example");
  let backend = FileBackend::open(&root).expect("Failed to open cache directory");
  let cache = CacheBuilder::<ChordSheet, _>::with_backend(backend)
    .sweep_on_build(true)
    .build()
    .expect("Failed to build cache");

  let mut sheet = ChordSheet::new("Eagles", "Hotel California", "[Bm]On a dark desert highway");
  sheet.capo = Some(7);

  println!("Saving '{}' by {} as a favorite.", sheet.title, sheet.artist);
  cache.put_sheet(sheet, WriteOptions::retained());
  cache.put_sheet(
    ChordSheet::new("Nirvana", "Lithium", "[D]I'm so happy"),
    WriteOptions::default(),
  );

  // Lookups ignore case and accents.
  match cache.get(("EAGLES", "hotel california")) {
    Some(sheet) => println!("Found sheet with capo {:?}", sheet.capo),
    None => println!("Sheet not found."),
  }

  println!("\nFavorites: {:?}", cache.retained_keys());
  println!("Stats: {:#?}", cache.stats());
  println!("Blob lives at {}", root.join("chord-sheet-cache.json").display());
  println!("\nCache metrics: {:#?}", cache.metrics());
}
