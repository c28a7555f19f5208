mod common;

use common::{harness, sheet};
use pretty_assertions::assert_eq;
use fibre_chordcache::WriteOptions;

#[test]
fn test_sync_favorite_round_trip() {
  let h = harness();
  let hotel = sheet("Eagles", "Hotel California");

  h.cache.put_sheet(hotel.clone(), WriteOptions::retained());

  assert!(h.cache.is_retained(("EAGLES", "hotel california")));
  assert_eq!(h.cache.list_retained(), vec![hotel.clone()]);
  assert_eq!(
    h.cache.retained_keys(),
    vec![("eagles".to_string(), "hotel california".to_string())]
  );

  assert!(h.cache.set_retained_status(("Eagles", "Hotel California"), false));
  assert!(!h.cache.is_retained(("Eagles", "Hotel California")));
  assert!(h.cache.list_retained().is_empty());
  assert_eq!(h.cache.get(("Eagles", "Hotel California")), Some(hotel));
}

#[test]
fn test_sync_set_retained_on_missing_entry_fails() {
  let h = harness();
  assert!(!h.cache.set_retained_status(("Eagles", "Hotel California"), true));
  assert_eq!(h.cache.stats().total_items, 0);
}

#[test]
fn test_sync_list_retained_orders_newest_first() {
  let h = harness();
  let titles = ["Desperado", "Take It Easy", "Hotel California"];
  for title in titles {
    h.cache.set(("Eagles", title), sheet("Eagles", title), WriteOptions::retained());
    h.tick();
  }
  h.cache.set(("Nirvana", "Lithium"), sheet("Nirvana", "Lithium"), WriteOptions::default());

  let listed: Vec<String> = h.cache.list_retained().into_iter().map(|s| s.title).collect();
  assert_eq!(listed, vec!["Hotel California", "Take It Easy", "Desperado"]);

  // Reading a favorite refreshes it to the front.
  h.tick();
  h.cache.get(("Eagles", "Desperado"));
  let keys = h.cache.retained_keys();
  assert_eq!(keys[0], ("eagles".to_string(), "desperado".to_string()));
  assert_eq!(keys.len(), 3);
}

#[test]
fn test_sync_list_retained_breaks_ties_by_access_count() {
  let h = harness();
  h.cache.set(("A", "Quiet"), sheet("A", "Quiet"), WriteOptions::retained());
  h.cache.set(("B", "Loud"), sheet("B", "Loud"), WriteOptions::retained());
  h.cache.set(("B", "Loud"), sheet("B", "Loud"), WriteOptions::preserve());

  let listed: Vec<String> = h.cache.list_retained().into_iter().map(|s| s.title).collect();
  assert_eq!(listed, vec!["Loud", "Quiet"]);
}

#[test]
fn test_sync_retained_keys_keep_hyphens_in_the_primary() {
  let h = harness();
  h.cache.set(("Jay-Z", "Empire State of Mind"), sheet("Jay-Z", "Empire State of Mind"), WriteOptions::retained());

  assert_eq!(
    h.cache.retained_keys(),
    vec![("jay-z".to_string(), "empire state of mind".to_string())]
  );
}

#[test]
fn test_sync_listing_does_not_touch_entries() {
  let h = harness();
  h.cache.set(("Eagles", "Desperado"), sheet("Eagles", "Desperado"), WriteOptions::retained());
  h.tick();

  h.cache.list_retained();
  h.cache.retained_keys();

  let persisted = h.persisted();
  let entry = persisted.get("eagles-desperado").unwrap();
  assert_eq!(entry.access_count, 1);
  assert_eq!(entry.timestamp, common::START);
}
