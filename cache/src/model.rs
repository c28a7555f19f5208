//! Payloads stored by the two stock caches.

use serde::{Deserialize, Serialize};

/// A chord sheet as fetched from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordSheet {
  pub title: String,
  pub artist: String,
  /// The annotated lyric/chord text.
  pub body: String,
  /// The key the sheet is written in, e.g. `"G"` or `"F#m"`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub key: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tuning: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub capo: Option<u8>,
  /// Where the sheet was fetched from.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_url: Option<String>,
}

impl ChordSheet {
  pub fn new(artist: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      artist: artist.into(),
      body: body.into(),
      key: None,
      tuning: None,
      capo: None,
      source_url: None,
    }
  }

  /// The `(artist, title)` pair the sheet is cached under.
  pub fn key_parts(&self) -> (&str, &str) {
    (&self.artist, &self.title)
  }
}

/// One hit in a catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
  pub artist: String,
  pub title: String,
  pub url: String,
}

/// A page of catalog search results, cached under `(scope, query)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultPage {
  pub query: String,
  pub hits: Vec<SearchHit>,
}
