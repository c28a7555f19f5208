//! Canonical key derivation.
//!
//! Every entry is addressed by a pair of human-entered strings (for a chord
//! sheet, the artist and the song title). The pair is folded into a single
//! canonical key that is case-insensitive and accent-insensitive, so that
//! `("Oásis", "Wonderwäll")` and `("OASIS", "wonderwall")` land on the same
//! entry, and that matches the catalog's own naming convention:
//!
//! ```
//! use fibre_chordcache::key::normalize;
//!
//! let key = normalize("Leonardo Gonçalves", "Getsêmani").unwrap();
//! assert_eq!(key.as_str(), "leonardo_goncalves-getsemani");
//! ```

use crate::error::KeyError;

use std::fmt;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Joins the two normalized components.
pub const PART_DELIMITER: char = '-';

/// Replaces every run of whitespace inside a component.
pub const WORD_SEPARATOR: char = '_';

/// A normalized, delimiter-joined key identifying one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey(String);

impl CanonicalKey {
  #[inline]
  pub fn as_str(&self) -> &str {
    &self.0
  }

  #[inline]
  pub fn into_string(self) -> String {
    self.0
  }

  /// Best-effort reconstruction of the two components. See [`split_key`].
  pub fn parts(&self) -> Option<(String, String)> {
    split_key(&self.0)
  }
}

impl fmt::Display for CanonicalKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for CanonicalKey {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

/// Derives the canonical key for a `(primary, secondary)` pair.
///
/// Each component is lower-cased, decomposed so diacritical marks can be
/// dropped, trimmed, and has its internal whitespace runs collapsed to
/// [`WORD_SEPARATOR`]. The two results are joined with [`PART_DELIMITER`].
///
/// # Errors
///
/// Fails when either component is empty or whitespace-only.
pub fn normalize(primary: &str, secondary: &str) -> Result<CanonicalKey, KeyError> {
  let primary = normalize_part(primary).ok_or(KeyError::EmptyPrimary)?;
  let secondary = normalize_part(secondary).ok_or(KeyError::EmptySecondary)?;

  let mut key = String::with_capacity(primary.len() + secondary.len() + 1);
  key.push_str(&primary);
  key.push(PART_DELIMITER);
  key.push_str(&secondary);
  Ok(CanonicalKey(key))
}

/// Recovers the two components of a canonical key.
///
/// The key is split on the *last* [`PART_DELIMITER`] and word separators are
/// turned back into spaces. Casing, accents and punctuation are not restored.
/// Returns `None` when the key carries no delimiter.
///
/// Hyphens inside a component are kept as they are, so the encoding is not
/// injective: `("a-b", "c")` and `("a", "b-c")` both map to `a-b-c` and share
/// one entry, which splits back as `("a-b", "c")`.
pub fn split_key(key: &str) -> Option<(String, String)> {
  let (primary, secondary) = key.rsplit_once(PART_DELIMITER)?;
  Some((restore_spaces(primary), restore_spaces(secondary)))
}

fn normalize_part(raw: &str) -> Option<String> {
  let folded: String = raw
    .to_lowercase()
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .collect();

  let mut out = String::with_capacity(folded.len());
  for word in folded.split_whitespace() {
    if !out.is_empty() {
      out.push(WORD_SEPARATOR);
    }
    out.push_str(word);
  }

  if out.is_empty() {
    None
  } else {
    Some(out)
  }
}

fn restore_spaces(part: &str) -> String {
  part.replace(WORD_SEPARATOR, " ")
}
