use super::KvBackend;
use crate::error::BackendError;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A backend that keeps each storage key in its own JSON file under a root
/// directory.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write leaves the previous blob intact.
#[derive(Debug, Clone)]
pub struct FileBackend {
  root: PathBuf,
}

impl FileBackend {
  /// Opens (and creates if needed) the root directory.
  pub fn open(root: impl Into<PathBuf>) -> Result<Self, BackendError> {
    let root = root.into();
    fs::create_dir_all(&root)?;
    Ok(Self { root })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// The file a storage key is persisted to.
  ///
  /// Bytes outside `[A-Za-z0-9.-]` are escaped as `_XX` (uppercase hex), so
  /// a key can never escape the root and distinct keys never share a file.
  pub fn path_for(&self, key: &str) -> PathBuf {
    let mut file_name = String::with_capacity(key.len());
    for byte in key.bytes() {
      if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.') {
        file_name.push(char::from(byte));
      } else {
        file_name.push_str(&format!("_{byte:02X}"));
      }
    }
    self.root.join(format!("{file_name}.json"))
  }
}

impl KvBackend for FileBackend {
  fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
    match fs::read_to_string(self.path_for(key)) {
      Ok(blob) => Ok(Some(blob)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn write(&self, key: &str, value: &str) -> Result<(), BackendError> {
    let target = self.path_for(key);
    let staging = target.with_extension("json.tmp");

    let result = stage(&staging, value).and_then(|()| fs::rename(&staging, &target));
    if result.is_err() {
      let _ = fs::remove_file(&staging);
    }
    result.map_err(BackendError::from)
  }

  fn delete(&self, key: &str) -> Result<(), BackendError> {
    match fs::remove_file(self.path_for(key)) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }
}

fn stage(staging: &Path, value: &str) -> io::Result<()> {
  let mut file = fs::File::create(staging)?;
  file.write_all(value.as_bytes())?;
  file.sync_all()
}
