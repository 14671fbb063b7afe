//! Local directory blobstore.
//!
//! Blobs are stored flat under one directory, named by the hex sha256 of their
//! content. Writing the same content twice yields the same id.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::debug;

/// Content-addressed blob directory.
#[derive(Debug, Clone)]
pub struct Blobstore {
  dir: PathBuf,
}

impl Blobstore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  /// Store `bytes` and return their id.
  ///
  /// The blob is written to a temporary file in the same directory and then
  /// renamed into place, so readers never see a partial blob.
  pub fn put(&self, bytes: &[u8]) -> io::Result<String> {
    fs::create_dir_all(&self.dir)?;

    let id = sha256_hex(bytes);
    let path = self.path(&id);
    if path.is_file() {
      debug!(id = %id, "blob already stored");
      return Ok(id);
    }

    let mut temp = NamedTempFile::new_in(&self.dir)?;
    temp.write_all(bytes)?;
    temp.persist(&path).map_err(|e| e.error)?;

    debug!(id = %id, size = bytes.len(), "stored blob");
    Ok(id)
  }

  /// Read a blob back.
  pub fn get(&self, id: &str) -> io::Result<Vec<u8>> {
    fs::read(self.path(id))
  }

  pub fn path(&self, id: &str) -> PathBuf {
    self.dir.join(id)
  }
}

/// Lowercase hex sha256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
  hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn put_is_content_addressed() {
    let temp = TempDir::new().unwrap();
    let store = Blobstore::new(temp.path().join("blobs"));

    let id = store.put(b"hello").unwrap();
    assert_eq!(id, "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824");
    assert_eq!(store.get(&id).unwrap(), b"hello");
    assert_eq!(store.put(b"hello").unwrap(), id);
  }

  #[test]
  fn put_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let store = Blobstore::new(temp.path());
    store.put(b"a").unwrap();
    store.put(b"b").unwrap();
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 2);
  }

  #[test]
  fn get_unknown_blob_fails() {
    let temp = TempDir::new().unwrap();
    let store = Blobstore::new(temp.path());
    assert_eq!(store.get("missing").unwrap_err().kind(), io::ErrorKind::NotFound);
  }
}
