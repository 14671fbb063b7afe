//! Installed-version stores.
//!
//! On disk, each installed package is a symlink
//! `<install_dir>/packages/<name>` pointing at its versioned install directory
//! `<install_dir>/data/packages/<name>/<version>`; the version is the last
//! component of the link target. [`MemoryVersions`] keeps the same records in
//! memory.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use super::types::InstalledVersions;
use crate::platform::paths::InstallLayout;

/// Errors reading or writing installed-version records.
#[derive(Debug, Error)]
pub enum VersionStoreError {
  #[error("failed to read install record for '{name}': {source}")]
  Read {
    name: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to write install record for '{name}': {source}")]
  Write {
    name: String,
    #[source]
    source: io::Error,
  },
}

/// Version records kept as symlinks under an install root.
#[derive(Debug, Clone)]
pub struct SymlinkVersions {
  layout: InstallLayout,
}

impl SymlinkVersions {
  pub fn new(layout: InstallLayout) -> Self {
    Self { layout }
  }
}

impl InstalledVersions for SymlinkVersions {
  fn installed_version(&self, name: &str) -> Result<Option<String>, VersionStoreError> {
    let link = self.layout.package_link(name);
    let target = match fs::read_link(&link) {
      Ok(target) => target,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(source) => {
        return Err(VersionStoreError::Read {
          name: name.to_string(),
          source,
        });
      }
    };

    let version = target.file_name().map(|v| v.to_string_lossy().into_owned());
    debug!(package = %name, target = %target.display(), version = ?version, "read install record");
    Ok(version)
  }

  fn record(&mut self, name: &str, version: &str) -> Result<(), VersionStoreError> {
    let write_err = |source| VersionStoreError::Write {
      name: name.to_string(),
      source,
    };

    let link = self.layout.package_link(name);
    let target = self.layout.package_install_dir(name, version);

    fs::create_dir_all(self.layout.packages_dir()).map_err(write_err)?;
    fs::create_dir_all(&target).map_err(write_err)?;
    self.forget(name)?;
    symlink_dir(&target, &link).map_err(write_err)?;

    debug!(package = %name, version = %version, link = %link.display(), "recorded install");
    Ok(())
  }

  fn forget(&mut self, name: &str) -> Result<(), VersionStoreError> {
    let link = self.layout.package_link(name);
    let result = match fs::symlink_metadata(&link) {
      Ok(meta) if meta.is_dir() => fs::remove_dir_all(&link),
      Ok(_) => fs::remove_file(&link),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e),
    };
    result.map_err(|source| VersionStoreError::Write {
      name: name.to_string(),
      source,
    })
  }
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
  std::os::windows::fs::symlink_dir(target, link)
}

/// Version records kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryVersions {
  versions: HashMap<String, String>,
}

impl MemoryVersions {
  pub fn new() -> Self {
    Self::default()
  }

  /// Store pre-populated with `(name, version)` records.
  pub fn with_installed<'a>(records: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
    Self {
      versions: records
        .into_iter()
        .map(|(n, v)| (n.to_string(), v.to_string()))
        .collect(),
    }
  }
}

impl InstalledVersions for MemoryVersions {
  fn installed_version(&self, name: &str) -> Result<Option<String>, VersionStoreError> {
    Ok(self.versions.get(name).cloned())
  }

  fn record(&mut self, name: &str, version: &str) -> Result<(), VersionStoreError> {
    self.versions.insert(name.to_string(), version.to_string());
    Ok(())
  }

  fn forget(&mut self, name: &str) -> Result<(), VersionStoreError> {
    self.versions.remove(name);
    Ok(())
  }
}
