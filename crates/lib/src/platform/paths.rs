//! Install locations.
//!
//! Defaults follow the layout release jobs expect (`/var/vcap`); every base
//! directory can be overridden through `RELKIT_*` environment variables.
//!
//! ```text
//! <install_dir>/
//! ├── bosh/spec.json                    last applied spec
//! ├── packages/<name> -> ../data/packages/<name>/<version>
//! ├── data/packages/<name>/<version>/   package install target
//! ├── data/compile/<name>/              package compile scratch space
//! ├── jobs/ monit/ store/ shared/
//! ```

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::APP_NAME;

pub const INSTALL_DIR_ENV: &str = "RELKIT_INSTALL_DIR";
pub const WORK_DIR_ENV: &str = "RELKIT_WORK_DIR";
pub const CACHE_DIR_ENV: &str = "RELKIT_CACHE_DIR";

const DEFAULT_INSTALL_DIR: &str = "/var/vcap";

/// Top-level directories created under the install root.
const INSTALL_SUBDIRS: [&str; 7] = ["bosh", "jobs", "packages", "monit", "store", "shared", "data"];

/// Returns the user's home directory, if known.
#[cfg(windows)]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("USERPROFILE").map(PathBuf::from)
}

/// Returns the user's home directory, if known.
#[cfg(not(windows))]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("HOME").map(PathBuf::from)
}

/// Root directory jobs and packages are installed into.
pub fn install_dir() -> PathBuf {
  std::env::var_os(INSTALL_DIR_ENV)
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from(DEFAULT_INSTALL_DIR))
}

/// Scratch directory for the local blobstore and other per-run files.
pub fn work_dir() -> PathBuf {
  std::env::var_os(WORK_DIR_ENV)
    .map(PathBuf::from)
    .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
}

/// Blob cache release tooling downloads archives into, keyed by sha1.
pub fn cache_dir() -> Option<PathBuf> {
  std::env::var_os(CACHE_DIR_ENV)
    .map(PathBuf::from)
    .or_else(|| home_dir().map(|home| home.join(".bosh").join("cache")))
}

/// Paths under an install root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
  root: PathBuf,
}

impl InstallLayout {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Directory of per-package version links.
  pub fn packages_dir(&self) -> PathBuf {
    self.root.join("packages")
  }

  /// Link recording the installed version of `name`.
  pub fn package_link(&self, name: &str) -> PathBuf {
    self.packages_dir().join(name)
  }

  /// Where version `version` of package `name` is installed.
  pub fn package_install_dir(&self, name: &str, version: &str) -> PathBuf {
    self.root.join("data").join("packages").join(name).join(version)
  }

  /// Scratch directory a package archive is unpacked and built in.
  pub fn compile_dir(&self, name: &str) -> PathBuf {
    self.root.join("data").join("compile").join(name)
  }

  /// File the last applied spec is written to.
  pub fn spec_file(&self) -> PathBuf {
    self.root.join("bosh").join("spec.json")
  }

  /// Create the top-level install directories.
  pub fn ensure_dirs(&self) -> io::Result<()> {
    for dir in INSTALL_SUBDIRS {
      std::fs::create_dir_all(self.root.join(dir))?;
    }
    debug!(root = %self.root.display(), "install directories ready");
    Ok(())
  }
}
