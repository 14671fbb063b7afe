//! Release repository loading.
//!
//! # Repository Layout
//!
//! ```text
//! <repo>/
//! ├── config/
//! │   ├── final.yml              final_name: appcloud
//! │   └── dev.yml                dev_name: appcloud
//! ├── releases/
//! │   ├── index.yml              final index
//! │   └── appcloud-3.yml
//! └── dev_releases/
//!     └── appcloud/
//!         ├── index.yml          dev index
//!         └── appcloud-3+dev.2.yml
//! ```
//!
//! Older repositories keep dev releases flat in `dev_releases/` with the index
//! at `dev_releases/index.yml`; both layouts are understood, and the same
//! nesting rule is applied to `releases/`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use super::types::Release;
use crate::util::yaml::{YamlFileError, read_yaml_file, scalar_to_string};
use crate::version::{ReleaseVersion, VersionError, select_newest};

const FINAL_RELEASES_DIR: &str = "releases";
const DEV_RELEASES_DIR: &str = "dev_releases";
const INDEX_FILENAME: &str = "index.yml";

/// Errors raised while opening a repository or loading a release from it.
#[derive(Debug, Error)]
pub enum ReleaseError {
  /// The repository directory does not exist.
  #[error("release repository does not exist: {path}")]
  RepositoryNotFound { path: PathBuf },

  /// Neither index lists a release and no release file was given.
  #[error("no release index found in {path}; create a release in the repository first")]
  NoReleaseFound { path: PathBuf },

  /// An index lists a version that cannot be compared.
  #[error(transparent)]
  InvalidVersion(#[from] VersionError),

  /// A config or index file exists but cannot be read.
  #[error("failed to read repository metadata: {0}")]
  Metadata(#[source] YamlFileError),

  /// The release file cannot be read or parsed.
  #[error("failed to load release file {path}: {source}")]
  Load {
    path: PathBuf,
    #[source]
    source: YamlFileError,
  },
}

/// A release together with the file it was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedRelease {
  pub release: Release,
  pub path: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct FinalConfig {
  #[serde(default)]
  final_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DevConfig {
  #[serde(default)]
  dev_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IndexFile {
  #[serde(default)]
  builds: serde_yaml::Mapping,
}

/// The versions listed by one index, and where its release files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseIndex {
  /// Directory holding the release files for this index.
  pub dir: PathBuf,
  /// Release name used as the file name prefix.
  pub name: String,
  pub versions: Vec<String>,
}

impl ReleaseIndex {
  fn empty(dir: PathBuf, name: String) -> Self {
    Self {
      dir,
      name,
      versions: Vec::new(),
    }
  }

  /// Path of the release file for `version` in this index.
  pub fn release_file(&self, version: &str) -> PathBuf {
    self.dir.join(format!("{}-{}.yml", self.name, version))
  }

  pub fn contains(&self, version: &str) -> bool {
    self.versions.iter().any(|v| v == version)
  }
}

/// A release repository on disk.
#[derive(Debug, Clone)]
pub struct ReleaseRepo {
  root: PathBuf,
}

impl ReleaseRepo {
  /// Open the repository at `path`.
  pub fn open(path: &Path) -> Result<Self, ReleaseError> {
    if !path.is_dir() {
      return Err(ReleaseError::RepositoryNotFound {
        path: path.to_path_buf(),
      });
    }
    let root = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    debug!(path = %root.display(), "opened release repository");
    Ok(Self { root })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// The final releases index (`releases/`).
  pub fn final_index(&self) -> Result<ReleaseIndex, ReleaseError> {
    let config: FinalConfig = read_optional(&self.root.join("config").join("final.yml"))?;
    let name = config.final_name.unwrap_or_default();
    self.read_index(FINAL_RELEASES_DIR, name)
  }

  /// The dev releases index (`dev_releases/`).
  pub fn dev_index(&self) -> Result<ReleaseIndex, ReleaseError> {
    let config: DevConfig = read_optional(&self.root.join("config").join("dev.yml"))?;
    let name = config.dev_name.unwrap_or_default();
    self.read_index(DEV_RELEASES_DIR, name)
  }

  fn read_index(&self, kind: &str, name: String) -> Result<ReleaseIndex, ReleaseError> {
    let base = self.root.join(kind);
    let nested = base.join(&name);

    // Prefer the per-name layout; fall back to the flat one.
    let dir = if !name.is_empty() && nested.join(INDEX_FILENAME).is_file() {
      nested
    } else {
      base
    };

    let index_path = dir.join(INDEX_FILENAME);
    if !index_path.is_file() {
      debug!(path = %index_path.display(), "release index not found");
      return Ok(ReleaseIndex::empty(dir, name));
    }

    let index: IndexFile = read_yaml_file(&index_path).map_err(ReleaseError::Metadata)?;
    let versions = index
      .builds
      .values()
      .filter_map(|build| build.get("version").and_then(scalar_to_string))
      .collect::<Vec<_>>();

    debug!(path = %index_path.display(), count = versions.len(), "read release index");
    Ok(ReleaseIndex { dir, name, versions })
  }

  /// Pick the newest release across the final and dev indices.
  ///
  /// Returns the version and the release file it lives in.
  pub fn newest_release(&self) -> Result<(String, PathBuf), ReleaseError> {
    let final_index = self.final_index()?;
    let dev_index = self.dev_index()?;

    let all = final_index.versions.iter().chain(dev_index.versions.iter());
    let newest = match select_newest(all) {
      Ok(v) => v,
      Err(VersionError::NoReleaseFound) => {
        return Err(ReleaseError::NoReleaseFound {
          path: self.root.clone(),
        });
      }
      Err(e) => return Err(e.into()),
    };

    // A version in both indices resolves by its own shape.
    let from_dev = ReleaseVersion::parse(&newest)?.is_dev() || !final_index.contains(&newest);
    let path = if from_dev {
      dev_index.release_file(&newest)
    } else {
      final_index.release_file(&newest)
    };

    info!(version = %newest, path = %path.display(), "selected newest release");
    Ok((newest, path))
  }

  /// Load a release.
  ///
  /// With `release_file` the given file is loaded as is and the indices are not
  /// consulted; otherwise the newest indexed release is loaded.
  pub fn load(&self, release_file: Option<&Path>) -> Result<LoadedRelease, ReleaseError> {
    let path = match release_file {
      Some(path) => path.to_path_buf(),
      None => self.newest_release()?.1,
    };

    let release: Release = read_yaml_file(&path).map_err(|source| ReleaseError::Load {
      path: path.clone(),
      source,
    })?;

    info!(
      name = %release.name,
      version = %release.version,
      packages = release.packages.len(),
      job_templates = release.job_templates.len(),
      "loaded release"
    );
    Ok(LoadedRelease { release, path })
  }
}

/// Read a YAML file, treating a missing file as an empty document.
fn read_optional<T: Default + serde::de::DeserializeOwned>(path: &Path) -> Result<T, ReleaseError> {
  if !path.is_file() {
    return Ok(T::default());
  }
  read_yaml_file(path).map_err(ReleaseError::Metadata)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::write_file;
  use tempfile::TempDir;

  fn release_yaml(name: &str, version: &str) -> String {
    format!(
      "name: {}\nversion: {}\npackages:\n  - name: a\n    version: 1\n    sha1: x\n    dependencies: []\n",
      name, version
    )
  }

  fn index_yaml(versions: &[&str]) -> String {
    let mut s = String::from("builds:\n");
    for (i, v) in versions.iter().enumerate() {
      s.push_str(&format!("  fp{}:\n    version: {}\n", i, v));
    }
    s
  }

  /// Repository with final releases 1 and 2 and nested dev releases 2+dev.1, 2+dev.2.
  fn sample_repo() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(root, "config/final.yml", "final_name: app\n");
    write_file(root, "config/dev.yml", "dev_name: app-dev\n");
    write_file(root, "releases/index.yml", &index_yaml(&["1", "2"]));
    write_file(root, "releases/app-1.yml", &release_yaml("app", "1"));
    write_file(root, "releases/app-2.yml", &release_yaml("app", "2"));
    write_file(root, "dev_releases/app-dev/index.yml", &index_yaml(&["2+dev.1", "2+dev.2"]));
    write_file(
      root,
      "dev_releases/app-dev/app-dev-2+dev.2.yml",
      &release_yaml("app-dev", "2+dev.2"),
    );
    temp
  }

  #[test]
  fn open_missing_repository_fails() {
    let temp = TempDir::new().unwrap();
    let err = ReleaseRepo::open(&temp.path().join("nope")).unwrap_err();
    assert!(matches!(err, ReleaseError::RepositoryNotFound { .. }));
  }

  #[test]
  fn reads_both_indices() {
    let temp = sample_repo();
    let repo = ReleaseRepo::open(temp.path()).unwrap();

    let final_index = repo.final_index().unwrap();
    assert_eq!(final_index.name, "app");
    assert_eq!(final_index.versions, vec!["1", "2"]);

    let dev_index = repo.dev_index().unwrap();
    assert_eq!(dev_index.name, "app-dev");
    assert!(dev_index.dir.ends_with("dev_releases/app-dev"));
    assert_eq!(dev_index.versions.len(), 2);
  }

  #[test]
  fn newest_dev_release_is_loaded_from_nested_layout() {
    let temp = sample_repo();
    let repo = ReleaseRepo::open(temp.path()).unwrap();

    let loaded = repo.load(None).unwrap();
    assert_eq!(loaded.release.version, "2+dev.2");
    assert!(loaded.path.ends_with("dev_releases/app-dev/app-dev-2+dev.2.yml"));
  }

  #[test]
  fn newer_final_release_wins_over_older_dev() {
    let temp = sample_repo();
    let root = temp.path();
    write_file(root, "releases/index.yml", &index_yaml(&["1", "2", "3"]));
    write_file(root, "releases/app-3.yml", &release_yaml("app", "3"));

    let repo = ReleaseRepo::open(root).unwrap();
    let loaded = repo.load(None).unwrap();
    assert_eq!(loaded.release.version, "3");
    assert!(loaded.path.ends_with("releases/app-3.yml"));
  }

  #[test]
  fn older_flat_dev_layout_is_supported() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(root, "config/dev.yml", "dev_name: legacy\n");
    write_file(root, "dev_releases/index.yml", &index_yaml(&["4+dev.1"]));
    write_file(root, "dev_releases/legacy-4+dev.1.yml", &release_yaml("legacy", "4+dev.1"));

    let repo = ReleaseRepo::open(root).unwrap();
    let loaded = repo.load(None).unwrap();
    assert_eq!(loaded.release.name, "legacy");
    assert!(loaded.path.ends_with("dev_releases/legacy-4+dev.1.yml"));
  }

  #[test]
  fn empty_repository_has_no_release() {
    let temp = TempDir::new().unwrap();
    let repo = ReleaseRepo::open(temp.path()).unwrap();
    let err = repo.load(None).unwrap_err();
    assert!(matches!(err, ReleaseError::NoReleaseFound { .. }));
  }

  #[test]
  fn explicit_release_file_skips_indices() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(root, "custom.yml", &release_yaml("custom", "9"));

    let repo = ReleaseRepo::open(root).unwrap();
    let loaded = repo.load(Some(&root.join("custom.yml"))).unwrap();
    assert_eq!(loaded.release.name, "custom");
    assert_eq!(loaded.release.version, "9");
  }

  #[test]
  fn missing_release_file_is_a_load_error() {
    let temp = sample_repo();
    let root = temp.path();
    std::fs::remove_file(root.join("dev_releases/app-dev/app-dev-2+dev.2.yml")).unwrap();

    let repo = ReleaseRepo::open(root).unwrap();
    let err = repo.load(None).unwrap_err();
    assert!(matches!(err, ReleaseError::Load { .. }));
  }

  #[test]
  fn malformed_index_version_is_reported() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(root, "releases/index.yml", &index_yaml(&["banana"]));

    let repo = ReleaseRepo::open(root).unwrap();
    let err = repo.newest_release().unwrap_err();
    assert!(matches!(err, ReleaseError::InvalidVersion(VersionError::InvalidFormat { .. })));
  }
}
