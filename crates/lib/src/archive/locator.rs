//! Archive lookup over a release repository.

use std::path::PathBuf;

use tracing::debug;

use super::{ArchiveError, ArchiveKind};

const FINAL_BUILDS_DIR: &str = ".final_builds";
const DEV_BUILDS_DIR: &str = ".dev_builds";

/// Finds the archive file backing a package or job template, identified by
/// name, version and sha1.
pub trait ArchiveLocator {
  fn package_archive(&self, name: &str, version: &str, sha1: &str) -> Result<PathBuf, ArchiveError>;
  fn job_template_archive(&self, name: &str, version: &str, sha1: &str) -> Result<PathBuf, ArchiveError>;
}

/// Looks in `.final_builds`, then `.dev_builds`, then the sha1-keyed blob cache.
#[derive(Debug, Clone)]
pub struct RepoArchiveLocator {
  repo_dir: PathBuf,
  cache_dir: Option<PathBuf>,
}

impl RepoArchiveLocator {
  pub fn new(repo_dir: impl Into<PathBuf>, cache_dir: Option<PathBuf>) -> Self {
    Self {
      repo_dir: repo_dir.into(),
      cache_dir,
    }
  }

  /// Candidate paths in lookup order.
  pub fn candidates(&self, kind: ArchiveKind, name: &str, version: &str, sha1: &str) -> Vec<PathBuf> {
    let file = format!("{}.tgz", version);
    let mut paths = vec![
      self.repo_dir.join(FINAL_BUILDS_DIR).join(kind.dir_name()).join(name).join(&file),
      self.repo_dir.join(DEV_BUILDS_DIR).join(kind.dir_name()).join(name).join(&file),
    ];
    if let Some(cache) = self.cache_dir.as_ref().filter(|_| !sha1.is_empty()) {
      paths.push(cache.join(sha1));
    }
    paths
  }

  fn locate(&self, kind: ArchiveKind, name: &str, version: &str, sha1: &str) -> Result<PathBuf, ArchiveError> {
    let searched = self.candidates(kind, name, version, sha1);
    match searched.iter().find(|p| p.is_file()) {
      Some(found) => {
        debug!(kind = %kind, name = %name, version = %version, path = %found.display(), "found archive");
        Ok(found.clone())
      }
      None => Err(ArchiveError::NotFound {
        kind,
        name: name.to_string(),
        version: version.to_string(),
        searched,
      }),
    }
  }
}

impl ArchiveLocator for RepoArchiveLocator {
  fn package_archive(&self, name: &str, version: &str, sha1: &str) -> Result<PathBuf, ArchiveError> {
    self.locate(ArchiveKind::Package, name, version, sha1)
  }

  fn job_template_archive(&self, name: &str, version: &str, sha1: &str) -> Result<PathBuf, ArchiveError> {
    self.locate(ArchiveKind::Job, name, version, sha1)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{package, template, write_file};
  use tempfile::TempDir;

  #[test]
  fn final_build_wins_over_dev_and_cache() {
    let repo = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    let pkg = package("ruby", "5", &[]);

    write_file(repo.path(), ".final_builds/packages/ruby/5.tgz", "final");
    write_file(repo.path(), ".dev_builds/packages/ruby/5.tgz", "dev");
    write_file(cache.path(), &pkg.sha1, "cache");

    let locator = RepoArchiveLocator::new(repo.path(), Some(cache.path().to_path_buf()));
    let found = locator.package_archive(&pkg.name, &pkg.version, &pkg.sha1).unwrap();
    assert_eq!(found, repo.path().join(".final_builds/packages/ruby/5.tgz"));
  }

  #[test]
  fn falls_back_to_dev_build_then_cache() {
    let repo = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    let web = template("web", "3", &[]);
    let locator = RepoArchiveLocator::new(repo.path(), Some(cache.path().to_path_buf()));

    write_file(cache.path(), &web.sha1, "cache");
    let find = || locator.job_template_archive(&web.name, &web.version, &web.sha1).unwrap();
    assert_eq!(find(), cache.path().join(&web.sha1));

    write_file(repo.path(), ".dev_builds/jobs/web/3.tgz", "dev");
    assert_eq!(find(), repo.path().join(".dev_builds/jobs/web/3.tgz"));
  }

  #[test]
  fn not_found_lists_every_candidate() {
    let repo = TempDir::new().unwrap();
    let locator = RepoArchiveLocator::new(repo.path(), None);

    let err = locator.package_archive("ruby", "5", "").unwrap_err();
    match err {
      ArchiveError::NotFound { kind, name, searched, .. } => {
        assert_eq!(kind, ArchiveKind::Package);
        assert_eq!(name, "ruby");
        assert_eq!(searched.len(), 2);
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn empty_sha1_skips_cache() {
    let locator = RepoArchiveLocator::new("/repo", Some(PathBuf::from("/cache")));
    let paths = locator.candidates(ArchiveKind::Job, "web", "1", "");
    assert_eq!(paths.len(), 2);
  }
}
