//! Package and job template archives.
//!
//! Archives live in the release repository's build directories or in the
//! local blob cache. This module finds them, unpacks them, and reads the job
//! spec (`job.MF`) embedded in job template archives.

mod job_spec;
mod locator;

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use thiserror::Error;
use tracing::debug;

pub use job_spec::*;
pub use locator::*;

/// Which kind of build an archive holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
  Package,
  Job,
}

impl ArchiveKind {
  /// Directory name used under `.final_builds` and `.dev_builds`.
  pub fn dir_name(self) -> &'static str {
    match self {
      ArchiveKind::Package => "packages",
      ArchiveKind::Job => "jobs",
    }
  }
}

impl std::fmt::Display for ArchiveKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ArchiveKind::Package => write!(f, "package"),
      ArchiveKind::Job => write!(f, "job"),
    }
  }
}

#[derive(Debug, Error)]
pub enum ArchiveError {
  /// No candidate location holds the archive.
  #[error("{kind} archive for {name}/{version} not found (searched {searched:?})")]
  NotFound {
    kind: ArchiveKind,
    name: String,
    version: String,
    searched: Vec<PathBuf>,
  },

  #[error("failed to read archive {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The archive is readable but lacks a required file.
  #[error("archive {path} does not contain {entry}")]
  MissingEntry { path: PathBuf, entry: String },

  #[error("failed to parse {entry} in {path}: {source}")]
  Parse {
    path: PathBuf,
    entry: String,
    #[source]
    source: serde_yaml::Error,
  },
}

/// Unpack a gzipped tarball into `dest`, creating it if needed.
pub fn extract_tgz(archive_path: &Path, dest: &Path) -> io::Result<()> {
  fs::create_dir_all(dest)?;

  let file = File::open(archive_path)?;
  let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
  archive.set_preserve_permissions(true);
  archive.unpack(dest)?;

  debug!(archive = %archive_path.display(), dest = %dest.display(), "unpacked archive");
  Ok(())
}
