//! Deployment manifests.
//!
//! A manifest is parsed into a [`RawManifest`] where every top-level key is
//! optional, then [`normalize`]d into a [`DeploymentManifest`] where every key
//! has a value. Everything past normalization works with the complete form.

mod legacy;
mod normalize;
mod types;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::util::yaml::{YamlFileError, read_yaml_file};

pub use normalize::*;
pub use types::*;

/// Errors raised while loading a manifest file.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to load deployment manifest {path}: {source}")]
  Load {
    path: PathBuf,
    #[source]
    source: YamlFileError,
  },
}

/// Read a deployment manifest from disk without normalizing it.
pub fn load_manifest(path: &Path) -> Result<RawManifest, ManifestError> {
  let raw: RawManifest = read_yaml_file(path).map_err(|source| ManifestError::Load {
    path: path.to_path_buf(),
    source,
  })?;
  info!(path = %path.display(), jobs = raw.jobs.as_ref().map_or(0, Vec::len), "loaded deployment manifest");
  Ok(raw)
}
