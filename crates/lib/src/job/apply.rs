//! Apply submission.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use super::spec::ApplySpec;

#[derive(Debug, Error)]
pub enum ApplyError {
  #[error("failed to serialize apply spec: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("failed to write apply spec to {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Hands a finished apply spec to whatever runs the job.
pub trait Applier {
  fn apply(&mut self, spec: &ApplySpec) -> Result<(), ApplyError>;
}

/// Writes the apply spec as JSON to a file, replacing it atomically.
#[derive(Debug, Clone)]
pub struct SpecFileApplier {
  path: PathBuf,
}

impl SpecFileApplier {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn write(&self, content: &[u8]) -> io::Result<()> {
    let dir = match self.path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent,
      _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content)?;
    temp.persist(&self.path).map_err(|e| e.error)?;
    Ok(())
  }
}

impl Applier for SpecFileApplier {
  fn apply(&mut self, spec: &ApplySpec) -> Result<(), ApplyError> {
    let content = serde_json::to_vec_pretty(spec).map_err(ApplyError::Serialize)?;
    self.write(&content).map_err(|source| ApplyError::Write {
      path: self.path.clone(),
      source,
    })?;

    info!(job = %spec.job.name, path = %self.path.display(), "apply spec written");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::job::spec::{JobSpec, NetworkSpec};
  use std::collections::BTreeMap;
  use tempfile::TempDir;

  fn spec(index: u32) -> ApplySpec {
    ApplySpec {
      deployment: "dummy".to_string(),
      index,
      job: JobSpec {
        name: "web".to_string(),
        templates: vec![],
      },
      packages: vec![],
      networks: BTreeMap::from([(
        "default".to_string(),
        NetworkSpec {
          ip: Some("10.0.0.5".to_string()),
          kind: "manual".to_string(),
          default: vec![],
          cloud_properties: serde_yaml::Mapping::new(),
        },
      )]),
      resource_pool: "default".to_string(),
      properties: serde_yaml::from_str("web: {port: 80}").unwrap(),
      configuration_hash: Some("c".to_string()),
      template_hashes: BTreeMap::new(),
      rendered_templates_archive: None,
    }
  }

  #[test]
  fn writes_spec_as_json() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bosh/spec.json");
    let mut applier = SpecFileApplier::new(&path);

    applier.apply(&spec(0)).unwrap();

    let written: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(written["job"]["name"], "web");
    assert_eq!(written["networks"]["default"]["ip"], "10.0.0.5");
    assert_eq!(written["networks"]["default"]["type"], "manual");
    assert_eq!(written["properties"]["web"]["port"], 80);
  }

  #[test]
  fn rewrites_existing_spec() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("spec.json");
    let mut applier = SpecFileApplier::new(&path);

    applier.apply(&spec(0)).unwrap();
    applier.apply(&spec(3)).unwrap();

    let written: ApplySpec = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(written.index, 3);
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
  }
}
