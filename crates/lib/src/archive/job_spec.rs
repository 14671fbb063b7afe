//! The `job.MF` spec carried inside job template archives.
//!
//! ```yaml
//! name: web
//! templates:
//!   web_ctl.erb: bin/web_ctl
//! packages: [nginx, ruby]
//! properties:
//!   web.port:
//!     default: 8080
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path};

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use tar::Archive;
use tracing::debug;

use super::{ArchiveError, ArchiveLocator};
use crate::consts::JOB_MANIFEST_FILE;
use crate::release::{PropertySchema, Release};

/// Parsed `job.MF`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobManifest {
  #[serde(default)]
  pub name: Option<String>,

  /// Template source file to rendered path.
  #[serde(default)]
  pub templates: BTreeMap<String, String>,

  #[serde(default)]
  pub packages: Vec<String>,

  #[serde(default)]
  pub properties: BTreeMap<String, PropertySchema>,
}

/// Read `job.MF` out of a job template archive.
pub fn read_job_manifest(archive_path: &Path) -> Result<JobManifest, ArchiveError> {
  let read_err = |source| ArchiveError::Read {
    path: archive_path.to_path_buf(),
    source,
  };

  let file = File::open(archive_path).map_err(read_err)?;
  let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));

  for entry in archive.entries().map_err(read_err)? {
    let mut entry = entry.map_err(read_err)?;
    let is_manifest = {
      let path = entry.path().map_err(read_err)?;
      let normal: Vec<_> = path.components().filter(|c| *c != Component::CurDir).collect();
      normal.len() == 1 && normal[0].as_os_str() == JOB_MANIFEST_FILE
    };
    if !is_manifest {
      continue;
    }

    let mut content = String::new();
    entry.read_to_string(&mut content).map_err(read_err)?;
    let manifest = serde_yaml::from_str(&content).map_err(|source| ArchiveError::Parse {
      path: archive_path.to_path_buf(),
      entry: JOB_MANIFEST_FILE.to_string(),
      source,
    })?;
    debug!(archive = %archive_path.display(), "read job spec");
    return Ok(manifest);
  }

  Err(ArchiveError::MissingEntry {
    path: archive_path.to_path_buf(),
    entry: JOB_MANIFEST_FILE.to_string(),
  })
}

/// Fill in packages and properties of the named templates from their archives.
///
/// Templates that already carry a package list are left alone, as are names
/// the release does not know.
pub fn fill_job_templates<S: AsRef<str>>(
  release: &mut Release,
  names: &[S],
  locator: &dyn ArchiveLocator,
) -> Result<(), ArchiveError> {
  for name in names {
    let Some(template) = release.job_template_mut(name.as_ref()) else {
      continue;
    };
    if template.has_spec() {
      continue;
    }

    let archive = locator.job_template_archive(&template.name, &template.version, &template.sha1)?;
    let spec = read_job_manifest(&archive)?;
    debug!(template = %template.name, packages = ?spec.packages, "filled template spec from archive");

    template.packages = Some(spec.packages);
    if template.properties.is_none() {
      template.properties = Some(spec.properties);
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::archive::RepoArchiveLocator;
  use crate::util::testutil::{sample_release, write_tgz};
  use tempfile::TempDir;

  const JOB_MF: &str = r#"
name: web
templates:
  web_ctl.erb: bin/web_ctl
packages:
  - nginx
  - ruby
properties:
  web.port:
    description: listen port
    default: 8080
  web.name: {}
"#;

  #[test]
  fn reads_job_manifest_from_archive() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("web.tgz");
    write_tgz(
      &archive,
      &[("./templates/web_ctl.erb", "#!/bin/sh\n", 0o644), ("./job.MF", JOB_MF, 0o644)],
    );

    let spec = read_job_manifest(&archive).unwrap();
    assert_eq!(spec.name.as_deref(), Some("web"));
    assert_eq!(spec.packages, ["nginx", "ruby"]);
    assert_eq!(spec.templates["web_ctl.erb"], "bin/web_ctl");
    assert_eq!(spec.properties["web.port"].default, Some(serde_yaml::Value::from(8080)));
    assert_eq!(spec.properties["web.name"].default, None);
  }

  #[test]
  fn archive_without_job_manifest_is_an_error() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("web.tgz");
    write_tgz(&archive, &[("./monit", "", 0o644)]);

    let err = read_job_manifest(&archive).unwrap_err();
    assert!(matches!(err, ArchiveError::MissingEntry { ref entry, .. } if entry == "job.MF"));
  }

  #[test]
  fn fill_only_touches_templates_without_spec() {
    let repo = TempDir::new().unwrap();
    let mut release = sample_release();
    release.job_template_mut("web").unwrap().packages = None;

    write_tgz(
      &repo.path().join(".dev_builds/jobs/web/1.tgz"),
      &[("./job.MF", "packages: [C, D]\nproperties:\n  web.port: {default: 80}\n", 0o644)],
    );
    let locator = RepoArchiveLocator::new(repo.path(), None);

    // worker has no archive on disk; it must not be looked up.
    fill_job_templates(&mut release, &["web", "worker", "ghost"], &locator).unwrap();

    let web = release.job_template("web").unwrap();
    assert_eq!(web.packages(), ["C".to_string(), "D".to_string()]);
    assert!(web.properties.as_ref().unwrap().contains_key("web.port"));
    assert_eq!(release.job_template("worker").unwrap().packages(), ["B".to_string(), "D".to_string()]);
  }

  #[test]
  fn fill_reports_missing_archive() {
    let repo = TempDir::new().unwrap();
    let mut release = sample_release();
    release.job_template_mut("web").unwrap().packages = None;
    let locator = RepoArchiveLocator::new(repo.path(), None);

    let err = fill_job_templates(&mut release, &["web"], &locator).unwrap_err();
    assert!(matches!(err, ArchiveError::NotFound { .. }));
  }
}
