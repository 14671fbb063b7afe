//! Test utilities for relkit-lib.
//!
//! Helpers to lay out release repositories and archives on disk, and a small
//! in-memory release used across module tests.

use std::fs;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::install::{CompileRequest, PackageHandle, Packager, PackagingError};
use crate::release::{JobTemplateDefinition, PackageDefinition, Release};

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) {
  let path = root.join(relative);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(&path, content).unwrap();
}

/// Write a gzipped tarball at `path` holding `entries` as `(name, content, mode)`.
pub fn write_tgz(path: &Path, entries: &[(&str, &str, u32)]) {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  let file = fs::File::create(path).unwrap();
  let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
  for (name, content, mode) in entries {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(*mode);
    header.set_cksum();
    builder.append_data(&mut header, name, content.as_bytes()).unwrap();
  }
  builder.into_inner().unwrap().finish().unwrap();
}

pub fn package(name: &str, version: &str, deps: &[&str]) -> PackageDefinition {
  PackageDefinition {
    name: name.to_string(),
    version: version.to_string(),
    sha1: format!("sha1-{}-{}", name, version),
    dependencies: deps.iter().map(|d| d.to_string()).collect(),
  }
}

pub fn template(name: &str, version: &str, packages: &[&str]) -> JobTemplateDefinition {
  JobTemplateDefinition {
    name: name.to_string(),
    version: version.to_string(),
    sha1: format!("sha1-{}-{}", name, version),
    packages: Some(packages.iter().map(|p| p.to_string()).collect()),
    properties: None,
  }
}

/// Release with packages `A`, `B -> A`, `C -> B`, `D` and templates
/// `web [C]`, `worker [B, D]`.
pub fn sample_release() -> Release {
  Release {
    name: "sample".to_string(),
    version: "3+dev.2".to_string(),
    packages: vec![
      package("A", "1", &[]),
      package("B", "1", &["A"]),
      package("C", "2", &["B"]),
      package("D", "1", &[]),
    ],
    job_templates: vec![template("web", "1", &["C"]), template("worker", "1", &["B", "D"])],
  }
}

/// Packager that records requests and can be told to fail on one package.
#[derive(Debug, Default)]
pub struct FakePackager {
  pub calls: Vec<CompileRequest>,
  pub fail_on: Option<String>,
}

impl FakePackager {
  /// Names of the packages compiled so far, in call order.
  pub fn compiled(&self) -> Vec<&str> {
    self.calls.iter().map(|c| c.name.as_str()).collect()
  }
}

impl Packager for FakePackager {
  fn compile(&mut self, request: &CompileRequest) -> Result<PackageHandle, PackagingError> {
    self.calls.push(request.clone());
    if self.fail_on.as_deref() == Some(request.name.as_str()) {
      return Err(PackagingError::ScriptFailed {
        code: Some(2),
        output: "make: *** [all] Error 2".to_string(),
      });
    }
    Ok(PackageHandle {
      name: request.name.clone(),
      version: request.version.clone(),
      path: PathBuf::from("/fake").join(&request.name),
    })
  }
}
