//! Packager that runs the `packaging` script shipped in each package archive.
//!
//! The archive is unpacked into a fresh compile directory and the script runs
//! there under `bash -e`, with these variables set:
//!
//! | Variable               | Value                                   |
//! |------------------------|-----------------------------------------|
//! | `BOSH_COMPILE_TARGET`  | compile directory (the script's cwd)    |
//! | `BOSH_INSTALL_TARGET`  | versioned install directory             |
//! | `BOSH_PACKAGE_NAME`    | package name                            |
//! | `BOSH_PACKAGE_VERSION` | package version                         |

use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use super::types::{CompileRequest, PackageHandle, Packager, PackagingError};
use crate::archive::{ArchiveLocator, extract_tgz};
use crate::consts::PACKAGING_SCRIPT;
use crate::platform::paths::InstallLayout;

const DEFAULT_SHELL: &str = "bash";

/// Only the tail of a failed script's output is kept in the error.
const OUTPUT_TAIL_LINES: usize = 40;

/// Compiles packages by running their packaging scripts.
pub struct ScriptPackager<L> {
  layout: InstallLayout,
  locator: L,
  shell: String,
}

impl<L: ArchiveLocator> ScriptPackager<L> {
  pub fn new(layout: InstallLayout, locator: L) -> Self {
    Self {
      layout,
      locator,
      shell: DEFAULT_SHELL.to_string(),
    }
  }

  /// Use another shell to run packaging scripts.
  pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
    self.shell = shell.into();
    self
  }

  fn run_script(&self, request: &CompileRequest, compile_dir: &Path, install_dir: &Path) -> Result<(), PackagingError> {
    debug!(shell = %self.shell, cwd = %compile_dir.display(), "spawning packaging script");

    let output = Command::new(&self.shell)
      .arg("-e")
      .arg(PACKAGING_SCRIPT)
      .current_dir(compile_dir)
      .env("BOSH_COMPILE_TARGET", compile_dir)
      .env("BOSH_INSTALL_TARGET", install_dir)
      .env("BOSH_PACKAGE_NAME", &request.name)
      .env("BOSH_PACKAGE_VERSION", &request.version)
      .output()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.is_empty() {
      debug!(package = %request.name, stdout = %stdout, "packaging stdout");
    }

    if !output.status.success() {
      let combined = format!("{}{}", stdout, stderr);
      return Err(PackagingError::ScriptFailed {
        code: output.status.code(),
        output: tail_lines(&combined, OUTPUT_TAIL_LINES),
      });
    }
    Ok(())
  }
}

impl<L: ArchiveLocator> Packager for ScriptPackager<L> {
  fn compile(&mut self, request: &CompileRequest) -> Result<PackageHandle, PackagingError> {
    let archive = self
      .locator
      .package_archive(&request.name, &request.version, &request.sha1)
      .map_err(|e| PackagingError::ArchiveNotFound(e.to_string()))?;

    let compile_dir = self.layout.compile_dir(&request.name);
    let install_dir = self.layout.package_install_dir(&request.name, &request.version);
    reset_dir(&compile_dir)?;
    reset_dir(&install_dir)?;

    info!(package = %request.name, archive = %archive.display(), "unpacking package");
    extract_tgz(&archive, &compile_dir)?;

    if !compile_dir.join(PACKAGING_SCRIPT).is_file() {
      return Err(PackagingError::Other(format!(
        "package '{}' has no {} script",
        request.name, PACKAGING_SCRIPT
      )));
    }

    self.run_script(request, &compile_dir, &install_dir)?;

    Ok(PackageHandle {
      name: request.name.clone(),
      version: request.version.clone(),
      path: install_dir,
    })
  }
}

/// Remove `dir` if present and create it empty.
fn reset_dir(dir: &Path) -> io::Result<()> {
  match fs::remove_dir_all(dir) {
    Ok(()) => {}
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(e) => return Err(e),
  }
  fs::create_dir_all(dir)
}

fn tail_lines(text: &str, n: usize) -> String {
  let lines: Vec<&str> = text.lines().collect();
  lines[lines.len().saturating_sub(n)..].join("\n")
}
