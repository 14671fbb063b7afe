//! Types shared by the package installer and its collaborators.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::versions::VersionStoreError;

/// What happened to a package during installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallAction {
  /// The same version was already installed.
  Skipped,
  /// The package was compiled and its version recorded.
  Installed,
}

impl fmt::Display for InstallAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      InstallAction::Skipped => write!(f, "skip"),
      InstallAction::Installed => write!(f, "install"),
    }
  }
}

/// An already installed dependency handed to the packager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyHandle {
  pub name: String,
  pub version: String,
}

/// Everything a packager needs to compile one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
  pub name: String,
  pub version: String,
  pub sha1: String,
  /// Direct dependencies, in declaration order.
  pub dependencies: Vec<DependencyHandle>,
}

/// Result of a successful compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageHandle {
  pub name: String,
  pub version: String,
  /// Where the compiled package ended up.
  pub path: PathBuf,
}

/// Failures reported by a packager.
#[derive(Debug, Error)]
pub enum PackagingError {
  /// The package archive could not be found.
  #[error("package archive not found: {0}")]
  ArchiveNotFound(String),

  /// The packaging script exited unsuccessfully.
  #[error("packaging script failed with exit code {code:?}: {output}")]
  ScriptFailed { code: Option<i32>, output: String },

  /// I/O error while preparing or running the build.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// Any other collaborator-specific failure.
  #[error("{0}")]
  Other(String),
}

/// Compiles and installs a single package.
pub trait Packager {
  fn compile(&mut self, request: &CompileRequest) -> Result<PackageHandle, PackagingError>;
}

/// Records which version of each package is installed.
pub trait InstalledVersions {
  /// Installed version of `name`, `None` if never installed.
  fn installed_version(&self, name: &str) -> Result<Option<String>, VersionStoreError>;

  /// Record `version` as the installed version of `name`.
  fn record(&mut self, name: &str, version: &str) -> Result<(), VersionStoreError>;

  /// Drop any record for `name`.
  fn forget(&mut self, name: &str) -> Result<(), VersionStoreError>;
}

/// Errors raised by the package installer.
#[derive(Debug, Error)]
pub enum InstallError {
  /// A package in the install order is not part of the release.
  #[error("unknown package '{name}'")]
  UnknownPackage { name: String },

  /// The packager failed; the remaining packages were not attempted.
  #[error("failed to compile package '{name}': {source}")]
  PackagingFailed {
    name: String,
    #[source]
    source: PackagingError,
  },

  /// The installed-version store failed.
  #[error(transparent)]
  VersionStore(#[from] VersionStoreError),
}
