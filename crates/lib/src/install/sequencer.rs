//! Install sequencing.
//!
//! Walks a resolved package order and installs each package that is missing
//! or installed at a different version. Installing the same release twice does
//! no packaging work the second time. The first packaging failure stops the
//! sequence: later packages may depend on the one that failed.

use tracing::{error, info};

use super::types::{CompileRequest, DependencyHandle, InstallAction, InstallError, InstalledVersions, Packager};
use crate::release::{PackageDefinition, Release};

/// Installs packages of one release.
pub struct PackageInstaller<'a> {
  release: &'a Release,
  versions: &'a mut dyn InstalledVersions,
  packager: &'a mut dyn Packager,
  force_compile: bool,
}

impl<'a> PackageInstaller<'a> {
  pub fn new(release: &'a Release, versions: &'a mut dyn InstalledVersions, packager: &'a mut dyn Packager) -> Self {
    Self {
      release,
      versions,
      packager,
      force_compile: false,
    }
  }

  /// Reinstall packages even when the installed version matches.
  pub fn force_compile(mut self, force: bool) -> Self {
    self.force_compile = force;
    self
  }

  fn definition(&self, name: &str) -> Result<&'a PackageDefinition, InstallError> {
    self.release.package(name).ok_or_else(|| InstallError::UnknownPackage {
      name: name.to_string(),
    })
  }

  /// Decide what installing `name` would do, without doing it.
  pub fn decide(&self, name: &str) -> Result<InstallAction, InstallError> {
    let package = self.definition(name)?;
    let installed = self.versions.installed_version(name)?;

    let action = if self.force_compile || installed.as_deref() != Some(package.version.as_str()) {
      InstallAction::Installed
    } else {
      InstallAction::Skipped
    };
    Ok(action)
  }

  /// Decisions for every package in `order`.
  pub fn plan<S: AsRef<str>>(&self, order: &[S]) -> Result<Vec<(String, InstallAction)>, InstallError> {
    order
      .iter()
      .map(|name| Ok((name.as_ref().to_string(), self.decide(name.as_ref())?)))
      .collect()
  }

  /// Install one package if needed.
  pub fn install_one(&mut self, name: &str) -> Result<InstallAction, InstallError> {
    let package = self.definition(name)?;

    if self.decide(name)? == InstallAction::Skipped {
      info!(package = %name, version = %package.version, "same version already installed, skipping");
      return Ok(InstallAction::Skipped);
    }

    info!(package = %name, version = %package.version, "running packaging");

    // Drop the old record first so an interrupted install is retried next run.
    self.versions.forget(name)?;

    let request = CompileRequest {
      name: package.name.clone(),
      version: package.version.clone(),
      sha1: package.sha1.clone(),
      dependencies: package
        .dependencies
        .iter()
        .filter_map(|dep| self.release.package(dep))
        .map(|dep| DependencyHandle {
          name: dep.name.clone(),
          version: dep.version.clone(),
        })
        .collect(),
    };

    match self.packager.compile(&request) {
      Ok(handle) => {
        self.versions.record(name, &package.version)?;
        info!(package = %name, version = %package.version, path = %handle.path.display(), "package installed");
        Ok(InstallAction::Installed)
      }
      Err(e) => {
        error!(package = %name, error = %e, "an error occurred while compiling package");
        Err(InstallError::PackagingFailed {
          name: name.to_string(),
          source: e,
        })
      }
    }
  }

  /// Install every package in `order`, stopping at the first failure.
  pub fn install_all<S: AsRef<str>>(&mut self, order: &[S]) -> Result<Vec<(String, InstallAction)>, InstallError> {
    info!(
      packages = ?order.iter().map(AsRef::as_ref).collect::<Vec<_>>(),
      force_compile = self.force_compile,
      "installing packages"
    );

    let mut results = Vec::with_capacity(order.len());
    for name in order {
      let name = name.as_ref();
      let action = self.install_one(name)?;
      results.push((name.to_string(), action));
    }
    Ok(results)
  }
}
