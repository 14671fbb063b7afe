//! Implementation of the `relkit packages` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use relkit_lib::install::{InstallAction, PackageInstaller, ScriptPackager, SymlinkVersions};
use relkit_lib::platform::paths::InstallLayout;
use relkit_lib::resolve::resolve;

use super::common::{ReleaseArgs, archive_locator, load_release};
use crate::output::{print_package_action, print_success};

pub struct PackagesArgs {
  pub repo: ReleaseArgs,
  pub packages: Vec<String>,
  pub no_dependency: bool,
  pub force_compile: bool,
  pub install_dir: PathBuf,
}

/// Install the named packages, with their dependencies unless told otherwise.
pub fn cmd_packages(args: &PackagesArgs) -> Result<()> {
  let (repo, loaded) = load_release(&args.repo)?;
  let release = loaded.release;

  let order = if args.no_dependency {
    args.packages.clone()
  } else {
    resolve(&args.packages, |name| release.dependencies_of(name)).context("Failed to resolve package dependencies")?
  };

  let layout = InstallLayout::new(&args.install_dir);
  layout
    .ensure_dirs()
    .with_context(|| format!("Failed to create install directories under {}", args.install_dir.display()))?;

  let mut versions = SymlinkVersions::new(layout.clone());
  let mut packager = ScriptPackager::new(layout, archive_locator(&repo));
  let results = PackageInstaller::new(&release, &mut versions, &mut packager)
    .force_compile(args.force_compile)
    .install_all(&order)
    .context("Package installation failed")?;

  let installed = results.iter().filter(|(_, a)| *a == InstallAction::Installed).count();
  print_success(&format!("{} package(s) installed, {} unchanged", installed, results.len() - installed));
  for (name, action) in &results {
    let version = release.package(name).map_or("", |p| p.version.as_str());
    print_package_action(name, version, *action);
  }

  Ok(())
}
