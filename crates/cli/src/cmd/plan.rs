//! Implementation of the `relkit plan` command.
//!
//! Shows the packages a job needs in install order and what installing would
//! do to each, without touching the install directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use relkit_lib::install::{InstallAction, PackageInstaller, ScriptPackager, SymlinkVersions};
use relkit_lib::job::job_package_order;
use relkit_lib::platform::paths::InstallLayout;

use super::common::{
  ReleaseArgs, archive_locator, fill_templates, load_deployment, load_release, resolve_ip_or_loopback,
};
use crate::output::{OutputFormat, print_info, print_json, print_package_action};

pub struct PlanArgs {
  pub repo: ReleaseArgs,
  pub job: String,
  pub manifest: Option<PathBuf>,
  pub force_compile: bool,
  pub install_dir: PathBuf,
}

#[derive(Serialize)]
struct PlannedPackage {
  name: String,
  version: String,
  action: String,
}

#[derive(Serialize)]
struct PlanReport {
  release: String,
  version: String,
  job: String,
  packages: Vec<PlannedPackage>,
}

pub fn cmd_plan(args: &PlanArgs, output: OutputFormat) -> Result<()> {
  let (repo, loaded) = load_release(&args.repo)?;
  let mut release = loaded.release;
  let deployment = load_deployment(args.manifest.as_deref(), &args.job, &release, resolve_ip_or_loopback(None))?;
  let locator = archive_locator(&repo);
  fill_templates(&mut release, &deployment, &args.job, &locator)?;

  let order = job_package_order(&release, &deployment, &args.job)
    .with_context(|| format!("Failed to resolve packages of job '{}'", args.job))?;

  let layout = InstallLayout::new(&args.install_dir);
  let mut versions = SymlinkVersions::new(layout.clone());
  let mut packager = ScriptPackager::new(layout, locator);
  let decisions = PackageInstaller::new(&release, &mut versions, &mut packager)
    .force_compile(args.force_compile)
    .plan(&order)
    .context("Failed to read installed packages")?;

  let report = PlanReport {
    release: release.name.clone(),
    version: release.version.clone(),
    job: args.job.clone(),
    packages: decisions
      .iter()
      .map(|(name, action)| PlannedPackage {
        name: name.clone(),
        version: release.package(name).map_or_else(String::new, |p| p.version.clone()),
        action: action.to_string(),
      })
      .collect(),
  };

  if output.is_json() {
    return print_json(&report);
  }

  print_info(&format!(
    "Job {} from {}/{}: {} package(s)",
    report.job,
    report.release,
    report.version,
    report.packages.len()
  ));
  for ((_, action), package) in decisions.iter().zip(&report.packages) {
    print_package_action(&package.name, &package.version, *action);
  }
  let pending = decisions.iter().filter(|(_, a)| *a == InstallAction::Installed).count();
  println!();
  println!("{} to install, {} unchanged", pending, decisions.len() - pending);

  Ok(())
}
