//! Implementation of the `relkit install` command.
//!
//! Installs one job of the release: the packages its templates need, the
//! rendered templates, and the apply spec.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};

use relkit_lib::archive::RepoArchiveLocator;
use relkit_lib::blobstore::Blobstore;
use relkit_lib::install::{ScriptPackager, SymlinkVersions};
use relkit_lib::job::{CommandRenderer, JobCollaborators, JobInstallOptions, JobInstaller, SpecFileApplier};
use relkit_lib::platform::paths::InstallLayout;

use super::common::{ReleaseArgs, archive_locator, fill_templates, load_deployment, load_release, resolve_ip};
use crate::output::{format_duration, print_stat, print_success, truncate_hash};

pub struct InstallArgs {
  pub repo: ReleaseArgs,
  pub job: String,
  pub manifest: Option<PathBuf>,
  pub force_compile: bool,
  pub template_only: bool,
  pub networks: BTreeMap<String, String>,
  pub index: u32,
  pub ip_address: Option<IpAddr>,
  pub render_command: String,
  pub install_dir: PathBuf,
  pub work_dir: PathBuf,
}

pub fn cmd_install(args: &InstallArgs) -> Result<()> {
  let start = Instant::now();

  let (repo, loaded) = load_release(&args.repo)?;
  let mut release = loaded.release;
  let ip_address = resolve_ip(args.ip_address)?;
  let deployment = load_deployment(args.manifest.as_deref(), &args.job, &release, ip_address)?;
  let locator = archive_locator(&repo);
  fill_templates(&mut release, &deployment, &args.job, &locator)?;

  let layout = InstallLayout::new(&args.install_dir);
  layout
    .ensure_dirs()
    .with_context(|| format!("Failed to create install directories under {}", args.install_dir.display()))?;

  let mut versions = SymlinkVersions::new(layout.clone());
  let mut packager = ScriptPackager::new(layout.clone(), locator.clone());
  let renderer = command_renderer(&args.render_command, locator)?;
  let mut applier = SpecFileApplier::new(layout.spec_file());
  let blobstore = Blobstore::new(args.work_dir.join("blobstore"));

  let options = JobInstallOptions {
    index: args.index,
    ip_address,
    force_compile: args.force_compile,
  };
  let collaborators = JobCollaborators {
    versions: &mut versions,
    packager: &mut packager,
    renderer: &renderer,
    applier: &mut applier,
    blobstore: &blobstore,
  };
  let spec = JobInstaller::new(&release, &deployment, collaborators, options)
    .install_job(&args.job, args.template_only, &args.networks)
    .with_context(|| format!("Failed to install job '{}'", args.job))?;

  println!();
  print_success(&format!("Installed job {} (index {})", spec.job.name, spec.index));
  print_stat("Release", &format!("{}/{}", release.name, release.version));
  print_stat("Packages", &spec.packages.len().to_string());
  if let Some(hash) = &spec.configuration_hash {
    print_stat("Configuration", truncate_hash(hash));
  }
  print_stat("Spec", &applier.path().display().to_string());
  print_stat("Duration", &format_duration(start.elapsed()));

  Ok(())
}

/// Split a render command line into program and arguments.
fn command_renderer(command: &str, locator: RepoArchiveLocator) -> Result<CommandRenderer<RepoArchiveLocator>> {
  let mut parts = command.split_whitespace();
  let program = parts.next().context("Render command is empty")?;
  Ok(CommandRenderer::new(program, locator).with_args(parts))
}
