//! Helpers shared by the commands: loading the release, the deployment
//! manifest, and wiring the archive locator.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, warn};

use relkit_lib::archive::{RepoArchiveLocator, fill_job_templates};
use relkit_lib::manifest::{
  DeploymentManifest, NormalizeContext, RawJob, RawManifest, TemplateRef, load_manifest, normalize,
};
use relkit_lib::platform::net::detect_ip_address;
use relkit_lib::platform::paths;
use relkit_lib::release::{LoadedRelease, Release, ReleaseRepo};

/// Where the release comes from.
#[derive(Args, Debug, Clone)]
pub struct ReleaseArgs {
  /// Release repository directory
  pub repo: PathBuf,

  /// Release file to use instead of the newest release in the repository
  #[arg(short = 'r', long)]
  pub release_file: Option<PathBuf>,
}

/// Parse `NAME=ADDRESS`.
pub fn parse_network_override(s: &str) -> Result<(String, String), String> {
  let (name, address) = s
    .split_once('=')
    .ok_or_else(|| format!("expected NAME=ADDRESS, got '{}'", s))?;
  if name.is_empty() {
    return Err(format!("missing network name in '{}'", s));
  }
  address
    .parse::<IpAddr>()
    .map_err(|e| format!("invalid address '{}': {}", address, e))?;
  Ok((name.to_string(), address.to_string()))
}

pub fn load_release(args: &ReleaseArgs) -> Result<(ReleaseRepo, LoadedRelease)> {
  let repo = ReleaseRepo::open(&args.repo)
    .with_context(|| format!("Failed to open release repository: {}", args.repo.display()))?;
  let loaded = repo
    .load(args.release_file.as_deref())
    .context("Failed to load release")?;
  debug!(release = %loaded.release.name, version = %loaded.release.version, file = %loaded.path.display(), "release loaded");
  Ok((repo, loaded))
}

pub fn archive_locator(repo: &ReleaseRepo) -> RepoArchiveLocator {
  RepoArchiveLocator::new(repo.root(), paths::cache_dir())
}

/// The given address, or the detected one.
pub fn resolve_ip(explicit: Option<IpAddr>) -> Result<IpAddr> {
  match explicit {
    Some(ip) => Ok(ip),
    None => detect_ip_address().context("Failed to detect this machine's address; pass --ip-address"),
  }
}

/// Like [`resolve_ip`], settling for loopback when nothing is detected.
pub fn resolve_ip_or_loopback(explicit: Option<IpAddr>) -> IpAddr {
  resolve_ip(explicit).unwrap_or_else(|e| {
    warn!(error = %e, "using loopback address");
    IpAddr::V4(Ipv4Addr::LOCALHOST)
  })
}

/// Load and normalize the deployment manifest.
///
/// Without a manifest file, `job` becomes a job with a single template of the
/// same name.
pub fn load_deployment(manifest: Option<&Path>, job: &str, release: &Release, ip: IpAddr) -> Result<DeploymentManifest> {
  let raw = match manifest {
    Some(path) => load_manifest(path)?,
    None => RawManifest {
      jobs: Some(vec![RawJob {
        name: job.to_string(),
        templates: vec![TemplateRef::named(job)],
        resource_pool: None,
        instances: None,
        networks: None,
        properties: None,
      }]),
      ..RawManifest::default()
    },
  };

  let ctx = NormalizeContext {
    release_name: release.name.clone(),
    release_version: release.version.clone(),
    ip_address: ip,
  };
  Ok(normalize(raw, &ctx))
}

/// Read template specs the release file leaves out for `job`'s templates.
pub fn fill_templates(
  release: &mut Release,
  deployment: &DeploymentManifest,
  job: &str,
  locator: &RepoArchiveLocator,
) -> Result<()> {
  let names: Vec<&str> = deployment
    .job(job)
    .map(|j| j.templates.iter().map(|t| t.name.as_str()).collect())
    .unwrap_or_default();
  fill_job_templates(release, &names, locator).context("Failed to read job template specs")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_network_override() {
    assert_eq!(
      parse_network_override("public=1.2.3.4").unwrap(),
      ("public".to_string(), "1.2.3.4".to_string())
    );
    assert!(parse_network_override("public").is_err());
    assert!(parse_network_override("=1.2.3.4").is_err());
    assert!(parse_network_override("public=not-an-ip").is_err());
  }

  #[test]
  fn missing_manifest_synthesizes_job() {
    let release = Release {
      name: "appcloud".to_string(),
      version: "3".to_string(),
      packages: vec![],
      job_templates: vec![],
    };
    let deployment = load_deployment(None, "web", &release, "10.0.0.5".parse().unwrap()).unwrap();

    let job = deployment.job("web").unwrap();
    assert_eq!(job.templates, vec![TemplateRef::named("web")]);
    assert_eq!(deployment.releases[0].name, "appcloud");
  }
}
