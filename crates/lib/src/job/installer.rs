//! Installing one job of a deployment.

use std::collections::BTreeMap;
use std::io;
use std::net::IpAddr;

use thiserror::Error;
use tracing::{debug, info};

use super::apply::{ApplyError, Applier};
use super::properties::{bind_properties, merge_properties};
use super::render::{RenderError, Renderer};
use super::spec::{ApplySpec, JobSpec, NetworkSpec, PackageSpec, TemplateSpec};
use crate::blobstore::Blobstore;
use crate::consts::{MANUAL_NETWORK_TYPE, VIP_NETWORK_TYPE};
use crate::install::{InstallError, InstalledVersions, PackageInstaller, Packager};
use crate::manifest::{DeploymentManifest, Job};
use crate::release::{JobTemplateDefinition, Release};
use crate::resolve::{ResolveError, resolve};

#[derive(Debug, Error)]
pub enum JobError {
  #[error("job '{name}' is not defined in the deployment manifest")]
  UnknownJob { name: String },

  #[error("job '{job}' uses template '{template}' which is not part of the release")]
  UnknownTemplate { job: String, template: String },

  #[error("job '{job}' has several static addresses on network '{network}'; choose one with -N {network}=<address>")]
  MissingAddressOverride { job: String, network: String },

  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Install(#[from] InstallError),

  #[error("failed to render templates: {0}")]
  Render(#[from] RenderError),

  #[error("failed to store rendered templates: {0}")]
  Persist(#[source] io::Error),

  #[error("failed to apply job: {0}")]
  Apply(#[from] ApplyError),
}

/// Per-instance settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInstallOptions {
  pub index: u32,
  /// Address given to every non-`vip` network.
  pub ip_address: IpAddr,
  pub force_compile: bool,
}

/// The collaborators a job install drives.
pub struct JobCollaborators<'a> {
  pub versions: &'a mut dyn InstalledVersions,
  pub packager: &'a mut dyn Packager,
  pub renderer: &'a dyn Renderer,
  pub applier: &'a mut dyn Applier,
  pub blobstore: &'a Blobstore,
}

/// Installs a job from a release according to a deployment manifest.
pub struct JobInstaller<'a> {
  release: &'a Release,
  manifest: &'a DeploymentManifest,
  collaborators: JobCollaborators<'a>,
  options: JobInstallOptions,
}

impl<'a> JobInstaller<'a> {
  pub fn new(
    release: &'a Release,
    manifest: &'a DeploymentManifest,
    collaborators: JobCollaborators<'a>,
    options: JobInstallOptions,
  ) -> Self {
    Self {
      release,
      manifest,
      collaborators,
      options,
    }
  }

  /// Install `job_name` and submit its apply spec.
  ///
  /// `overrides` maps network names to explicit addresses. With
  /// `template_only`, packages are resolved but not installed.
  pub fn install_job(
    &mut self,
    job_name: &str,
    template_only: bool,
    overrides: &BTreeMap<String, String>,
  ) -> Result<ApplySpec, JobError> {
    let job = find_job(self.manifest, job_name)?;
    check_address_overrides(job, overrides)?;

    let templates = job_templates(self.release, job)?;
    let order = package_order(self.release, job)?;
    info!(job = %job_name, packages = ?order, template_only, "installing job");

    if !template_only {
      PackageInstaller::new(
        self.release,
        &mut *self.collaborators.versions,
        &mut *self.collaborators.packager,
      )
      .force_compile(self.options.force_compile)
      .install_all(&order)?;
    }

    let mut spec = self.build_spec(job, &templates, &order, overrides);

    let rendered = self.collaborators.renderer.render(&spec)?;
    let archive = rendered
      .persist(self.collaborators.blobstore)
      .map_err(JobError::Persist)?;
    debug!(job = %job_name, configuration_hash = %rendered.configuration_hash, "templates rendered");

    spec.configuration_hash = Some(rendered.configuration_hash);
    spec.template_hashes = rendered.template_hashes;
    spec.rendered_templates_archive = Some(archive);

    self.collaborators.applier.apply(&spec)?;
    info!(job = %job_name, index = spec.index, "job installed");
    Ok(spec)
  }

  fn build_spec(
    &self,
    job: &Job,
    templates: &[&JobTemplateDefinition],
    order: &[String],
    overrides: &BTreeMap<String, String>,
  ) -> ApplySpec {
    let packages = order
      .iter()
      .filter_map(|name| self.release.package(name))
      .map(PackageSpec::from)
      .collect();

    let source = match &job.properties {
      Some(own) => merge_properties(&self.manifest.properties, own),
      None => self.manifest.properties.clone(),
    };

    ApplySpec {
      deployment: self.manifest.name.clone(),
      index: self.options.index,
      job: JobSpec {
        name: job.name.clone(),
        templates: templates.iter().map(|t| TemplateSpec::from(*t)).collect(),
      },
      packages,
      networks: self.networks(job, overrides),
      resource_pool: job.resource_pool.clone(),
      properties: bind_properties(templates, &source),
      configuration_hash: None,
      template_hashes: BTreeMap::new(),
      rendered_templates_archive: None,
    }
  }

  fn networks(&self, job: &Job, overrides: &BTreeMap<String, String>) -> BTreeMap<String, NetworkSpec> {
    job
      .networks
      .iter()
      .map(|binding| {
        let network = self.manifest.network(&binding.name);
        let kind = network
          .and_then(|n| n.kind.clone())
          .unwrap_or_else(|| MANUAL_NETWORK_TYPE.to_string());

        let ip = if kind == VIP_NETWORK_TYPE {
          overrides.get(&binding.name).cloned()
        } else {
          Some(self.options.ip_address.to_string())
        };

        let cloud_properties = network
          .and_then(|n| {
            n.cloud_properties
              .clone()
              .or_else(|| n.subnets.first().map(|s| s.cloud_properties.clone()))
          })
          .unwrap_or_default();

        let spec = NetworkSpec {
          ip,
          kind,
          default: binding.default.clone().unwrap_or_default(),
          cloud_properties,
        };
        (binding.name.clone(), spec)
      })
      .collect()
  }
}

fn find_job<'m>(manifest: &'m DeploymentManifest, name: &str) -> Result<&'m Job, JobError> {
  manifest.job(name).ok_or_else(|| JobError::UnknownJob { name: name.to_string() })
}

fn check_address_overrides(job: &Job, overrides: &BTreeMap<String, String>) -> Result<(), JobError> {
  match job
    .networks
    .iter()
    .find(|n| n.static_ip_count() > 1 && !overrides.contains_key(&n.name))
  {
    Some(network) => Err(JobError::MissingAddressOverride {
      job: job.name.clone(),
      network: network.name.clone(),
    }),
    None => Ok(()),
  }
}

fn job_templates<'r>(release: &'r Release, job: &Job) -> Result<Vec<&'r JobTemplateDefinition>, JobError> {
  job
    .templates
    .iter()
    .map(|t| {
      release.job_template(&t.name).ok_or_else(|| JobError::UnknownTemplate {
        job: job.name.clone(),
        template: t.name.clone(),
      })
    })
    .collect()
}

/// Packages a job needs, dependencies first.
///
/// The roots are the packages of the job's templates in first-appearance
/// order; the resolver adds their transitive dependencies.
pub fn package_order(release: &Release, job: &Job) -> Result<Vec<String>, JobError> {
  let mut roots: Vec<&str> = Vec::new();
  for template in job_templates(release, job)? {
    for package in template.packages() {
      if !roots.contains(&package.as_str()) {
        roots.push(package.as_str());
      }
    }
  }
  Ok(resolve(&roots, |name| release.dependencies_of(name))?)
}

/// Like [`package_order`], looking the job up by name.
pub fn job_package_order(release: &Release, manifest: &DeploymentManifest, job_name: &str) -> Result<Vec<String>, JobError> {
  package_order(release, find_job(manifest, job_name)?)
}
