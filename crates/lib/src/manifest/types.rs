//! Deployment manifest types.
//!
//! [`RawManifest`] is what a manifest file parses into; [`DeploymentManifest`]
//! is the normalized form where nothing is optional any more. The sections
//! shared by both (networks, pools, ...) are plain structs.

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use super::legacy::JobSource;
use crate::util::yaml::string_or_number;

/// A release the deployment uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseRef {
  pub name: String,

  #[serde(deserialize_with = "string_or_number")]
  pub version: String,
}

/// A network available to the deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
  pub name: String,

  /// `manual` when absent; `vip` and `dynamic` are the other kinds.
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,

  #[serde(default)]
  pub subnets: Vec<Subnet>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cloud_properties: Option<Mapping>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subnet {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub range: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub gateway: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dns: Option<Vec<String>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reserved: Option<Vec<String>>,

  /// Static address ranges, e.g. `10.0.0.5 - 10.0.0.9`.
  #[serde(rename = "static", default, skip_serializing_if = "Vec::is_empty")]
  pub static_ranges: Vec<String>,

  #[serde(default)]
  pub cloud_properties: Mapping,
}

/// Compilation worker settings. Unused locally but part of a complete manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compilation {
  #[serde(default = "default_one")]
  pub workers: u32,

  #[serde(default = "default_network_name")]
  pub network: String,

  #[serde(default)]
  pub cloud_properties: Mapping,
}

/// Rollout policy. Unused locally but part of a complete manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePolicy {
  #[serde(default = "default_one")]
  pub canaries: u32,

  #[serde(default = "default_one")]
  pub max_in_flight: u32,

  #[serde(default = "default_watch_time", deserialize_with = "string_or_number")]
  pub canary_watch_time: String,

  #[serde(default = "default_watch_time", deserialize_with = "string_or_number")]
  pub update_watch_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePool {
  pub name: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub size: Option<u32>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub network: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub stemcell: Option<Stemcell>,

  #[serde(default)]
  pub cloud_properties: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stemcell {
  pub name: String,

  #[serde(deserialize_with = "string_or_number")]
  pub version: String,
}

/// A template bound to a job, always in record form once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
  pub name: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub release: Option<String>,
}

impl TemplateRef {
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      release: None,
    }
  }
}

/// A job's attachment to a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobNetwork {
  pub name: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub static_ips: Option<Vec<String>>,

  /// Roles this network provides, e.g. `[dns, gateway]`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default: Option<Vec<String>>,
}

impl JobNetwork {
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      static_ips: None,
      default: None,
    }
  }

  pub fn static_ip_count(&self) -> usize {
    self.static_ips.as_ref().map_or(0, Vec::len)
  }
}

/// A job as written in a manifest file.
///
/// `template`/`templates` in any of their accepted shapes are folded into
/// `templates` while parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "JobSource")]
pub struct RawJob {
  pub name: String,

  pub templates: Vec<TemplateRef>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub resource_pool: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub instances: Option<u32>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub networks: Option<Vec<JobNetwork>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub properties: Option<Mapping>,
}

/// A manifest as parsed from disk; any section may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawManifest {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub releases: Option<Vec<ReleaseRef>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub networks: Option<Vec<Network>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub compilation: Option<Compilation>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub update: Option<UpdatePolicy>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub resource_pools: Option<Vec<ResourcePool>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub jobs: Option<Vec<RawJob>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub properties: Option<Mapping>,
}

/// A job in a normalized manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
  pub name: String,
  pub templates: Vec<TemplateRef>,
  pub resource_pool: String,
  pub instances: u32,
  pub networks: Vec<JobNetwork>,

  /// Job-level properties; the manifest's global properties apply when absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub properties: Option<Mapping>,
}

/// A normalized manifest: every section present, every template a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentManifest {
  pub name: String,
  pub releases: Vec<ReleaseRef>,
  pub networks: Vec<Network>,
  pub compilation: Compilation,
  pub update: UpdatePolicy,
  pub resource_pools: Vec<ResourcePool>,
  pub jobs: Vec<Job>,

  #[serde(default)]
  pub properties: Mapping,
}

impl DeploymentManifest {
  pub fn job(&self, name: &str) -> Option<&Job> {
    self.jobs.iter().find(|j| j.name == name)
  }

  pub fn network(&self, name: &str) -> Option<&Network> {
    self.networks.iter().find(|n| n.name == name)
  }
}

impl From<Job> for RawJob {
  fn from(job: Job) -> Self {
    Self {
      name: job.name,
      templates: job.templates,
      resource_pool: Some(job.resource_pool),
      instances: Some(job.instances),
      networks: Some(job.networks),
      properties: job.properties,
    }
  }
}

impl From<DeploymentManifest> for RawManifest {
  fn from(m: DeploymentManifest) -> Self {
    Self {
      name: Some(m.name),
      releases: Some(m.releases),
      networks: Some(m.networks),
      compilation: Some(m.compilation),
      update: Some(m.update),
      resource_pools: Some(m.resource_pools),
      jobs: Some(m.jobs.into_iter().map(RawJob::from).collect()),
      properties: Some(m.properties),
    }
  }
}

pub(crate) fn default_one() -> u32 {
  1
}

pub(crate) fn default_network_name() -> String {
  crate::consts::DEFAULT_NETWORK.to_string()
}

pub(crate) fn default_watch_time() -> String {
  "1-2".to_string()
}
