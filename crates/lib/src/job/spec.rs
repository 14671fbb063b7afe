//! The apply spec: everything the local agent needs to run one job instance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use crate::release::{JobTemplateDefinition, PackageDefinition};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplySpec {
  pub deployment: String,
  pub index: u32,
  pub job: JobSpec,
  pub packages: Vec<PackageSpec>,
  pub networks: BTreeMap<String, NetworkSpec>,
  pub resource_pool: String,
  pub properties: Mapping,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub configuration_hash: Option<String>,

  /// Rendered hash per template name.
  #[serde(default)]
  pub template_hashes: BTreeMap<String, String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rendered_templates_archive: Option<ArchiveHandle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
  pub name: String,
  pub templates: Vec<TemplateSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSpec {
  pub name: String,
  pub version: String,
  pub sha1: String,
}

impl From<&JobTemplateDefinition> for TemplateSpec {
  fn from(template: &JobTemplateDefinition) -> Self {
    Self {
      name: template.name.clone(),
      version: template.version.clone(),
      sha1: template.sha1.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
  pub name: String,
  pub version: String,
  pub sha1: String,
}

impl From<&PackageDefinition> for PackageSpec {
  fn from(package: &PackageDefinition) -> Self {
    Self {
      name: package.name.clone(),
      version: package.version.clone(),
      sha1: package.sha1.clone(),
    }
  }
}

/// Address settings of one network for this instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
  /// Unset for a `vip` network without an explicit address.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ip: Option<String>,

  #[serde(rename = "type")]
  pub kind: String,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub default: Vec<String>,

  #[serde(default)]
  pub cloud_properties: Mapping,
}

/// Where a rendered templates archive was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveHandle {
  pub blobstore_id: String,
  /// Hex sha256 of the archive bytes.
  pub digest: String,
}
