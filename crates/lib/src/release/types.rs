//! Release definition types.
//!
//! These mirror the release file written by release tooling:
//!
//! ```yaml
//! name: appcloud
//! version: 3+dev.2
//! packages:
//!   - name: ruby
//!     version: 5
//!     sha1: 3c1d...
//!     dependencies: [libyaml]
//! jobs:
//!   - name: web
//!     version: 2
//!     sha1: 9f0e...
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::util::yaml::string_or_number;

/// A parsed release: its packages and job templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
  pub name: String,

  #[serde(deserialize_with = "string_or_number")]
  pub version: String,

  #[serde(default)]
  pub packages: Vec<PackageDefinition>,

  /// Job templates, called `jobs` in release files.
  #[serde(default, rename = "jobs")]
  pub job_templates: Vec<JobTemplateDefinition>,
}

impl Release {
  pub fn package(&self, name: &str) -> Option<&PackageDefinition> {
    self.packages.iter().find(|p| p.name == name)
  }

  pub fn job_template(&self, name: &str) -> Option<&JobTemplateDefinition> {
    self.job_templates.iter().find(|j| j.name == name)
  }

  pub fn job_template_mut(&mut self, name: &str) -> Option<&mut JobTemplateDefinition> {
    self.job_templates.iter_mut().find(|j| j.name == name)
  }

  /// Declared dependencies of a package, `None` if the package is unknown.
  ///
  /// Shaped to be passed straight to [`crate::resolve::resolve`].
  pub fn dependencies_of(&self, name: &str) -> Option<&[String]> {
    self.package(name).map(|p| p.dependencies.as_slice())
  }
}

/// A package as declared in a release file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDefinition {
  pub name: String,

  #[serde(deserialize_with = "string_or_number")]
  pub version: String,

  #[serde(default)]
  pub sha1: String,

  #[serde(default)]
  pub dependencies: Vec<String>,
}

/// A job template as declared in a release file.
///
/// Release files usually omit `packages` and `properties`; those come from the
/// `job.MF` inside the template archive (see [`crate::archive::fill_job_templates`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTemplateDefinition {
  pub name: String,

  #[serde(deserialize_with = "string_or_number")]
  pub version: String,

  #[serde(default)]
  pub sha1: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub packages: Option<Vec<String>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub properties: Option<BTreeMap<String, PropertySchema>>,
}

impl JobTemplateDefinition {
  /// Packages this template needs at runtime; empty when unknown.
  pub fn packages(&self) -> &[String] {
    self.packages.as_deref().unwrap_or_default()
  }

  /// Whether the runtime package list is known.
  pub fn has_spec(&self) -> bool {
    self.packages.is_some()
  }
}

/// Declaration of a single job property (keyed by its dotted name).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default: Option<serde_yaml::Value>,
}
