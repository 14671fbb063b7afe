//! Accepted shapes of a job's template list.
//!
//! Older manifests name a single template under `template`; newer ones use
//! `templates`, either as a bare name or as a list mixing bare names and
//! `{name: ...}` records:
//!
//! ```yaml
//! template: nginx
//! templates: nginx
//! templates: [nginx, {name: router, release: cf}]
//! ```
//!
//! All of them parse into `Vec<TemplateRef>`. `templates` wins when both keys
//! are present.

use serde::Deserialize;
use serde_yaml::Mapping;

use super::types::{JobNetwork, RawJob, TemplateRef};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum TemplatesField {
  One(String),
  Many(Vec<TemplateEntry>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum TemplateEntry {
  Name(String),
  Record(TemplateRef),
}

impl From<TemplateEntry> for TemplateRef {
  fn from(entry: TemplateEntry) -> Self {
    match entry {
      TemplateEntry::Name(name) => TemplateRef::named(name),
      TemplateEntry::Record(record) => record,
    }
  }
}

impl TemplatesField {
  fn into_refs(self) -> Vec<TemplateRef> {
    match self {
      TemplatesField::One(name) => vec![TemplateRef::named(name)],
      TemplatesField::Many(entries) => entries.into_iter().map(TemplateRef::from).collect(),
    }
  }
}

/// Wire form of a job, before the template fields are folded.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JobSource {
  name: String,

  #[serde(default)]
  template: Option<TemplatesField>,

  #[serde(default)]
  templates: Option<TemplatesField>,

  #[serde(default)]
  resource_pool: Option<String>,

  #[serde(default)]
  instances: Option<u32>,

  #[serde(default)]
  networks: Option<Vec<JobNetwork>>,

  #[serde(default)]
  properties: Option<Mapping>,
}

impl From<JobSource> for RawJob {
  fn from(src: JobSource) -> Self {
    let templates = src
      .templates
      .or(src.template)
      .map(TemplatesField::into_refs)
      .unwrap_or_default();

    Self {
      name: src.name,
      templates,
      resource_pool: src.resource_pool,
      instances: src.instances,
      networks: src.networks,
      properties: src.properties,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(yaml: &str) -> RawJob {
    serde_yaml::from_str(yaml).unwrap()
  }

  fn names(job: &RawJob) -> Vec<&str> {
    job.templates.iter().map(|t| t.name.as_str()).collect()
  }

  #[test]
  fn singular_template_string() {
    let job = parse("name: web\ntemplate: nginx\n");
    assert_eq!(names(&job), ["nginx"]);
  }

  #[test]
  fn singular_template_list() {
    let job = parse("name: web\ntemplate: [nginx, router]\n");
    assert_eq!(names(&job), ["nginx", "router"]);
  }

  #[test]
  fn templates_as_bare_string() {
    let job = parse("name: web\ntemplates: nginx\n");
    assert_eq!(job.templates, vec![TemplateRef::named("nginx")]);
  }

  #[test]
  fn templates_mixing_names_and_records() {
    let job = parse("name: web\ntemplates:\n  - nginx\n  - {name: router, release: cf}\n");
    assert_eq!(names(&job), ["nginx", "router"]);
    assert_eq!(job.templates[1].release.as_deref(), Some("cf"));
  }

  #[test]
  fn templates_takes_precedence_over_template() {
    let job = parse("name: web\ntemplate: old\ntemplates: [new]\n");
    assert_eq!(names(&job), ["new"]);
  }

  #[test]
  fn no_templates_is_empty() {
    let job = parse("name: web\n");
    assert!(job.templates.is_empty());
  }

  #[test]
  fn serialized_job_parses_back_unchanged() {
    let job = parse("name: web\ntemplate: nginx\ninstances: 2\nnetworks: [{name: a}]\n");
    let yaml = serde_yaml::to_string(&job).unwrap();
    assert!(!yaml.contains("template:"));
    assert_eq!(parse(&yaml), job);
  }
}
