//! Implementation of the `relkit release` command.

use anyhow::Result;
use serde::Serialize;

use super::common::{ReleaseArgs, load_release};
use crate::output::{OutputFormat, print_json, print_stat, print_success};

#[derive(Serialize)]
struct ReleaseReport {
  name: String,
  version: String,
  file: String,
  packages: usize,
  jobs: usize,
}

/// Print the release that would be installed.
pub fn cmd_release(args: &ReleaseArgs, output: OutputFormat) -> Result<()> {
  let (_, loaded) = load_release(args)?;
  let report = ReleaseReport {
    name: loaded.release.name.clone(),
    version: loaded.release.version.clone(),
    file: loaded.path.display().to_string(),
    packages: loaded.release.packages.len(),
    jobs: loaded.release.job_templates.len(),
  };

  if output.is_json() {
    return print_json(&report);
  }

  print_success(&format!("{}/{}", report.name, report.version));
  print_stat("File", &report.file);
  print_stat("Packages", &report.packages.to_string());
  print_stat("Jobs", &report.jobs.to_string());
  Ok(())
}
