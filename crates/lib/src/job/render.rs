//! Template rendering.
//!
//! Rendering itself happens outside this crate. [`CommandRenderer`] pipes a
//! JSON request to an external program:
//!
//! ```json
//! {"spec": { ...apply spec... },
//!  "templates": [{"name": "web", "archive": "/repo/.dev_builds/jobs/web/3.tgz"}]}
//! ```
//!
//! and expects a [`RenderedJobInstance`] as JSON on stdout.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::spec::{ApplySpec, ArchiveHandle};
use crate::archive::ArchiveLocator;
use crate::blobstore::{Blobstore, sha256_hex};

#[derive(Debug, Error)]
pub enum RenderError {
  #[error("failed to run renderer '{command}': {source}")]
  Spawn {
    command: String,
    #[source]
    source: io::Error,
  },

  #[error("renderer '{command}' exited with code {code:?}: {stderr}")]
  Failed {
    command: String,
    code: Option<i32>,
    stderr: String,
  },

  #[error("renderer '{command}' produced invalid output: {source}")]
  Output {
    command: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to encode render request: {0}")]
  Request(#[source] serde_json::Error),

  #[error("template archive unavailable: {0}")]
  Archive(String),
}

/// One rendered file, relative to the job directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedFile {
  pub path: String,
  pub content: String,
}

/// The rendered templates of one job instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedJobInstance {
  pub configuration_hash: String,

  #[serde(default)]
  pub template_hashes: BTreeMap<String, String>,

  #[serde(default)]
  pub files: Vec<RenderedFile>,
}

impl RenderedJobInstance {
  /// Pack the rendered files into a tar.gz and store it in `blobstore`.
  pub fn persist(&self, blobstore: &Blobstore) -> io::Result<ArchiveHandle> {
    let bytes = self.to_tgz()?;
    let digest = sha256_hex(&bytes);
    let blobstore_id = blobstore.put(&bytes)?;

    debug!(id = %blobstore_id, files = self.files.len(), "persisted rendered templates");
    Ok(ArchiveHandle { blobstore_id, digest })
  }

  /// Archive bytes; identical input gives identical bytes.
  fn to_tgz(&self) -> io::Result<Vec<u8>> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for file in &self.files {
      let mut header = tar::Header::new_gnu();
      header.set_size(file.content.len() as u64);
      header.set_mode(0o644);
      header.set_mtime(0);
      header.set_cksum();
      builder.append_data(&mut header, &file.path, file.content.as_bytes())?;
    }
    builder.into_inner()?.finish()
  }
}

/// Renders the templates of the job described by an apply spec.
pub trait Renderer {
  fn render(&self, spec: &ApplySpec) -> Result<RenderedJobInstance, RenderError>;
}

#[derive(Serialize)]
struct RenderRequest<'a> {
  spec: &'a ApplySpec,
  templates: Vec<TemplateArchive>,
}

#[derive(Serialize)]
struct TemplateArchive {
  name: String,
  archive: PathBuf,
}

/// Runs an external program to render templates.
pub struct CommandRenderer<L> {
  program: String,
  args: Vec<String>,
  locator: L,
}

impl<L: ArchiveLocator> CommandRenderer<L> {
  pub fn new(program: impl Into<String>, locator: L) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      locator,
    }
  }

  pub fn with_args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args = args.into_iter().map(Into::into).collect();
    self
  }

  fn request_body(&self, spec: &ApplySpec) -> Result<Vec<u8>, RenderError> {
    let templates = spec
      .job
      .templates
      .iter()
      .map(|t| {
        let archive = self
          .locator
          .job_template_archive(&t.name, &t.version, &t.sha1)
          .map_err(|e| RenderError::Archive(e.to_string()))?;
        Ok(TemplateArchive {
          name: t.name.clone(),
          archive,
        })
      })
      .collect::<Result<Vec<_>, RenderError>>()?;

    serde_json::to_vec(&RenderRequest { spec, templates }).map_err(RenderError::Request)
  }
}

impl<L: ArchiveLocator> Renderer for CommandRenderer<L> {
  fn render(&self, spec: &ApplySpec) -> Result<RenderedJobInstance, RenderError> {
    let body = self.request_body(spec)?;
    let spawn_err = |source| RenderError::Spawn {
      command: self.program.clone(),
      source,
    };

    info!(command = %self.program, job = %spec.job.name, "rendering templates");

    let mut child = Command::new(&self.program)
      .args(&self.args)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(spawn_err)?;

    // stdin is fed from its own thread while stdout and stderr drain, so
    // neither side blocks on a full pipe.
    let stdin = child.stdin.take();
    let (output, written) = thread::scope(|scope| {
      let writer = scope.spawn(move || match stdin {
        Some(mut stdin) => stdin.write_all(&body),
        None => Ok(()),
      });
      let output = child.wait_with_output();
      let written = writer
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
      (output, written)
    });
    let output = output.map_err(spawn_err)?;

    if !output.status.success() {
      return Err(RenderError::Failed {
        command: self.program.clone(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }

    // A renderer may exit without reading its whole request.
    written
      .or_else(|e| if e.kind() == io::ErrorKind::BrokenPipe { Ok(()) } else { Err(e) })
      .map_err(spawn_err)?;

    serde_json::from_slice(&output.stdout).map_err(|source| RenderError::Output {
      command: self.program.clone(),
      source,
    })
  }
}
