//! Shared test helpers for CLI integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

pub const RELEASE_VERSION: &str = "1+dev.1";

const RELEASE_FILE: &str = r#"
name: hello
version: 1+dev.1
packages:
  - name: libfoo
    version: 1
    sha1: aaa
    dependencies: []
  - name: app
    version: 2
    sha1: bbb
    dependencies: [libfoo]
jobs:
  - name: web
    version: 1
    sha1: ccc
"#;

const WEB_JOB_MF: &str = r#"
name: web
templates:
  web_ctl.erb: bin/web_ctl
packages:
  - app
properties:
  web.port:
    default: 8080
"#;

const RENDERED: &str =
  r#"{"configuration_hash":"cfg123","template_hashes":{"web":"h1"},"files":[{"path":"web/bin/web_ctl","content":"run"}]}"#;

/// Get a Command for the relkit binary.
pub fn relkit_cmd() -> Command {
  cargo_bin_cmd!("relkit")
}

/// Write a gzipped tarball holding `(name, content, mode)` entries.
pub fn write_tgz(path: &Path, entries: &[(&str, &str, u32)]) {
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  let file = fs::File::create(path).unwrap();
  let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
  for (name, content, mode) in entries {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(*mode);
    header.set_cksum();
    builder.append_data(&mut header, name, content.as_bytes()).unwrap();
  }
  builder.into_inner().unwrap().finish().unwrap();
}

/// Isolated release repository plus install and work directories.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// A dev release `hello/1+dev.1` with packages `libfoo` and `app -> libfoo`
  /// and a job template `web` needing `app`.
  pub fn new() -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write_file("repo/config/dev.yml", "dev_name: hello\n");
    env.write_file(
      "repo/dev_releases/hello/index.yml",
      &format!("builds:\n  abc123:\n    version: {}\n", RELEASE_VERSION),
    );
    env.write_file(&format!("repo/dev_releases/hello/hello-{}.yml", RELEASE_VERSION), RELEASE_FILE);

    let builds = env.repo().join(".dev_builds");
    write_tgz(
      &builds.join("packages/libfoo/1.tgz"),
      &[("./packaging", "echo libfoo > \"$BOSH_INSTALL_TARGET/marker\"\n", 0o755)],
    );
    write_tgz(
      &builds.join("packages/app/2.tgz"),
      &[("./packaging", "echo \"$BOSH_PACKAGE_NAME $BOSH_PACKAGE_VERSION\" > \"$BOSH_INSTALL_TARGET/marker\"\n", 0o755)],
    );
    write_tgz(
      &builds.join("jobs/web/1.tgz"),
      &[("./job.MF", WEB_JOB_MF, 0o644), ("./templates/web_ctl.erb", "run", 0o644)],
    );

    env.write_file("render.sh", &format!("cat > /dev/null\necho '{}'\n", RENDERED));
    env
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
  }

  pub fn repo(&self) -> PathBuf {
    self.temp.path().join("repo")
  }

  pub fn install_dir(&self) -> PathBuf {
    self.temp.path().join("install")
  }

  pub fn work_dir(&self) -> PathBuf {
    self.temp.path().join("work")
  }

  pub fn render_command(&self) -> String {
    format!("sh {}", self.temp.path().join("render.sh").display())
  }

  /// A relkit command isolated to this environment.
  pub fn cmd(&self) -> Command {
    let mut cmd = relkit_cmd();
    cmd
      .env("RELKIT_INSTALL_DIR", self.install_dir())
      .env("RELKIT_WORK_DIR", self.work_dir())
      .env("RELKIT_CACHE_DIR", self.temp.path().join("cache"))
      .env("RELKIT_RENDER_COMMAND", self.render_command())
      .env_remove("RUST_LOG");
    cmd
  }

  /// `relkit install <repo> <job> --ip-address 10.0.0.5 ...`
  pub fn install(&self, job: &str, extra: &[&str]) -> Command {
    let mut cmd = self.cmd();
    cmd
      .arg("install")
      .arg(self.repo())
      .arg(job)
      .args(["--ip-address", "10.0.0.5"])
      .args(extra);
    cmd
  }

  pub fn read_spec(&self) -> serde_json::Value {
    let content = fs::read_to_string(self.install_dir().join("bosh/spec.json")).unwrap();
    serde_json::from_str(&content).unwrap()
  }

  pub fn installed_link(&self, package: &str) -> PathBuf {
    self.install_dir().join("packages").join(package)
  }
}
