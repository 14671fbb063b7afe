//! CLI output formatting utilities.
//!
//! Colored status lines and the symbols used for install decisions.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use relkit_lib::install::InstallAction;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
  pub const INSTALL: &str = "+";
  pub const SKIP: &str = "=";
}

/// First 12 characters of `hash`. Renderer-supplied hashes are arbitrary text.
pub fn truncate_hash(hash: &str) -> &str {
  hash.char_indices().nth(12).map_or(hash, |(i, _)| &hash[..i])
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// One line per package: `+ ruby 5 (install)` or `= ruby 5 (skip)`.
pub fn print_package_action(name: &str, version: &str, action: InstallAction) {
  match action {
    InstallAction::Installed => println!(
      "  {} {} {} ({})",
      symbols::INSTALL.if_supports_color(Stream::Stdout, |s| s.green()),
      name,
      version.if_supports_color(Stream::Stdout, |s| s.dimmed()),
      action
    ),
    InstallAction::Skipped => println!(
      "  {} {} {} ({})",
      symbols::SKIP.if_supports_color(Stream::Stdout, |s| s.dimmed()),
      name,
      version.if_supports_color(Stream::Stdout, |s| s.dimmed()),
      action
    ),
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_hash() {
    assert_eq!(truncate_hash("abcdef123456789"), "abcdef123456");
    assert_eq!(truncate_hash("short"), "short");
    assert_eq!(truncate_hash(""), "");
    assert_eq!(truncate_hash("aéééééééééééé"), "aééééééééééé");
    assert_eq!(truncate_hash("aéééééééé"), "aéééééééé");
  }

  #[test]
  fn test_format_duration() {
    assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
    assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
  }
}
