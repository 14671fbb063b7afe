//! Release version selection.
//!
//! Release repositories keep two indices: final releases (`"12"`) and dev
//! releases (`"12+dev.3"`). Both are merged and the newest version is picked
//! by comparing the numeric major first and the dev counter second, where a
//! final release counts as dev counter 0.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

use crate::consts::DEV_SUFFIX_PREFIX;

/// Errors raised while parsing or selecting release versions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
  /// No version identifiers were available to choose from.
  #[error("no release found")]
  NoReleaseFound,

  /// A version identifier is neither `<major>` nor `<major>+dev.<n>`.
  #[error("invalid release version '{version}': {reason}")]
  InvalidFormat { version: String, reason: String },
}

/// A parsed release version identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion {
  raw: String,
  major: u64,
  dev: Option<u64>,
}

impl ReleaseVersion {
  /// Parse `"<major>"` or `"<major>+dev.<n>"`.
  pub fn parse(raw: &str) -> Result<Self, VersionError> {
    let invalid = |reason: &str| VersionError::InvalidFormat {
      version: raw.to_string(),
      reason: reason.to_string(),
    };

    let (major, dev) = match raw.split_once('+') {
      Some((major, suffix)) => {
        let counter = suffix
          .strip_prefix(DEV_SUFFIX_PREFIX)
          .ok_or_else(|| invalid("suffix must be 'dev.<n>'"))?;
        let counter = parse_number(counter).ok_or_else(|| invalid("dev counter is not a number"))?;
        (major, Some(counter))
      }
      None => (raw, None),
    };

    let major = parse_number(major).ok_or_else(|| invalid("major version is not a number"))?;

    Ok(Self {
      raw: raw.to_string(),
      major,
      dev,
    })
  }

  pub fn as_str(&self) -> &str {
    &self.raw
  }

  pub fn major(&self) -> u64 {
    self.major
  }

  /// Dev counter, `None` for final releases.
  pub fn dev(&self) -> Option<u64> {
    self.dev
  }

  pub fn is_dev(&self) -> bool {
    self.dev.is_some()
  }

  /// The two-key ordering: major, then dev counter with finals as 0.
  fn sort_key(&self) -> (u64, u64) {
    (self.major, self.dev.unwrap_or(0))
  }
}

impl fmt::Display for ReleaseVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.raw)
  }
}

impl Ord for ReleaseVersion {
  fn cmp(&self, other: &Self) -> Ordering {
    // Exact key ties ("3" vs "3+dev.0") fall back to dev-over-final and then the
    // raw text so the result never depends on input order.
    self
      .sort_key()
      .cmp(&other.sort_key())
      .then_with(|| self.is_dev().cmp(&other.is_dev()))
      .then_with(|| self.raw.cmp(&other.raw))
  }
}

impl PartialOrd for ReleaseVersion {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

fn parse_number(s: &str) -> Option<u64> {
  if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  s.parse().ok()
}

/// Pick the newest version among `identifiers`.
///
/// Every identifier is validated, so a malformed entry fails the selection
/// even when a newer well-formed one exists.
pub fn select_newest<I, S>(identifiers: I) -> Result<String, VersionError>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut newest: Option<ReleaseVersion> = None;

  for id in identifiers {
    let version = ReleaseVersion::parse(id.as_ref())?;
    if newest.as_ref().is_none_or(|current| version > *current) {
      newest = Some(version);
    }
  }

  newest.map(|v| v.raw).ok_or(VersionError::NoReleaseFound)
}
