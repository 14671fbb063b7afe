//! Serde helpers for YAML release documents.
//!
//! Release tooling writes versions unquoted, so `version: 12` arrives as a YAML
//! number while `version: 12+dev.3` arrives as a string. Both are kept as strings.

use std::fs;
use std::path::Path;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_yaml::Value;

/// Convert a scalar YAML value to its string form.
///
/// Returns `None` for mappings, sequences and null.
pub fn scalar_to_string(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Tagged(tagged) => scalar_to_string(&tagged.value),
    Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
  }
}

/// Deserialize a string field that may be written as a YAML number.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Value::deserialize(deserializer)?;
  scalar_to_string(&value).ok_or_else(|| de::Error::custom("expected a string or number"))
}

/// Errors reading a YAML document from disk.
#[derive(Debug, thiserror::Error)]
pub enum YamlFileError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: serde_yaml::Error,
  },
}

/// Read and parse a YAML file into `T`.
pub fn read_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlFileError> {
  let content = fs::read_to_string(path).map_err(|source| YamlFileError::Read {
    path: path.display().to_string(),
    source,
  })?;
  serde_yaml::from_str(&content).map_err(|source| YamlFileError::Parse {
    path: path.display().to_string(),
    source,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Deserialize)]
  struct Versioned {
    #[serde(deserialize_with = "string_or_number")]
    version: String,
  }

  #[test]
  fn numeric_version_becomes_string() {
    let v: Versioned = serde_yaml::from_str("version: 12").unwrap();
    assert_eq!(v.version, "12");
  }

  #[test]
  fn dev_version_stays_string() {
    let v: Versioned = serde_yaml::from_str("version: 12+dev.3").unwrap();
    assert_eq!(v.version, "12+dev.3");
  }

  #[test]
  fn mapping_version_is_rejected() {
    let result: Result<Versioned, _> = serde_yaml::from_str("version: {a: 1}");
    assert!(result.is_err());
  }

  #[test]
  fn read_yaml_file_reports_missing_path() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("missing.yml");
    let err = read_yaml_file::<Value>(&path).unwrap_err();
    assert!(matches!(err, YamlFileError::Read { .. }));
    assert!(err.to_string().contains("missing.yml"));
  }
}
