//! Shared utilities.
//!
//! Serde helpers for YAML documents and test helpers.

pub mod yaml;

#[cfg(test)]
pub mod testutil;
