//! relkit-lib: release resolution and installation engine
//!
//! This crate provides everything needed to install one job of a release onto
//! the local machine:
//! - `release`: locating and loading a release from a release repository
//! - `version`: picking the newest release across final and dev indices
//! - `manifest`: parsing and normalizing a deployment manifest
//! - `resolve`: ordering packages so dependencies come first
//! - `install`: idempotent package installation
//! - `job`: assembling and submitting the apply spec for a job
//! - `archive`: finding package and template archives, reading `job.MF`
//! - `blobstore`: content-addressed storage for rendered templates
//! - `platform`: install layout, path overrides, address detection

pub mod archive;
pub mod blobstore;
pub mod consts;
pub mod install;
pub mod job;
pub mod manifest;
pub mod platform;
pub mod release;
pub mod resolve;
pub mod util;
pub mod version;
