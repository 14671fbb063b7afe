//! Host-specific paths and discovery.

pub mod net;
pub mod paths;
