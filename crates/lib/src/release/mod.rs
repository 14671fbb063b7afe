//! Release repositories and the releases they contain.
//!
//! A release repository keeps final releases under `releases/` and dev
//! releases under `dev_releases/`, each with an `index.yml` listing the built
//! versions. Loading a repository picks the newest version across both
//! indices and parses the matching release file.

mod loader;
mod types;

pub use loader::*;
pub use types::*;
