//! Package installation.
//!
//! Installs packages in resolved order, skipping any package already installed
//! at the release's version. Compilation itself is delegated to a [`Packager`];
//! which version is installed is tracked by an [`InstalledVersions`] store.

mod script;
mod sequencer;
mod types;
mod versions;

pub use script::*;
pub use sequencer::*;
pub use types::*;
pub use versions::*;
