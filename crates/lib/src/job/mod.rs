//! Job installation.
//!
//! A job is a named set of templates from the deployment manifest. Installing
//! it means installing the packages its templates need, building the apply
//! spec for this instance, rendering the templates, and handing the spec to an
//! [`Applier`].

mod apply;
mod installer;
mod properties;
mod render;
mod spec;

pub use apply::*;
pub use installer::*;
pub use properties::*;
pub use render::*;
pub use spec::*;
