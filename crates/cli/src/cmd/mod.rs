mod common;
mod install;
mod packages;
mod plan;
mod release;

pub use common::{ReleaseArgs, parse_network_override};
pub use install::{InstallArgs, cmd_install};
pub use packages::{PackagesArgs, cmd_packages};
pub use plan::{PlanArgs, cmd_plan};
pub use release::cmd_release;
