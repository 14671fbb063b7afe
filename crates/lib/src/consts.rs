pub const APP_NAME: &str = "relkit";

/// Name of the synthetic network and resource pool used when a manifest omits them.
pub const DEFAULT_NETWORK: &str = "default";
pub const DEFAULT_RESOURCE_POOL: &str = "default";

/// Deployment name used when a manifest omits one.
pub const DEFAULT_DEPLOYMENT_NAME: &str = "dummy";

/// Prefix of the build suffix carried by dev releases (`12+dev.3`).
pub const DEV_SUFFIX_PREFIX: &str = "dev.";

/// Network type that only receives an address when one is given explicitly.
pub const VIP_NETWORK_TYPE: &str = "vip";

/// Network type assumed when a network does not declare one.
pub const MANUAL_NETWORK_TYPE: &str = "manual";

/// Name of the job spec file inside a job template archive.
pub const JOB_MANIFEST_FILE: &str = "job.MF";

/// Name of the packaging script inside a package archive.
pub const PACKAGING_SCRIPT: &str = "packaging";
