//! Manifest normalization.
//!
//! Fills every section a partial manifest leaves out so the job installer can
//! rely on a complete manifest. Defaults are deterministic, and normalizing an
//! already normalized manifest changes nothing.

use std::net::IpAddr;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::types::*;
use crate::consts::{DEFAULT_DEPLOYMENT_NAME, DEFAULT_NETWORK, DEFAULT_RESOURCE_POOL};

/// Roles given to the first network of a job bound to several networks.
const DEFAULT_NETWORK_ROLES: [&str; 2] = ["dns", "gateway"];

/// Values the defaults are derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeContext {
  pub release_name: String,
  pub release_version: String,
  /// Address of this machine, used for the synthetic default network.
  pub ip_address: IpAddr,
}

/// Complete a manifest.
///
/// Never fails: any missing section gets its default.
pub fn normalize(raw: RawManifest, ctx: &NormalizeContext) -> DeploymentManifest {
  let name = raw.name.unwrap_or_else(|| DEFAULT_DEPLOYMENT_NAME.to_string());

  let releases = raw.releases.unwrap_or_else(|| {
    vec![ReleaseRef {
      name: ctx.release_name.clone(),
      version: ctx.release_version.clone(),
    }]
  });

  let networks = raw.networks.unwrap_or_else(|| {
    debug!(ip = %ctx.ip_address, "manifest has no networks, using default network");
    vec![default_network(ctx.ip_address)]
  });

  let compilation = raw.compilation.unwrap_or_else(|| Compilation {
    workers: default_one(),
    network: DEFAULT_NETWORK.to_string(),
    cloud_properties: Mapping::new(),
  });

  let update = raw.update.unwrap_or_else(|| UpdatePolicy {
    canaries: 1,
    max_in_flight: 1,
    canary_watch_time: default_watch_time(),
    update_watch_time: default_watch_time(),
  });

  let resource_pools = raw.resource_pools.unwrap_or_else(|| vec![default_resource_pool()]);

  let jobs = raw.jobs.unwrap_or_default().into_iter().map(normalize_job).collect();

  DeploymentManifest {
    name,
    releases,
    networks,
    compilation,
    update,
    resource_pools,
    jobs,
    properties: raw.properties.unwrap_or_default(),
  }
}

fn normalize_job(job: RawJob) -> Job {
  let mut networks = job
    .networks
    .unwrap_or_else(|| vec![JobNetwork::named(DEFAULT_NETWORK)]);

  // Several networks need one of them to carry DNS and gateway.
  if networks.len() > 1 {
    networks[0].default = Some(DEFAULT_NETWORK_ROLES.iter().map(|r| r.to_string()).collect());
  }

  Job {
    name: job.name,
    templates: job.templates,
    resource_pool: job
      .resource_pool
      .unwrap_or_else(|| DEFAULT_RESOURCE_POOL.to_string()),
    instances: job.instances.unwrap_or(1),
    networks,
    properties: job.properties,
  }
}

fn default_network(ip: IpAddr) -> Network {
  let mut cloud_properties = Mapping::new();
  cloud_properties.insert(Value::from("name"), Value::from("DUMMY_VLAN"));

  Network {
    name: DEFAULT_NETWORK.to_string(),
    kind: None,
    subnets: vec![Subnet {
      range: Some(format!("{}/16", ip)),
      static_ranges: vec![format!("{} - {}", ip, ip)],
      cloud_properties,
      ..Subnet::default()
    }],
    cloud_properties: None,
  }
}

fn default_resource_pool() -> ResourcePool {
  ResourcePool {
    name: DEFAULT_RESOURCE_POOL.to_string(),
    size: Some(9999),
    network: Some(DEFAULT_NETWORK.to_string()),
    stemcell: Some(Stemcell {
      name: "dummy".to_string(),
      version: "dummy".to_string(),
    }),
    cloud_properties: Mapping::new(),
  }
}
