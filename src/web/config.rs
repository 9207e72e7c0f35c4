use crate::manager::{DEFAULT_INLET_CAPACITY, DEFAULT_MAX_INFLIGHT_DISPATCHES, VnfMgrConfig};
use clap::Parser;

/// Default REST listen port.
pub const DEFAULT_PORT: u16 = 8081;

/// REST server settings, from flags or `VNFMGR_*` environment variables.
#[derive(Debug, Clone, Parser)]
#[command(name = "vnfmgr")]
#[command(about = "REST front-end for the VNF lifecycle manager")]
pub struct ServerConfig {
    #[arg(long, env = "VNFMGR_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "VNFMGR_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Pending operations per VNF before callers wait
    #[arg(long, env = "VNFMGR_INLET_CAPACITY", default_value_t = DEFAULT_INLET_CAPACITY)]
    pub inlet_capacity: usize,

    /// Detached dispatch tasks allowed to run at once
    #[arg(long, env = "VNFMGR_MAX_INFLIGHT", default_value_t = DEFAULT_MAX_INFLIGHT_DISPATCHES)]
    pub max_inflight: usize,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn manager_config(&self) -> VnfMgrConfig {
        VnfMgrConfig::new()
            .inlet_capacity(self.inlet_capacity)
            .max_inflight_dispatches(self.max_inflight)
    }
}
