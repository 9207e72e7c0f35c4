pub mod config;
mod dispatcher;
mod registry;

pub use config::{DEFAULT_INLET_CAPACITY, DEFAULT_MAX_INFLIGHT_DISPATCHES, VnfMgrConfig};
pub use dispatcher::VnfMgr;
pub use registry::compare_vnf_names;
