use crate::core::{Result, VnfError};

/// Default number of pending operations a VNF inlet holds before producers wait.
pub const DEFAULT_INLET_CAPACITY: usize = 16;

/// Default bound on concurrently running detached dispatch tasks.
pub const DEFAULT_MAX_INFLIGHT_DISPATCHES: usize = 1024;

/// Manager configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VnfMgrConfig {
    /// Pending work items per VNF before submission applies backpressure
    pub inlet_capacity: usize,

    /// Detached dispatch tasks allowed to run at the same time
    pub max_inflight_dispatches: usize,
}

impl Default for VnfMgrConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl VnfMgrConfig {
    pub fn new() -> Self {
        Self {
            inlet_capacity: DEFAULT_INLET_CAPACITY,
            max_inflight_dispatches: DEFAULT_MAX_INFLIGHT_DISPATCHES,
        }
    }

    /// Set the per-VNF inlet capacity
    pub fn inlet_capacity(mut self, capacity: usize) -> Self {
        self.inlet_capacity = capacity;
        self
    }

    /// Set the detached dispatch bound
    pub fn max_inflight_dispatches(mut self, max: usize) -> Self {
        self.max_inflight_dispatches = max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.inlet_capacity == 0 {
            return Err(VnfError::Config(
                "inlet_capacity must be greater than 0".to_string(),
            ));
        }
        if self.max_inflight_dispatches == 0 {
            return Err(VnfError::Config(
                "max_inflight_dispatches must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
