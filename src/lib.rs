// ============================================================================
// VNF Manager Library
// ============================================================================

pub mod core;
pub mod lifecycle;
pub mod manager;
pub mod web;
mod worker;

// Re-export main types for convenience
pub use crate::core::{
    AdminCommand, CallbackError, Result, VnfCommand, VnfError, VnfOp, VnfSnapshot, VnfState,
};
pub use lifecycle::{CallbackResult, LoggingLifecycle, VnfLifecycle};
pub use manager::{VnfMgr, VnfMgrConfig};
pub use worker::VnfFuture;
