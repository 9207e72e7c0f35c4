//! Lifecycle callbacks and the per-entity state machine.
//!
//! The manager calls into a [`VnfLifecycle`] for every transition it commits.
//! Implementations carry the actual provisioning work; the manager only decides
//! whether a transition is legal and records the outcome.

pub mod machine;
pub mod transition;

use crate::core::{CallbackError, VnfOp, VnfSnapshot};
use async_trait::async_trait;
use tracing::{Level, event};

pub use machine::Vnf;

pub type CallbackResult = std::result::Result<(), CallbackError>;

/// Work performed when a VNF moves between administrative states.
///
/// Each callback sees the entity as it is *before* the transition. A returned
/// error keeps the entity in its prior state.
#[async_trait]
pub trait VnfLifecycle: Send + Sync + 'static {
    async fn init(&self, vnf: &VnfSnapshot) -> CallbackResult;

    async fn create(&self, vnf: &VnfSnapshot, attr: &str) -> CallbackResult;

    async fn update(&self, vnf: &VnfSnapshot, args: &str) -> CallbackResult;

    async fn delete(&self, vnf: &VnfSnapshot, args: &str) -> CallbackResult;

    /// Runs outside the entity worker, possibly concurrently with an
    /// administrative transition on the same entity.
    async fn non_admin(&self, vnf: &VnfSnapshot, op: VnfOp, args: &str) -> CallbackResult;
}

/// Lifecycle that only records each callback in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingLifecycle;

#[async_trait]
impl VnfLifecycle for LoggingLifecycle {
    async fn init(&self, vnf: &VnfSnapshot) -> CallbackResult {
        event!(Level::INFO, vnf = %vnf.name, "inside VNF init");
        Ok(())
    }

    async fn create(&self, vnf: &VnfSnapshot, attr: &str) -> CallbackResult {
        event!(Level::INFO, vnf = %vnf.name, attr, "inside VNF create");
        Ok(())
    }

    async fn update(&self, vnf: &VnfSnapshot, args: &str) -> CallbackResult {
        event!(Level::INFO, vnf = %vnf.name, args, "inside VNF update");
        Ok(())
    }

    async fn delete(&self, vnf: &VnfSnapshot, args: &str) -> CallbackResult {
        event!(Level::INFO, vnf = %vnf.name, args, "inside VNF delete");
        Ok(())
    }

    async fn non_admin(&self, vnf: &VnfSnapshot, op: VnfOp, args: &str) -> CallbackResult {
        event!(
            Level::INFO,
            vnf = %vnf.name,
            state = %vnf.state,
            %op,
            args,
            "inside random VNF operation"
        );
        Ok(())
    }
}
