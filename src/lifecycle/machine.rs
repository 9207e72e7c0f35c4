// ============================================================================
// Entity State Machine
// ============================================================================
//
// A `Vnf` is owned by exactly one worker task. Nothing else holds a mutable
// reference to it: the registry and non-admin readers observe it through the
// snapshot published on every commit.
//
// ============================================================================

use super::VnfLifecycle;
use super::transition::validate_transition;
use crate::core::{AdminCommand, Result, VnfError, VnfSnapshot, VnfState};
use crate::worker::VnfWork;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{Level, event};
use uuid::Uuid;

pub struct Vnf {
    instance_id: Uuid,
    name: String,
    attr: String,
    state: VnfState,
    created_at: DateTime<Utc>,
    last_transition_at: DateTime<Utc>,
    lifecycle: Arc<dyn VnfLifecycle>,
    inlet: mpsc::Receiver<VnfWork>,
    inlet_closed: bool,
    published: watch::Sender<VnfSnapshot>,
}

impl Vnf {
    /// Creates an entity in `Init` and returns the receiver its snapshots are
    /// published on.
    pub(crate) fn new(
        name: &str,
        attr: &str,
        lifecycle: Arc<dyn VnfLifecycle>,
        inlet: mpsc::Receiver<VnfWork>,
    ) -> (Self, watch::Receiver<VnfSnapshot>) {
        let now = Utc::now();
        let snapshot = VnfSnapshot {
            instance_id: Uuid::new_v4(),
            name: name.to_string(),
            attr: attr.to_string(),
            state: VnfState::Init,
            created_at: now,
            last_transition_at: now,
        };
        let (published, observer) = watch::channel(snapshot.clone());

        let vnf = Self {
            instance_id: snapshot.instance_id,
            name: snapshot.name,
            attr: snapshot.attr,
            state: VnfState::Init,
            created_at: now,
            last_transition_at: now,
            lifecycle,
            inlet,
            inlet_closed: false,
            published,
        };
        (vnf, observer)
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> VnfState {
        self.state
    }

    /// True once a delete has been committed.
    pub fn is_inlet_closed(&self) -> bool {
        self.inlet_closed
    }

    pub fn snapshot(&self) -> VnfSnapshot {
        VnfSnapshot {
            instance_id: self.instance_id,
            name: self.name.clone(),
            attr: self.attr.clone(),
            state: self.state,
            created_at: self.created_at,
            last_transition_at: self.last_transition_at,
        }
    }

    /// Next queued work item, in submission order. `None` once the inlet is
    /// closed and drained, or every producer is gone.
    pub(crate) async fn next_work(&mut self) -> Option<VnfWork> {
        self.inlet.recv().await
    }

    /// Validates and runs one administrative transition.
    ///
    /// The state only advances when the lifecycle callback succeeds. A
    /// committed delete closes the inlet; items queued before the close are
    /// still handed out by [`Vnf::next_work`].
    pub async fn apply(&mut self, command: AdminCommand) -> Result<()> {
        let from = self.state;
        let to = command.target();

        if let Err(err) = validate_transition(&self.name, from, to) {
            event!(Level::WARN, %from, %to, "vnf transition rejected");
            return Err(err);
        }

        let current = self.snapshot();
        let outcome = match &command {
            AdminCommand::Init => self.lifecycle.init(&current).await,
            AdminCommand::Create(attr) => self.lifecycle.create(&current, attr).await,
            AdminCommand::Update(args) => self.lifecycle.update(&current, args).await,
            AdminCommand::Delete(args) => self.lifecycle.delete(&current, args).await,
        };

        if let Err(source) = outcome {
            event!(
                Level::ERROR,
                %from,
                %to,
                error = %source,
                "vnf failed to transition"
            );
            return Err(VnfError::CallbackFailed {
                name: self.name.clone(),
                state: to,
                source,
            });
        }

        self.state = to;
        self.last_transition_at = Utc::now();
        self.published.send_replace(self.snapshot());
        event!(Level::INFO, %from, %to, "vnf transitioned");

        if to == VnfState::Delete {
            self.inlet.close();
            self.inlet_closed = true;
            event!(Level::DEBUG, "vnf inlet closed");
        }
        Ok(())
    }
}
