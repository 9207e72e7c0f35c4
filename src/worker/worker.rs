// ============================================================================
// Entity Worker
// ============================================================================
//
// One long-lived task per VNF. It pulls work from the VNF's bounded inlet in
// submission order and runs each item through the state machine before it
// looks at the next one, so a VNF never has two administrative operations in
// flight. Work that finds the inlet full is parked per VNF and forwarded in
// order, so submission order survives backpressure.
//
// ============================================================================

use super::future::VnfPromise;
use crate::core::{AdminCommand, VnfError, VnfSnapshot};
use crate::lifecycle::{Vnf, VnfLifecycle};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, Level, event, info_span};
use uuid::Uuid;

/// One queued administrative operation.
#[derive(Debug)]
pub(crate) struct VnfWork {
    command: AdminCommand,
    promise: VnfPromise,
}

impl VnfWork {
    pub(crate) fn new(command: AdminCommand, promise: VnfPromise) -> Self {
        Self { command, promise }
    }

    #[cfg(test)]
    pub(crate) fn command(&self) -> &AdminCommand {
        &self.command
    }

    fn reject_closed(self) {
        let name = self.promise.name().to_string();
        event!(Level::DEBUG, vnf = %name, op = %self.command.op(), "vnf inlet closed, work rejected");
        self.promise.send(Err(VnfError::EntityClosed { name }));
    }
}

/// Items parked behind a full inlet, oldest first.
type Overflow = Arc<Mutex<VecDeque<VnfWork>>>;

/// Submission side of a VNF, kept in the registry.
///
/// Cloning shares the same inlet; the worker stops once the inlet is closed
/// or every handle is dropped.
#[derive(Debug, Clone)]
pub(crate) struct VnfHandle {
    instance_id: Uuid,
    name: String,
    inlet: mpsc::Sender<VnfWork>,
    overflow: Overflow,
    observer: watch::Receiver<VnfSnapshot>,
}

impl VnfHandle {
    pub(crate) fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Latest state committed by the worker.
    pub(crate) fn snapshot(&self) -> VnfSnapshot {
        self.observer.borrow().clone()
    }

    /// Enqueues without waiting, in submission order.
    ///
    /// When the inlet is full the work is parked and a forwarder task moves
    /// parked items into the inlet as room frees up. Anything submitted while
    /// items are parked goes behind them. A closed inlet resolves the work's
    /// future with `EntityClosed`.
    pub(crate) fn submit(&self, runtime: &Handle, work: VnfWork) {
        let mut parked = self.overflow.lock().unwrap_or_else(PoisonError::into_inner);
        if !parked.is_empty() {
            parked.push_back(work);
            return;
        }

        match self.inlet.try_send(work) {
            Ok(()) => {}
            Err(TrySendError::Closed(work)) => work.reject_closed(),
            Err(TrySendError::Full(work)) => {
                event!(Level::DEBUG, vnf = %self.name, "vnf inlet full, parking work");
                parked.push_back(work);
                let span = info_span!("vnf.overflow", vnf = %self.name);
                runtime.spawn(
                    forward_overflow(self.inlet.clone(), Arc::clone(&self.overflow)).instrument(span),
                );
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn parked(&self) -> usize {
        self.overflow.lock().unwrap().len()
    }
}

/// Drains parked work into the inlet, one reserved slot at a time. Runs until
/// nothing is parked; a closed inlet rejects whatever is left.
async fn forward_overflow(inlet: mpsc::Sender<VnfWork>, overflow: Overflow) {
    loop {
        let reserved = inlet.reserve().await;
        let mut parked = overflow.lock().unwrap_or_else(PoisonError::into_inner);
        match reserved {
            Ok(slot) => {
                if let Some(work) = parked.pop_front() {
                    slot.send(work);
                }
                if parked.is_empty() {
                    return;
                }
            }
            Err(_) => {
                for work in parked.drain(..) {
                    work.reject_closed();
                }
                return;
            }
        }
    }
}

/// Builds a VNF in `Init` with an inlet of `capacity` pending items.
pub(crate) fn new_vnf(
    name: &str,
    attr: &str,
    capacity: usize,
    lifecycle: Arc<dyn VnfLifecycle>,
) -> (Vnf, VnfHandle) {
    let (tx, rx) = mpsc::channel(capacity);
    let (vnf, observer) = Vnf::new(name, attr, lifecycle, rx);
    let handle = VnfHandle {
        instance_id: vnf.instance_id(),
        name: name.to_string(),
        inlet: tx,
        overflow: Arc::default(),
        observer,
    };
    (vnf, handle)
}

/// Starts the worker loop for `vnf` on `runtime`.
pub(crate) fn spawn_vnf_worker(runtime: &Handle, mut vnf: Vnf) -> JoinHandle<()> {
    let span = info_span!(
        "vnf.worker",
        vnf = %vnf.name(),
        instance = %vnf.instance_id()
    );

    runtime.spawn(
        async move {
            event!(Level::DEBUG, "vnf worker started");
            while let Some(work) = vnf.next_work().await {
                let VnfWork { command, promise } = work;
                let outcome = vnf.apply(command).await;
                promise.send(outcome);
            }
            event!(
                Level::DEBUG,
                state = %vnf.state(),
                closed = vnf.is_inlet_closed(),
                "vnf worker stopped"
            );
        }
        .instrument(span),
    )
}
