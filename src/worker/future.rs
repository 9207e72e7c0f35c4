use crate::core::{Result, VnfError, VnfOp};
use futures::future::BoxFuture;
use std::future::IntoFuture;
use tokio::sync::oneshot;
use tracing::{Level, event};

/// Pending outcome of a dispatched VNF operation.
///
/// Returned to the caller immediately; the caller waits only when it reads
/// the result. Reading consumes the future, so a result can be taken once.
#[must_use = "a VnfFuture does nothing unless its result is read"]
#[derive(Debug)]
pub struct VnfFuture {
    name: String,
    op: VnfOp,
    result: oneshot::Receiver<Result<()>>,
}

/// Producer half of a [`VnfFuture`]. Sending consumes it.
#[derive(Debug)]
pub(crate) struct VnfPromise {
    name: String,
    result: oneshot::Sender<Result<()>>,
}

/// Creates a connected promise/future pair for one operation.
pub(crate) fn vnf_future(name: &str, op: VnfOp) -> (VnfPromise, VnfFuture) {
    let (tx, rx) = oneshot::channel();
    let promise = VnfPromise {
        name: name.to_string(),
        result: tx,
    };
    let future = VnfFuture {
        name: name.to_string(),
        op,
        result: rx,
    };
    (promise, future)
}

impl VnfFuture {
    /// A future that is already resolved with `err`.
    pub(crate) fn failed(name: &str, op: VnfOp, err: VnfError) -> Self {
        let (promise, future) = vnf_future(name, op);
        promise.send(Err(err));
        future
    }

    /// Name of the VNF the operation targets.
    pub fn id(&self) -> &str {
        &self.name
    }

    pub fn op(&self) -> VnfOp {
        self.op
    }

    /// Waits for the operation's result.
    pub async fn get(self) -> Result<()> {
        let VnfFuture { name, result, .. } = self;
        match result.await {
            Ok(outcome) => outcome,
            Err(_) => Err(VnfError::ResultDropped { name }),
        }
    }

    /// Blocking variant of [`VnfFuture::get`] for callers outside the runtime.
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_get(self) -> Result<()> {
        let VnfFuture { name, result, .. } = self;
        match result.blocking_recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(VnfError::ResultDropped { name }),
        }
    }
}

impl IntoFuture for VnfFuture {
    type Output = Result<()>;
    type IntoFuture = BoxFuture<'static, Result<()>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.get())
    }
}

impl VnfPromise {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Delivers the result. A caller that dropped its future is not an error.
    pub(crate) fn send(self, outcome: Result<()>) {
        if self.result.send(outcome).is_err() {
            event!(Level::DEBUG, vnf = %self.name, "vnf result discarded, future dropped");
        }
    }
}
