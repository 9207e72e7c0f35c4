// ============================================================================
// VNF Manager / Dispatcher
// ============================================================================
//
// Every entry point returns a `VnfFuture` without waiting on the operation.
// Registry work happens synchronously under the registry mutex and the lock is
// released before anything can suspend. Administrative work goes through the
// VNF's ordered submit path. Non-admin callbacks run on detached tasks whose
// concurrency (not their number) is capped by the inflight semaphore.
// Create/delete bookkeeping waits on its own ungated task and never holds a
// permit.
//
// ============================================================================

use super::config::VnfMgrConfig;
use super::registry::VnfRegistry;
use crate::core::{AdminCommand, Result, VnfCommand, VnfError, VnfOp, VnfSnapshot, VnfState};
use crate::lifecycle::{LoggingLifecycle, VnfLifecycle};
use crate::worker::{
    VnfFuture, VnfHandle, VnfPromise, VnfWork, new_vnf, spawn_vnf_worker, vnf_future,
};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::{Instrument, Level, event, info_span};
use uuid::Uuid;

/// Lifecycle manager for named VNFs.
///
/// Must be constructed inside a tokio runtime; workers and detached dispatch
/// tasks are spawned onto that runtime.
///
/// # Examples
///
/// ```no_run
/// use vnfmgr::{VnfCommand, VnfMgr};
///
/// # async fn demo() -> vnfmgr::Result<()> {
/// let mgr = VnfMgr::new()?;
/// mgr.dispatch("vnf_0", VnfCommand::Create { attr: "vnf_0".into() }).get().await?;
/// mgr.dispatch("vnf_0", VnfCommand::Update { args: "v2".into() }).get().await?;
/// assert_eq!(mgr.len()?, 1);
/// # Ok(())
/// # }
/// ```
pub struct VnfMgr {
    config: VnfMgrConfig,
    registry: Arc<Mutex<VnfRegistry>>,
    lifecycle: Arc<dyn VnfLifecycle>,
    inflight: Arc<Semaphore>,
    runtime: Handle,
}

impl VnfMgr {
    /// Manager with default configuration and log-only lifecycle callbacks.
    pub fn new() -> Result<Self> {
        Self::with_lifecycle(VnfMgrConfig::default(), Arc::new(LoggingLifecycle))
    }

    pub fn with_config(config: VnfMgrConfig) -> Result<Self> {
        Self::with_lifecycle(config, Arc::new(LoggingLifecycle))
    }

    pub fn with_lifecycle(config: VnfMgrConfig, lifecycle: Arc<dyn VnfLifecycle>) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|err| {
            VnfError::Config(format!("VnfMgr must be created inside a tokio runtime: {err}"))
        })?;

        Ok(Self {
            inflight: Arc::new(Semaphore::new(config.max_inflight_dispatches)),
            config,
            registry: Arc::new(Mutex::new(VnfRegistry::new())),
            lifecycle,
            runtime,
        })
    }

    pub fn config(&self) -> &VnfMgrConfig {
        &self.config
    }

    /// Routes one operation and returns its pending result.
    pub fn dispatch(&self, name: &str, command: VnfCommand) -> VnfFuture {
        match command {
            VnfCommand::Create { attr } => self.create_vnf(name, attr),
            VnfCommand::Update { args } => self.admin_vnf(name, AdminCommand::Update(args)),
            VnfCommand::Delete { args } => self.admin_vnf(name, AdminCommand::Delete(args)),
            VnfCommand::Init => self.non_admin_vnf(name, VnfOp::Init, String::new()),
            VnfCommand::NonAdmin { args } => self.non_admin_vnf(name, VnfOp::NonAdmin, args),
        }
    }

    /// [`VnfMgr::dispatch`] for an untyped kind and string argument.
    pub fn dispatch_op(&self, name: &str, op: VnfOp, arg: impl Into<String>) -> VnfFuture {
        self.dispatch(name, VnfCommand::from_op(op, arg))
    }

    /// Dispatches one create per `(name, arg)` pair, keeping input order.
    pub fn create<N, A>(&self, names: &[N], args: &[A]) -> Vec<VnfFuture>
    where
        N: AsRef<str>,
        A: AsRef<str>,
    {
        names
            .iter()
            .zip(args)
            .map(|(name, arg)| {
                self.dispatch(
                    name.as_ref(),
                    VnfCommand::Create {
                        attr: arg.as_ref().to_string(),
                    },
                )
            })
            .collect()
    }

    /// Copy of the named VNF's observable state.
    pub fn get(&self, name: &str) -> Result<Option<VnfSnapshot>> {
        Ok(self.lock_registry()?.snapshot(name))
    }

    /// All VNFs, ordered by numeric name suffix and then by name.
    pub fn list(&self) -> Result<Vec<VnfSnapshot>> {
        Ok(self.lock_registry()?.snapshots())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock_registry()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock_registry(&self) -> Result<MutexGuard<'_, VnfRegistry>> {
        Ok(self.registry.lock()?)
    }

    /// Spawns `task` at once; it starts running only when an inflight permit
    /// is free, so at most `max_inflight_dispatches` of these run together.
    fn spawn_bounded<F>(&self, name: &str, op: VnfOp, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let inflight = Arc::clone(&self.inflight);
        let span = info_span!("vnf.dispatch", vnf = %name, %op);
        self.runtime.spawn(
            async move {
                let Ok(_permit) = inflight.acquire_owned().await else {
                    event!(Level::ERROR, "inflight semaphore closed, dropping dispatch");
                    return;
                };
                task.await;
            }
            .instrument(span),
        );
    }

    /// Spawns post-dispatch bookkeeping. It only awaits a result and touches
    /// the registry, so it runs outside the inflight limit.
    fn spawn_watcher<F>(&self, name: &str, op: VnfOp, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let span = info_span!("vnf.dispatch", vnf = %name, %op);
        self.runtime.spawn(task.instrument(span));
    }

    fn create_vnf(&self, name: &str, attr: String) -> VnfFuture {
        let (vnf, handle) = new_vnf(
            name,
            &attr,
            self.config.inlet_capacity,
            Arc::clone(&self.lifecycle),
        );
        let instance_id = handle.instance_id();

        // Queued before the handle is published, so create always runs first.
        let (inner, created) = vnf_future(name, VnfOp::Create);
        handle.submit(&self.runtime, VnfWork::new(AdminCommand::Create(attr), inner));

        {
            let mut registry = match self.lock_registry() {
                Ok(registry) => registry,
                Err(err) => return VnfFuture::failed(name, VnfOp::Create, err),
            };
            if registry.insert_if_absent(handle).is_err() {
                drop(registry);
                event!(Level::DEBUG, vnf = %name, "vnf create rejected, name in use");
                return VnfFuture::failed(
                    name,
                    VnfOp::Create,
                    VnfError::AlreadyExists {
                        name: name.to_string(),
                    },
                );
            }
        }

        spawn_vnf_worker(&self.runtime, vnf);

        let (promise, future) = vnf_future(name, VnfOp::Create);
        let registry = Arc::clone(&self.registry);
        let vnf_name = name.to_string();
        self.spawn_watcher(name, VnfOp::Create, async move {
            let outcome = created.get().await;
            if outcome.is_err() {
                forget_failed_create(&registry, &vnf_name, instance_id);
            }
            promise.send(outcome);
        });

        future
    }

    fn admin_vnf(&self, name: &str, command: AdminCommand) -> VnfFuture {
        let op = command.op();
        let is_delete = matches!(command, AdminCommand::Delete(_));

        let handle = {
            let mut registry = match self.lock_registry() {
                Ok(registry) => registry,
                Err(err) => return VnfFuture::failed(name, op, err),
            };
            let found = if is_delete {
                registry.remove(name)
            } else {
                registry.lookup(name)
            };
            match found {
                Some(handle) => handle,
                None => {
                    return VnfFuture::failed(
                        name,
                        op,
                        VnfError::NotFound {
                            name: name.to_string(),
                        },
                    );
                }
            }
        };

        let (promise, future) = vnf_future(name, op);
        if !is_delete {
            handle.submit(&self.runtime, VnfWork::new(command, promise));
            return future;
        }

        let (inner, deleted) = vnf_future(name, op);
        handle.submit(&self.runtime, VnfWork::new(command, inner));

        let registry = Arc::clone(&self.registry);
        self.spawn_watcher(name, op, async move {
            let outcome = deleted.get().await;
            if let Err(err) = &outcome {
                restore_failed_delete(&registry, handle, err);
            }
            promise.send(outcome);
        });
        future
    }

    fn non_admin_vnf(&self, name: &str, op: VnfOp, args: String) -> VnfFuture {
        let handle = match self.lock_registry().map(|registry| registry.lookup(name)) {
            Ok(Some(handle)) => handle,
            Ok(None) => {
                return VnfFuture::failed(
                    name,
                    op,
                    VnfError::NotFound {
                        name: name.to_string(),
                    },
                );
            }
            Err(err) => return VnfFuture::failed(name, op, err),
        };

        let (promise, future) = vnf_future(name, op);
        let lifecycle = Arc::clone(&self.lifecycle);
        self.spawn_bounded(name, op, async move {
            run_non_admin(lifecycle, handle, op, args, promise).await;
        });
        future
    }
}

async fn run_non_admin(
    lifecycle: Arc<dyn VnfLifecycle>,
    handle: VnfHandle,
    op: VnfOp,
    args: String,
    promise: VnfPromise,
) {
    let snapshot = handle.snapshot();
    let outcome = lifecycle
        .non_admin(&snapshot, op, &args)
        .await
        .map_err(|source| VnfError::CallbackFailed {
            name: snapshot.name.clone(),
            state: snapshot.state,
            source,
        });
    promise.send(outcome);
}

/// Frees the name of a VNF whose create callback failed, unless the name has
/// already been taken over by a newer instance.
fn forget_failed_create(registry: &Mutex<VnfRegistry>, name: &str, instance_id: Uuid) {
    match registry.lock() {
        Ok(mut registry) => {
            if registry.remove_instance(name, instance_id) {
                event!(Level::WARN, vnf = %name, "vnf create failed, entry removed");
            }
        }
        Err(err) => {
            event!(Level::ERROR, vnf = %name, error = %err, "vnf registry lock poisoned");
        }
    }
}

/// Puts a VNF back after a delete that did not commit. A VNF whose create
/// never committed stays out, so its name remains free.
fn restore_failed_delete(registry: &Mutex<VnfRegistry>, handle: VnfHandle, err: &VnfError) {
    if matches!(
        err,
        VnfError::EntityClosed { .. } | VnfError::ResultDropped { .. }
    ) {
        return;
    }

    let name = handle.name().to_string();
    if handle.snapshot().state == VnfState::Init {
        event!(Level::DEBUG, vnf = %name, "vnf delete failed before create committed, not restored");
        return;
    }

    match registry.lock() {
        Ok(mut registry) => match registry.insert_if_absent(handle) {
            Ok(()) => {
                event!(Level::WARN, vnf = %name, error = %err, "vnf delete failed, entry restored");
            }
            Err(_) => {
                event!(
                    Level::WARN,
                    vnf = %name,
                    error = %err,
                    "vnf delete failed and the name was reused, old instance dropped"
                );
            }
        },
        Err(lock_err) => {
            event!(Level::ERROR, vnf = %name, error = %lock_err, "vnf registry lock poisoned");
        }
    }
}
