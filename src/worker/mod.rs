pub mod future;
#[allow(clippy::module_inception)]
mod worker;

pub use future::VnfFuture;

pub(crate) use future::{VnfPromise, vnf_future};
pub(crate) use worker::{VnfHandle, VnfWork, new_vnf, spawn_vnf_worker};
