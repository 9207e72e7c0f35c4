pub mod command;
pub mod error;
pub mod types;

pub use command::{AdminCommand, VnfCommand};
pub use error::{CallbackError, Result, VnfError};
pub use types::{VnfOp, VnfSnapshot, VnfState};
