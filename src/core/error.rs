use super::types::VnfState;
use thiserror::Error;

/// Error reported by a lifecycle callback.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum VnfError {
    #[error("VNF {name} does not exist")]
    NotFound { name: String },

    #[error("VNF {name} already exist")]
    AlreadyExists { name: String },

    #[error("VNF {name} cannot transition to state {to} from state {from}")]
    InvalidTransition {
        name: String,
        from: VnfState,
        to: VnfState,
    },

    #[error("VNF {name} is closed for further operations")]
    EntityClosed { name: String },

    #[error("VNF {name} failed to transition to state {state}: {source}")]
    CallbackFailed {
        name: String,
        state: VnfState,
        #[source]
        source: CallbackError,
    },

    #[error("VNF {name} operation finished without reporting a result")]
    ResultDropped { name: String },

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl VnfError {
    /// Name of the VNF the error refers to, when there is one.
    pub fn vnf_name(&self) -> Option<&str> {
        match self {
            VnfError::NotFound { name }
            | VnfError::AlreadyExists { name }
            | VnfError::InvalidTransition { name, .. }
            | VnfError::EntityClosed { name }
            | VnfError::CallbackFailed { name, .. }
            | VnfError::ResultDropped { name } => Some(name),
            VnfError::Lock(_) | VnfError::Config(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, VnfError>;

impl<T> From<std::sync::PoisonError<T>> for VnfError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}
