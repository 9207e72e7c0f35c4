use super::types::{VnfOp, VnfState};

/// A dispatchable request together with its typed argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VnfCommand {
    Init,
    /// `attr` is stored on the new entity for its whole lifetime.
    Create { attr: String },
    Update { args: String },
    Delete { args: String },
    NonAdmin { args: String },
}

impl VnfCommand {
    /// Builds a command from an untyped kind and a string argument.
    pub fn from_op(op: VnfOp, arg: impl Into<String>) -> Self {
        let arg = arg.into();
        match op {
            VnfOp::Init => VnfCommand::Init,
            VnfOp::Create => VnfCommand::Create { attr: arg },
            VnfOp::Update => VnfCommand::Update { args: arg },
            VnfOp::Delete => VnfCommand::Delete { args: arg },
            VnfOp::NonAdmin => VnfCommand::NonAdmin { args: arg },
        }
    }

    pub fn op(&self) -> VnfOp {
        match self {
            VnfCommand::Init => VnfOp::Init,
            VnfCommand::Create { .. } => VnfOp::Create,
            VnfCommand::Update { .. } => VnfOp::Update,
            VnfCommand::Delete { .. } => VnfOp::Delete,
            VnfCommand::NonAdmin { .. } => VnfOp::NonAdmin,
        }
    }
}

/// A state-changing command executed by the entity worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Init,
    Create(String),
    Update(String),
    Delete(String),
}

impl AdminCommand {
    pub fn target(&self) -> VnfState {
        match self {
            AdminCommand::Init => VnfState::Init,
            AdminCommand::Create(_) => VnfState::Create,
            AdminCommand::Update(_) => VnfState::Update,
            AdminCommand::Delete(_) => VnfState::Delete,
        }
    }

    pub fn op(&self) -> VnfOp {
        match self {
            AdminCommand::Init => VnfOp::Init,
            AdminCommand::Create(_) => VnfOp::Create,
            AdminCommand::Update(_) => VnfOp::Update,
            AdminCommand::Delete(_) => VnfOp::Delete,
        }
    }
}
