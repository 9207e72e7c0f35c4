use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Administrative state of a VNF.
///
/// Legal moves are listed in [`crate::lifecycle::transition`]:
/// ```text
/// Init   -> Init | Create
/// Create -> Update | Delete
/// Update -> Update | Delete
/// Delete -> Init | Create
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VnfState {
    Init,
    Create,
    Update,
    Delete,
}

impl VnfState {
    pub const ALL: [VnfState; 4] = [
        VnfState::Init,
        VnfState::Create,
        VnfState::Update,
        VnfState::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VnfState::Init => "init",
            VnfState::Create => "create",
            VnfState::Update => "update",
            VnfState::Delete => "delete",
        }
    }
}

impl fmt::Display for VnfState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of operation a caller may dispatch.
///
/// `Init` and `NonAdmin` never go through the entity worker; the remaining
/// kinds are administrative and change the entity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum VnfOp {
    Init = 0,
    Create = 1,
    Update = 2,
    Delete = 3,
    NonAdmin = 4,
}

impl VnfOp {
    /// Upper bound for numeric op codes. Not an operation.
    pub const COUNT: u8 = 5;

    pub fn as_str(&self) -> &'static str {
        match self {
            VnfOp::Init => "VNF_INIT",
            VnfOp::Create => "VNF_CREATE",
            VnfOp::Update => "VNF_UPDATE",
            VnfOp::Delete => "VNF_DELETE",
            VnfOp::NonAdmin => "VNF_RANDOM",
        }
    }

    /// Whether the dispatcher routes this kind through the entity worker.
    pub fn is_admin(&self) -> bool {
        matches!(self, VnfOp::Create | VnfOp::Update | VnfOp::Delete)
    }
}

impl fmt::Display for VnfOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for VnfOp {
    type Error = u8;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        match code {
            0 => Ok(VnfOp::Init),
            1 => Ok(VnfOp::Create),
            2 => Ok(VnfOp::Update),
            3 => Ok(VnfOp::Delete),
            4 => Ok(VnfOp::NonAdmin),
            _ => Err(code),
        }
    }
}

/// Point-in-time copy of a VNF's observable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VnfSnapshot {
    /// Unique per created instance; a re-created name gets a new id.
    pub instance_id: Uuid,
    pub name: String,
    pub attr: String,
    pub state: VnfState,
    pub created_at: DateTime<Utc>,
    pub last_transition_at: DateTime<Utc>,
}
