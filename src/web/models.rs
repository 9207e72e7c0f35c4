use crate::core::{VnfSnapshot, VnfState};
use serde::{Deserialize, Serialize};

/// Body of create and update requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VnfRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub args: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VnfResponse {
    pub id: String,
    pub name: String,
    pub state: VnfState,
}

impl From<&VnfSnapshot> for VnfResponse {
    fn from(snapshot: &VnfSnapshot) -> Self {
        Self {
            id: snapshot.name.clone(),
            name: snapshot.name.clone(),
            state: snapshot.state,
        }
    }
}

pub type VnfResponses = Vec<VnfResponse>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
