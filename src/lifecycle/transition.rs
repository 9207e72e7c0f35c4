// ============================================================================
// Transition Table
// ============================================================================
//
// Static legality map from the current administrative state to the states it
// may move to. Self-loops model an idempotent re-apply.
//
// ============================================================================

use crate::core::{Result, VnfError, VnfState};

/// States reachable from `from` in a single step.
pub fn next_states(from: VnfState) -> &'static [VnfState] {
    match from {
        VnfState::Init => &[VnfState::Init, VnfState::Create],
        VnfState::Create => &[VnfState::Update, VnfState::Delete],
        VnfState::Update => &[VnfState::Update, VnfState::Delete],
        VnfState::Delete => &[VnfState::Init, VnfState::Create],
    }
}

pub fn is_allowed(from: VnfState, to: VnfState) -> bool {
    next_states(from).contains(&to)
}

/// Validates a move for the named VNF.
pub fn validate_transition(name: &str, from: VnfState, to: VnfState) -> Result<()> {
    if is_allowed(from, to) {
        return Ok(());
    }
    Err(VnfError::InvalidTransition {
        name: name.to_string(),
        from,
        to,
    })
}
