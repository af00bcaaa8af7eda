use crate::ports::ClaimError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClaimState {
    #[default]
    Idle,
    Authorized,
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimAction {
    Authorize,
    Discard,
    Submit,
    Confirm,
    Revert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: ClaimState,
    pub to: ClaimState,
    pub reason: &'static str,
}

/// Legal moves for a single claim attempt. `Authorized` is the only entry
/// to `Pending`; `Success` and `Failed` are terminal, a new claim needs a
/// fresh request/authorization cycle.
pub fn claim_transition(
    state: ClaimState,
    action: ClaimAction,
) -> Result<(ClaimState, StateTransition), ClaimError> {
    let (to, reason) = match (state, action) {
        (ClaimState::Idle, ClaimAction::Authorize) => {
            (ClaimState::Authorized, "authorization granted")
        }
        (ClaimState::Authorized, ClaimAction::Discard) => {
            (ClaimState::Idle, "authorization discarded")
        }
        (ClaimState::Authorized, ClaimAction::Submit) => {
            (ClaimState::Pending, "claim transaction broadcast")
        }
        (ClaimState::Pending, ClaimAction::Confirm) => (ClaimState::Success, "claim confirmed"),
        (ClaimState::Pending, ClaimAction::Revert) => (ClaimState::Failed, "claim failed"),
        (from, action) => {
            return Err(ClaimError::Validation(format!(
                "illegal claim transition: {from:?} on {action:?}"
            )))
        }
    };
    Ok((
        to,
        StateTransition {
            from: state,
            to,
            reason,
        },
    ))
}
