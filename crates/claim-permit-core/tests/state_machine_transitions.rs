use claim_permit_core::{claim_transition, ClaimAction, ClaimState};

#[test]
fn claim_happy_path_transitions() {
    let (s1, _) = claim_transition(ClaimState::Idle, ClaimAction::Authorize).expect("idle -> authorized");
    assert_eq!(s1, ClaimState::Authorized);
    let (s2, _) = claim_transition(s1, ClaimAction::Submit).expect("authorized -> pending");
    assert_eq!(s2, ClaimState::Pending);
    let (s3, _) = claim_transition(s2, ClaimAction::Confirm).expect("pending -> success");
    assert_eq!(s3, ClaimState::Success);
}

#[test]
fn claim_revert_path_transitions() {
    let (s1, _) = claim_transition(ClaimState::Idle, ClaimAction::Authorize).expect("idle -> authorized");
    let (s2, _) = claim_transition(s1, ClaimAction::Submit).expect("authorized -> pending");
    let (s3, transition) = claim_transition(s2, ClaimAction::Revert).expect("pending -> failed");
    assert_eq!(s3, ClaimState::Failed);
    assert_eq!(transition.from, ClaimState::Pending);
    assert_eq!(transition.to, ClaimState::Failed);
}

#[test]
fn discard_returns_to_idle() {
    let (s1, _) = claim_transition(ClaimState::Idle, ClaimAction::Authorize).expect("idle -> authorized");
    let (s2, _) = claim_transition(s1, ClaimAction::Discard).expect("authorized -> idle");
    assert_eq!(s2, ClaimState::Idle);
}

#[test]
fn pending_is_only_reachable_from_authorized() {
    for state in [ClaimState::Idle, ClaimState::Pending, ClaimState::Success, ClaimState::Failed] {
        let err = claim_transition(state, ClaimAction::Submit).expect_err("must fail");
        assert!(err.to_string().contains("illegal claim transition"));
    }
}

#[test]
fn terminal_states_reject_every_action() {
    for state in [ClaimState::Success, ClaimState::Failed] {
        for action in [
            ClaimAction::Authorize,
            ClaimAction::Discard,
            ClaimAction::Submit,
            ClaimAction::Confirm,
            ClaimAction::Revert,
        ] {
            let err = claim_transition(state, action).expect_err("terminal state must reject");
            assert!(err.to_string().contains("illegal claim transition"));
        }
    }
}
