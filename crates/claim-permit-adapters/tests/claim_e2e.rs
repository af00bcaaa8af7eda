mod common;

use claim_permit_adapters::{ClaimCodec, RpcWalletAdapter};
use claim_permit_core::{ClaimError, ClaimState, TransactionIntent, TxStatus};

use common::{new_flow, new_flow_with_wallet, recipient};

#[test]
fn full_claim_cycle_reaches_success() {
    let flow = new_flow();
    let session = flow.connect().expect("connect");
    assert_eq!(session.address, Some(recipient()));
    assert_eq!(session.chain_id, Some(31337));

    flow.request_authorization(recipient()).expect("authorization");
    let intent = flow.prepare().expect("prepare");
    match &intent {
        TransactionIntent::Ready { to, input } => {
            assert_eq!(*to, flow.settings().claim_contract);
            assert_eq!(&input[..4], &ClaimCodec::CLAIM_SELECTOR[..]);
        }
        TransactionIntent::Disabled { reason } => panic!("intent disabled: {reason}"),
    }

    let pending = flow.submit(intent).expect("submit");
    assert_eq!(pending.status, TxStatus::Pending);

    let confirmed = flow.await_confirmation(pending.hash).expect("confirmation");
    assert_eq!(confirmed.status, TxStatus::Success);
    assert_eq!(confirmed.hash, pending.hash);
    assert_eq!(flow.state().expect("state"), ClaimState::Success);

    let log = flow.transition_log().expect("log");
    let states: Vec<ClaimState> = log.iter().map(|t| t.to).collect();
    assert_eq!(
        states,
        vec![ClaimState::Authorized, ClaimState::Pending, ClaimState::Success]
    );
}

#[test]
fn replayed_authorization_reverts_on_chain() {
    let wallet = RpcWalletAdapter::deterministic();

    // First cycle consumes the (recipient, claim id, nonce 0, amount) tuple.
    let first = new_flow_with_wallet(wallet.clone());
    first.connect().expect("connect first");
    first.run_claim(recipient()).expect("first claim succeeds");

    // A second flow starting from the same nonce replays the exact same
    // authorization; the chain accepts the broadcast and the claim reverts.
    let second = new_flow_with_wallet(wallet.clone());
    second.connect().expect("connect second");
    let err = second
        .run_claim(recipient())
        .expect_err("replayed claim must revert");
    assert!(matches!(err, ClaimError::TransactionReverted(_)));
    assert_eq!(second.state().expect("state"), ClaimState::Failed);
}

#[test]
fn rejected_wallet_prompt_keeps_attempt_retryable() {
    let wallet = RpcWalletAdapter::deterministic();
    let flow = new_flow_with_wallet(wallet.clone());
    flow.connect().expect("connect");

    flow.request_authorization(recipient()).expect("authorization");
    wallet.debug_reject_next_submission().expect("inject rejection");

    let intent = flow.prepare().expect("prepare");
    let err = flow.submit(intent).expect_err("declined prompt must fail");
    assert!(matches!(err, ClaimError::SubmissionRejected(_)));
    // The authorization was not consumed; the same attempt may retry.
    assert_eq!(flow.state().expect("state"), ClaimState::Authorized);

    let retry = flow.prepare().expect("prepare again");
    let pending = flow.submit(retry).expect("retry succeeds");
    let confirmed = flow.await_confirmation(pending.hash).expect("confirmation");
    assert_eq!(confirmed.status, TxStatus::Success);
}

#[test]
fn delayed_receipt_is_polled_until_it_appears() {
    let wallet = RpcWalletAdapter::deterministic();
    wallet.debug_set_receipt_delay(3).expect("set delay");
    let flow = new_flow_with_wallet(wallet);
    flow.connect().expect("connect");

    let result = flow.run_claim(recipient()).expect("claim with delayed receipt");
    assert_eq!(result.status, TxStatus::Success);
}
