use alloy::primitives::{Address, Bytes, B256, U256};
use thiserror::Error;

use crate::domain::{Authorization, ClaimRequest, ReceiptStatus};

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("no signing identity connected")]
    WalletUnavailable,
    #[error("session is on chain {actual}, expected chain {expected}")]
    NetworkMismatch { expected: u64, actual: u64 },
    #[error("authorization unobtainable: {0}")]
    AuthorizationUnobtainable(String),
    #[error("submission rejected: {0}")]
    SubmissionRejected(String),
    #[error("transaction reverted: {0}")]
    TransactionReverted(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("policy error: {0}")]
    Policy(String),
}

/// The user-controlled signing identity and its chain connection.
pub trait WalletPort {
    fn request_accounts(&self) -> Result<Vec<Address>, ClaimError>;
    fn chain_id(&self) -> Result<u64, ClaimError>;
    fn switch_chain(&self, target: u64) -> Result<(), ClaimError>;
    fn send_transaction(&self, to: Address, input: Bytes) -> Result<B256, ClaimError>;
    fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptStatus>, ClaimError>;
}

/// Produces the claim digest. Must reproduce, byte for byte, the digest the
/// verifying contract recomputes on-chain.
pub trait VerifierPort {
    fn claim_digest(&self, request: &ClaimRequest) -> Result<B256, ClaimError>;
}

/// The trusted signer. Remote service in production; a local key in the demo.
pub trait AuthorizerPort {
    fn sign_digest(&self, digest: B256) -> Result<Authorization, ClaimError>;
}

/// Calldata encoding for the claim contract's `claim` entry point.
pub trait CodecPort {
    fn encode_claim(
        &self,
        claim_id: u64,
        amount: U256,
        authorization: &Authorization,
    ) -> Result<Bytes, ClaimError>;
}

pub trait ClockPort {
    fn now_ms(&self) -> Result<u64, ClaimError>;
    fn sleep_ms(&self, ms: u64);
}
