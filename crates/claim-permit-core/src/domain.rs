use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampMs(pub u64);

/// Which signing identity is connected, and to which chain. Owned by the
/// flow and mutated only by connect/disconnect/switch operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub connected: bool,
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
}

impl Session {
    pub fn disconnected() -> Self {
        Self::default()
    }
}

/// The exact tuple an authorization is computed over. Immutable once built;
/// one per claim attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub recipient: Address,
    pub claim_id: u64,
    pub nonce: u64,
    pub amount: U256,
}

/// ECDSA signature over the claim digest, produced by the trusted signer.
/// Valid only for the tuple it was computed over; the verifying contract
/// rejects any other tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

impl Authorization {
    pub fn is_well_formed(&self) -> bool {
        matches!(self.v, 27 | 28) && !self.r.is_zero() && !self.s.is_zero()
    }
}

/// Output of `prepare`: only a `Ready` intent may be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionIntent {
    Disabled { reason: String },
    Ready { to: Address, input: Bytes },
}

impl TransactionIntent {
    pub fn is_submittable(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub hash: B256,
    pub status: TxStatus,
}

/// Outcome observed in a mined receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Success,
    Reverted,
}
