#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use alloy::primitives::Address;

use claim_permit_adapters::{
    ClaimAdapterConfig, ClaimCodec, DigestAdapter, KeySource, LocalAuthorizer, RpcWalletAdapter,
    RuntimeProfile,
};
use claim_permit_core::{ClaimError, ClaimFlow, ClockPort};

/// Well-known devnet account #0; safe to share, never a production key.
pub const DEV_SIGNER_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

#[derive(Debug, Default)]
pub struct TestClock {
    now: AtomicU64,
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> Result<u64, ClaimError> {
        Ok(self.now.fetch_add(25, Ordering::SeqCst) + 1_739_750_400_000)
    }

    fn sleep_ms(&self, _ms: u64) {}
}

pub type TestFlow = ClaimFlow<RpcWalletAdapter, DigestAdapter, LocalAuthorizer, ClaimCodec, TestClock>;

pub fn dev_config() -> ClaimAdapterConfig {
    ClaimAdapterConfig {
        trusted_signer_key_source: KeySource::Hex(DEV_SIGNER_KEY.to_owned()),
        ..ClaimAdapterConfig::default()
    }
}

pub fn dev_signer() -> LocalAuthorizer {
    LocalAuthorizer::from_key_source(
        &KeySource::Hex(DEV_SIGNER_KEY.to_owned()),
        RuntimeProfile::Development,
    )
    .expect("valid dev signer key")
}

pub fn new_flow() -> TestFlow {
    new_flow_with_wallet(RpcWalletAdapter::deterministic())
}

pub fn new_flow_with_wallet(wallet: RpcWalletAdapter) -> TestFlow {
    let config = dev_config();
    let digest = DigestAdapter::local(config.expected_chain_id, config.verifier_contract_address);
    ClaimFlow::new(
        wallet,
        digest,
        dev_signer(),
        ClaimCodec,
        TestClock::default(),
        config.flow_settings(),
    )
}

pub fn recipient() -> Address {
    // Address of the dev signer key; the deterministic wallet's account.
    "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        .parse()
        .expect("valid recipient address")
}
