use alloy::primitives::{address, Address, U256};
use claim_permit_core::FlowSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeProfile {
    Development,
    Production,
}

/// Where the trusted authorization-signing key (or service) lives. A
/// literal hex key is a development convenience only; the production
/// profile refuses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Env(String),
    Hex(String),
    Remote(String),
}

#[derive(Debug, Clone)]
pub struct ClaimAdapterConfig {
    pub rpc_url: Option<String>,
    pub claim_contract_address: Address,
    pub verifier_contract_address: Address,
    pub expected_chain_id: u64,
    pub claim_id: u64,
    pub amount: U256,
    pub nonce_start: u64,
    pub trusted_signer_key_source: KeySource,
    pub rpc_timeout_ms: u64,
    pub confirmation_poll_interval_ms: u64,
    pub confirmation_timeout_ms: u64,
    pub profile: RuntimeProfile,
}

impl Default for ClaimAdapterConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            // Deterministic first-deploy addresses on a local devnet.
            claim_contract_address: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
            verifier_contract_address: address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512"),
            expected_chain_id: 31337,
            claim_id: 1,
            amount: U256::from(10_000_000_000u64),
            nonce_start: 0,
            trusted_signer_key_source: KeySource::Env("CLAIM_PERMIT_SIGNER_KEY".to_owned()),
            rpc_timeout_ms: 15_000,
            confirmation_poll_interval_ms: 1_000,
            confirmation_timeout_ms: 120_000,
            profile: RuntimeProfile::Development,
        }
    }
}

impl ClaimAdapterConfig {
    /// Defaults overridden by `CLAIM_PERMIT_*` environment variables.
    /// Unparseable values keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("CLAIM_PERMIT_RPC_URL") {
            if !url.is_empty() {
                config.rpc_url = Some(url);
            }
        }
        if let Some(address) = env_parse::<Address>("CLAIM_PERMIT_CLAIM_CONTRACT") {
            config.claim_contract_address = address;
        }
        if let Some(address) = env_parse::<Address>("CLAIM_PERMIT_VERIFIER_CONTRACT") {
            config.verifier_contract_address = address;
        }
        if let Some(chain_id) = env_parse::<u64>("CLAIM_PERMIT_CHAIN_ID") {
            config.expected_chain_id = chain_id;
        }
        if let Some(claim_id) = env_parse::<u64>("CLAIM_PERMIT_CLAIM_ID") {
            config.claim_id = claim_id;
        }
        if let Some(amount) = env_parse::<U256>("CLAIM_PERMIT_AMOUNT") {
            config.amount = amount;
        }
        if let Some(nonce) = env_parse::<u64>("CLAIM_PERMIT_NONCE_START") {
            config.nonce_start = nonce;
        }
        if let Some(ms) = env_parse::<u64>("CLAIM_PERMIT_RPC_TIMEOUT_MS") {
            config.rpc_timeout_ms = ms;
        }
        if let Some(ms) = env_parse::<u64>("CLAIM_PERMIT_CONFIRMATION_TIMEOUT_MS") {
            config.confirmation_timeout_ms = ms;
        }
        if let Ok(profile) = std::env::var("CLAIM_PERMIT_PROFILE") {
            if profile.eq_ignore_ascii_case("production") {
                config.profile = RuntimeProfile::Production;
            }
        }
        if let Ok(url) = std::env::var("CLAIM_PERMIT_SIGNER_URL") {
            if !url.is_empty() {
                config.trusted_signer_key_source = KeySource::Remote(url);
            }
        } else if let Ok(key) = std::env::var("CLAIM_PERMIT_SIGNER_KEY_HEX") {
            if !key.is_empty() {
                config.trusted_signer_key_source = KeySource::Hex(key);
            }
        }
        config
    }

    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            claim_contract: self.claim_contract_address,
            expected_chain_id: self.expected_chain_id,
            claim_id: self.claim_id,
            amount: self.amount,
            nonce_start: self.nonce_start,
            confirmation_poll_interval_ms: self.confirmation_poll_interval_ms,
            confirmation_timeout_ms: self.confirmation_timeout_ms,
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|raw| raw.trim().parse().ok())
}
