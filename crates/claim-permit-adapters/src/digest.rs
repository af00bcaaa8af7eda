use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolCall, SolStruct};

use claim_permit_core::{ClaimError, ClaimRequest, VerifierPort};

use crate::config::ClaimAdapterConfig;
use crate::rpc::raw_rpc_call;

sol! {
    /// The verifying contract's typed-data struct. Field order and types
    /// must match the deployed contract byte for byte; a differently
    /// deployed verifier is a change here and nowhere else.
    struct Claim {
        address recipient;
        uint256 claimId;
        uint256 nonce;
        uint256 amount;
    }

    function getTypedDataHash(address recipient, uint256 claimId, uint256 nonce, uint256 amount) external view returns (bytes32);
    function DOMAIN_SEPARATOR() external view returns (bytes32);
}

pub const EIP712_DOMAIN_NAME: &str = "ClaimWithPermit";
pub const EIP712_DOMAIN_VERSION: &str = "1";

/// Mirrors the verifying contract's digest rule. With an RPC endpoint the
/// contract's own `getTypedDataHash` answer is authoritative and the local
/// mirror is cross-checked against it; offline, the mirror stands alone.
#[derive(Debug, Clone)]
pub struct DigestAdapter {
    chain_id: u64,
    verifier_contract: Address,
    remote: Option<RemoteVerifier>,
}

#[derive(Debug, Clone)]
struct RemoteVerifier {
    url: String,
    client: reqwest::blocking::Client,
}

impl DigestAdapter {
    pub fn local(chain_id: u64, verifier_contract: Address) -> Self {
        Self {
            chain_id,
            verifier_contract,
            remote: None,
        }
    }

    pub fn with_config(config: &ClaimAdapterConfig) -> Result<Self, ClaimError> {
        let remote = match &config.rpc_url {
            Some(url) => {
                let client = reqwest::blocking::Client::builder()
                    .timeout(Duration::from_millis(config.rpc_timeout_ms))
                    .build()
                    .map_err(|e| {
                        ClaimError::Transport(format!("failed to initialize rpc client: {e}"))
                    })?;
                Some(RemoteVerifier {
                    url: url.clone(),
                    client,
                })
            }
            None => None,
        };
        Ok(Self {
            chain_id: config.expected_chain_id,
            verifier_contract: config.verifier_contract_address,
            remote,
        })
    }

    pub fn domain(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(EIP712_DOMAIN_NAME.into()),
            Some(EIP712_DOMAIN_VERSION.into()),
            Some(U256::from(self.chain_id)),
            Some(self.verifier_contract),
            None,
        )
    }

    pub fn domain_separator(&self) -> B256 {
        self.domain().separator()
    }

    pub fn local_digest(&self, request: &ClaimRequest) -> B256 {
        let claim = Claim {
            recipient: request.recipient,
            claimId: U256::from(request.claim_id),
            nonce: U256::from(request.nonce),
            amount: request.amount,
        };
        claim.eip712_signing_hash(&self.domain())
    }

    fn onchain_digest(
        &self,
        remote: &RemoteVerifier,
        request: &ClaimRequest,
    ) -> Result<B256, ClaimError> {
        let call = getTypedDataHashCall {
            recipient: request.recipient,
            claimId: U256::from(request.claim_id),
            nonce: U256::from(request.nonce),
            amount: request.amount,
        };
        let data = alloy::primitives::Bytes::from(call.abi_encode());
        let params = serde_json::json!([
            { "to": self.verifier_contract, "data": data },
            "latest",
        ]);
        let result = raw_rpc_call(&remote.client, &remote.url, "eth_call", params)?;
        let raw: alloy::primitives::Bytes = serde_json::from_value(result)
            .map_err(|e| ClaimError::Transport(format!("invalid eth_call answer: {e}")))?;
        let decoded = getTypedDataHashCall::abi_decode_returns(&raw, true)
            .map_err(|e| ClaimError::Transport(format!("digest decode failed: {e}")))?;
        Ok(decoded._0)
    }
}

impl VerifierPort for DigestAdapter {
    fn claim_digest(&self, request: &ClaimRequest) -> Result<B256, ClaimError> {
        let local = self.local_digest(request);
        if let Some(remote) = &self.remote {
            let onchain = self.onchain_digest(remote, request)?;
            // A wrong local rule must never be signed.
            if onchain != local {
                return Err(ClaimError::Validation(format!(
                    "digest rule mismatch: contract computed {onchain}, local mirror {local}"
                )));
            }
            return Ok(onchain);
        }
        Ok(local)
    }
}
