use alloy::primitives::{Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use claim_permit_core::{Authorization, ClaimError, CodecPort};

sol! {
    function claim(uint256 claimId, uint256 amount, uint8 v, bytes32 r, bytes32 s);
}

/// Calldata for the claim contract's `claim` entry point.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimCodec;

impl ClaimCodec {
    pub const CLAIM_SELECTOR: [u8; 4] = claimCall::SELECTOR;
}

impl CodecPort for ClaimCodec {
    fn encode_claim(
        &self,
        claim_id: u64,
        amount: U256,
        authorization: &Authorization,
    ) -> Result<Bytes, ClaimError> {
        if !authorization.is_well_formed() {
            return Err(ClaimError::Validation(
                "refusing to encode a malformed authorization".to_owned(),
            ));
        }
        let call = claimCall {
            claimId: U256::from(claim_id),
            amount,
            v: authorization.v,
            r: authorization.r,
            s: authorization.s,
        };
        Ok(call.abi_encode().into())
    }
}
