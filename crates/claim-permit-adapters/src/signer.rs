use std::time::Duration;

use alloy::primitives::{Address, PrimitiveSignature, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use serde::Deserialize;

use claim_permit_core::{Authorization, AuthorizerPort, ClaimError};

use crate::config::{KeySource, RuntimeProfile};

/// Signs claim digests with a locally held key. This is the demo stand-in
/// for the trusted verifier; the production profile refuses a literal key
/// and expects the remote service instead.
#[derive(Debug, Clone)]
pub struct LocalAuthorizer {
    signer: PrivateKeySigner,
}

impl LocalAuthorizer {
    pub fn from_key_source(source: &KeySource, profile: RuntimeProfile) -> Result<Self, ClaimError> {
        let raw = match source {
            KeySource::Env(var) => std::env::var(var)
                .map_err(|_| ClaimError::Policy(format!("signer key variable {var} is not set")))?,
            KeySource::Hex(raw) => {
                if profile == RuntimeProfile::Production {
                    return Err(ClaimError::Policy(
                        "a literal signer key is not allowed in the production profile; \
                         configure a remote signing service"
                            .to_owned(),
                    ));
                }
                raw.clone()
            }
            KeySource::Remote(url) => {
                return Err(ClaimError::Policy(format!(
                    "key source {url} is a remote service; use RemoteAuthorizer"
                )))
            }
        };
        let signer: PrivateKeySigner = raw
            .trim()
            .parse()
            .map_err(|e| ClaimError::Validation(format!("invalid signer key: {e}")))?;
        Ok(Self { signer })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

impl AuthorizerPort for LocalAuthorizer {
    fn sign_digest(&self, digest: B256) -> Result<Authorization, ClaimError> {
        let signature = self.signer.sign_hash_sync(&digest).map_err(|e| {
            ClaimError::AuthorizationUnobtainable(format!("local signing failed: {e}"))
        })?;
        Ok(signature_components(&signature))
    }
}

/// The intended production shape: the digest crosses a network boundary to
/// an authenticated signing service and only the signature comes back.
#[derive(Debug, Clone)]
pub struct RemoteAuthorizer {
    url: String,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct RemoteSignature {
    v: u8,
    r: B256,
    s: B256,
}

impl RemoteAuthorizer {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Result<Self, ClaimError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ClaimError::Transport(format!("failed to initialize http client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

impl AuthorizerPort for RemoteAuthorizer {
    fn sign_digest(&self, digest: B256) -> Result<Authorization, ClaimError> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "digest": digest }))
            .send()
            .map_err(|e| {
                ClaimError::AuthorizationUnobtainable(format!("signing service unreachable: {e}"))
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClaimError::AuthorizationUnobtainable(format!(
                "signing service refused with status {status}"
            )));
        }
        let signature: RemoteSignature = response.json().map_err(|e| {
            ClaimError::AuthorizationUnobtainable(format!("invalid signing service answer: {e}"))
        })?;
        let authorization = Authorization {
            v: signature.v,
            r: signature.r,
            s: signature.s,
        };
        if !authorization.is_well_formed() {
            return Err(ClaimError::AuthorizationUnobtainable(
                "signing service returned a malformed signature".to_owned(),
            ));
        }
        Ok(authorization)
    }
}

fn signature_components(signature: &PrimitiveSignature) -> Authorization {
    Authorization {
        v: 27 + signature.v() as u8,
        r: signature.r().into(),
        s: signature.s().into(),
    }
}
