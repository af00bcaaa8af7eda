//! Claim-with-permit driver: connect a wallet session, obtain a claim
//! authorization from the trusted signer, submit the claim on-chain and
//! wait for its confirmation.

use alloy::primitives::B256;

use claim_permit_adapters::{
    ClaimAdapterConfig, ClaimCodec, DigestAdapter, KeySource, LocalAuthorizer, RemoteAuthorizer,
    RpcWalletAdapter, SystemClockAdapter,
};
use claim_permit_core::{Authorization, AuthorizerPort, ClaimError, ClaimFlow};

/// The configured trust root: a locally held key for development, the
/// remote signing service in production.
enum Authorizer {
    Local(LocalAuthorizer),
    Remote(RemoteAuthorizer),
}

impl AuthorizerPort for Authorizer {
    fn sign_digest(&self, digest: B256) -> Result<Authorization, ClaimError> {
        match self {
            Self::Local(authorizer) => authorizer.sign_digest(digest),
            Self::Remote(authorizer) => authorizer.sign_digest(digest),
        }
    }
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = ClaimAdapterConfig::from_env();
    tracing::info!(
        chain = config.expected_chain_id,
        claim_id = config.claim_id,
        "starting claim-permit"
    );
    if config.rpc_url.is_none() {
        tracing::info!("CLAIM_PERMIT_RPC_URL not set; using the deterministic offline wallet");
    }

    let wallet = RpcWalletAdapter::with_config(&config);
    let digest = DigestAdapter::with_config(&config)?;
    let authorizer = match &config.trusted_signer_key_source {
        KeySource::Remote(url) => {
            Authorizer::Remote(RemoteAuthorizer::new(url.clone(), config.rpc_timeout_ms)?)
        }
        source => Authorizer::Local(LocalAuthorizer::from_key_source(source, config.profile)?),
    };

    let flow = ClaimFlow::new(
        wallet,
        digest,
        authorizer,
        ClaimCodec,
        SystemClockAdapter,
        config.flow_settings(),
    );

    let session = flow.connect()?;
    let address = session
        .address
        .ok_or_else(|| eyre::eyre!("connected session has no account"))?;
    tracing::info!(%address, chain = ?session.chain_id, "wallet connected");

    if session.chain_id != Some(config.expected_chain_id) {
        tracing::info!(chain = config.expected_chain_id, "switching network");
        flow.switch_network(config.expected_chain_id)?;
    }

    flow.request_authorization(address)?;
    tracing::info!("claim authorization granted by the trusted signer");

    let intent = flow.prepare()?;
    let pending = flow.submit(intent)?;
    tracing::info!(hash = %pending.hash, "claim transaction broadcast");

    let confirmed = flow.await_confirmation(pending.hash)?;
    tracing::info!(hash = %confirmed.hash, status = ?confirmed.status, "claim confirmed");
    Ok(())
}
