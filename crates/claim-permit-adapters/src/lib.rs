pub mod abi;
pub mod clock;
pub mod config;
pub mod digest;
pub mod rpc;
pub mod signer;

pub use abi::ClaimCodec;
pub use clock::SystemClockAdapter;
pub use config::{ClaimAdapterConfig, KeySource, RuntimeProfile};
pub use digest::DigestAdapter;
pub use rpc::RpcWalletAdapter;
pub use signer::{LocalAuthorizer, RemoteAuthorizer};
