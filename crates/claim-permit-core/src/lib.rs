pub mod domain;
pub mod flow;
pub mod ports;
pub mod state_machine;

pub use domain::{
    Authorization, ClaimRequest, ReceiptStatus, Session, TimestampMs, TransactionIntent,
    TransactionResult, TxStatus,
};
pub use flow::{ClaimFlow, FlowSettings};
pub use ports::{AuthorizerPort, ClaimError, ClockPort, CodecPort, VerifierPort, WalletPort};
pub use state_machine::{claim_transition, ClaimAction, ClaimState, StateTransition};
