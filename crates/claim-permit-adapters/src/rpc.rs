use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use alloy::primitives::{address, keccak256, Address, Bytes, B256};
use serde_json::Value;

use claim_permit_core::{ClaimError, ReceiptStatus, WalletPort};

use crate::config::{ClaimAdapterConfig, RuntimeProfile};

/// The wallet session's chain connection. `Rpc` speaks JSON-RPC 2.0 to a
/// node or wallet endpoint; `Deterministic` is the in-memory runtime for
/// tests and the offline demo; `Disabled` refuses every call with the
/// reason it was turned off.
#[derive(Debug, Clone)]
pub struct RpcWalletAdapter {
    mode: WalletMode,
    state: Arc<Mutex<WalletState>>,
}

#[derive(Debug, Clone)]
enum WalletMode {
    Disabled(String),
    Deterministic,
    Rpc(RpcRuntime),
}

#[derive(Debug, Clone)]
struct RpcRuntime {
    url: String,
    client: reqwest::blocking::Client,
}

#[derive(Debug)]
struct WalletState {
    accounts: Vec<Address>,
    chain_id: u64,
    supported_chains: Vec<u64>,
    reject_next_send: bool,
    receipt_delay_polls: u32,
    send_seq: u64,
    submissions: HashMap<B256, Submission>,
    consumed_inputs: HashSet<B256>,
}

#[derive(Debug, Clone)]
struct Submission {
    reverted: bool,
    polls_remaining: u32,
}

impl Default for WalletState {
    fn default() -> Self {
        Self {
            // The address of the well-known devnet key the demo signs with.
            accounts: vec![address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")],
            chain_id: 31337,
            supported_chains: vec![31337, 1],
            reject_next_send: false,
            receipt_delay_polls: 1,
            send_seq: 0,
            submissions: HashMap::new(),
            consumed_inputs: HashSet::new(),
        }
    }
}

impl Default for RpcWalletAdapter {
    fn default() -> Self {
        Self::with_config(&ClaimAdapterConfig::default())
    }
}

impl RpcWalletAdapter {
    pub fn with_config(config: &ClaimAdapterConfig) -> Self {
        let mode = match &config.rpc_url {
            Some(url) => {
                let timeout = Duration::from_millis(config.rpc_timeout_ms);
                match reqwest::blocking::Client::builder().timeout(timeout).build() {
                    Ok(client) => WalletMode::Rpc(RpcRuntime {
                        url: url.clone(),
                        client,
                    }),
                    Err(e) => {
                        if config.profile == RuntimeProfile::Production {
                            WalletMode::Disabled(format!(
                                "failed to initialize rpc client in production profile: {e}"
                            ))
                        } else {
                            WalletMode::Deterministic
                        }
                    }
                }
            }
            None => {
                if config.profile == RuntimeProfile::Production {
                    WalletMode::Disabled(
                        "rpc url not configured in production profile".to_owned(),
                    )
                } else {
                    WalletMode::Deterministic
                }
            }
        };

        let state = WalletState {
            chain_id: config.expected_chain_id,
            supported_chains: vec![config.expected_chain_id, 1],
            ..WalletState::default()
        };
        Self {
            mode,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn deterministic() -> Self {
        Self {
            mode: WalletMode::Deterministic,
            state: Arc::new(Mutex::new(WalletState::default())),
        }
    }

    pub fn debug_set_accounts(&self, accounts: Vec<Address>) -> Result<(), ClaimError> {
        self.lock()?.accounts = accounts;
        Ok(())
    }

    pub fn debug_set_chain(&self, chain_id: u64) -> Result<(), ClaimError> {
        self.lock()?.chain_id = chain_id;
        Ok(())
    }

    /// The next `send_transaction` fails as a declined wallet prompt.
    pub fn debug_reject_next_submission(&self) -> Result<(), ClaimError> {
        self.lock()?.reject_next_send = true;
        Ok(())
    }

    /// How many receipt polls return nothing before the receipt appears.
    pub fn debug_set_receipt_delay(&self, polls: u32) -> Result<(), ClaimError> {
        self.lock()?.receipt_delay_polls = polls;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, WalletState>, ClaimError> {
        self.state
            .lock()
            .map_err(|e| ClaimError::Transport(format!("wallet lock poisoned: {e}")))
    }

    fn rpc_call(&self, method: &str, params: Value) -> Result<Value, ClaimError> {
        let runtime = match &self.mode {
            WalletMode::Rpc(runtime) => runtime,
            WalletMode::Disabled(reason) => return Err(ClaimError::Policy(reason.clone())),
            WalletMode::Deterministic => {
                return Err(ClaimError::Transport("rpc runtime not enabled".to_owned()))
            }
        };
        raw_rpc_call(&runtime.client, &runtime.url, method, params)
    }
}

impl WalletPort for RpcWalletAdapter {
    fn request_accounts(&self) -> Result<Vec<Address>, ClaimError> {
        match &self.mode {
            WalletMode::Deterministic => Ok(self.lock()?.accounts.clone()),
            WalletMode::Disabled(reason) => Err(ClaimError::Policy(reason.clone())),
            WalletMode::Rpc(_) => {
                let result = match self.rpc_call("eth_accounts", serde_json::json!([])) {
                    Ok(result) => result,
                    // A declined connection prompt means no identity.
                    Err(ClaimError::SubmissionRejected(_)) => {
                        return Err(ClaimError::WalletUnavailable)
                    }
                    Err(other) => return Err(other),
                };
                let accounts: Vec<Address> = serde_json::from_value(result)
                    .map_err(|e| ClaimError::Transport(format!("invalid accounts answer: {e}")))?;
                self.lock()?.accounts = accounts.clone();
                Ok(accounts)
            }
        }
    }

    fn chain_id(&self) -> Result<u64, ClaimError> {
        match &self.mode {
            WalletMode::Deterministic => Ok(self.lock()?.chain_id),
            WalletMode::Disabled(reason) => Err(ClaimError::Policy(reason.clone())),
            WalletMode::Rpc(_) => {
                let result = self.rpc_call("eth_chainId", serde_json::json!([]))?;
                parse_hex_u64(&result)
            }
        }
    }

    fn switch_chain(&self, target: u64) -> Result<(), ClaimError> {
        match &self.mode {
            WalletMode::Deterministic => {
                let mut state = self.lock()?;
                if !state.supported_chains.contains(&target) {
                    return Err(ClaimError::Validation(format!(
                        "chain {target} not supported by the wallet"
                    )));
                }
                state.chain_id = target;
                Ok(())
            }
            WalletMode::Disabled(reason) => Err(ClaimError::Policy(reason.clone())),
            WalletMode::Rpc(_) => {
                let params = serde_json::json!([{ "chainId": format!("0x{target:x}") }]);
                self.rpc_call("wallet_switchEthereumChain", params)?;
                Ok(())
            }
        }
    }

    fn send_transaction(&self, to: Address, input: Bytes) -> Result<B256, ClaimError> {
        match &self.mode {
            WalletMode::Deterministic => {
                let mut state = self.lock()?;
                if state.reject_next_send {
                    state.reject_next_send = false;
                    return Err(ClaimError::SubmissionRejected(
                        "user declined the transaction prompt".to_owned(),
                    ));
                }
                let from = state
                    .accounts
                    .first()
                    .copied()
                    .ok_or(ClaimError::WalletUnavailable)?;

                // Identical calldata a second time plays back a consumed
                // authorization; the chain accepts the broadcast and the
                // receipt reverts.
                let replayed = !state.consumed_inputs.insert(keccak256(&input));

                state.send_seq += 1;
                let mut seed = from.to_vec();
                seed.extend_from_slice(to.as_slice());
                seed.extend_from_slice(&input);
                seed.extend_from_slice(&state.send_seq.to_be_bytes());
                let hash = keccak256(seed);
                let delay = state.receipt_delay_polls;
                state.submissions.insert(
                    hash,
                    Submission {
                        reverted: replayed,
                        polls_remaining: delay,
                    },
                );
                Ok(hash)
            }
            WalletMode::Disabled(reason) => Err(ClaimError::Policy(reason.clone())),
            WalletMode::Rpc(_) => {
                let from = self
                    .lock()?
                    .accounts
                    .first()
                    .copied()
                    .ok_or(ClaimError::WalletUnavailable)?;
                let params = serde_json::json!([{
                    "from": from,
                    "to": to,
                    "data": input,
                }]);
                let result = self.rpc_call("eth_sendTransaction", params)?;
                serde_json::from_value(result)
                    .map_err(|e| ClaimError::Transport(format!("invalid transaction hash: {e}")))
            }
        }
    }

    fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptStatus>, ClaimError> {
        match &self.mode {
            WalletMode::Deterministic => {
                let mut state = self.lock()?;
                let submission = match state.submissions.get_mut(&hash) {
                    Some(submission) => submission,
                    None => return Ok(None),
                };
                if submission.polls_remaining > 0 {
                    submission.polls_remaining -= 1;
                    return Ok(None);
                }
                Ok(Some(if submission.reverted {
                    ReceiptStatus::Reverted
                } else {
                    ReceiptStatus::Success
                }))
            }
            WalletMode::Disabled(reason) => Err(ClaimError::Policy(reason.clone())),
            WalletMode::Rpc(_) => {
                let result =
                    self.rpc_call("eth_getTransactionReceipt", serde_json::json!([hash]))?;
                if result.is_null() {
                    return Ok(None);
                }
                let status = result
                    .get("status")
                    .ok_or_else(|| ClaimError::Transport("receipt missing status".to_owned()))?;
                Ok(Some(if parse_hex_u64(status)? == 1 {
                    ReceiptStatus::Success
                } else {
                    ReceiptStatus::Reverted
                }))
            }
        }
    }
}

/// One JSON-RPC 2.0 exchange. EIP-1193 code 4001 (request declined by the
/// user) maps to a rejected submission.
pub(crate) fn raw_rpc_call(
    client: &reqwest::blocking::Client,
    url: &str,
    method: &str,
    params: Value,
) -> Result<Value, ClaimError> {
    let payload = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    });
    let response = client
        .post(url)
        .json(&payload)
        .send()
        .map_err(|e| ClaimError::Transport(format!("rpc request failed: {e}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ClaimError::Transport(format!("rpc responded with status {status}")));
    }
    let body: Value = response
        .json()
        .map_err(|e| ClaimError::Transport(format!("rpc response decode failed: {e}")))?;
    if let Some(error) = body.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown rpc error")
            .to_owned();
        return Err(match code {
            4001 => ClaimError::SubmissionRejected(message),
            _ => ClaimError::Transport(format!("rpc error {code}: {message}")),
        });
    }
    body.get("result")
        .cloned()
        .ok_or_else(|| ClaimError::Transport("rpc response missing result".to_owned()))
}

fn parse_hex_u64(value: &Value) -> Result<u64, ClaimError> {
    let raw = value
        .as_str()
        .ok_or_else(|| ClaimError::Transport("expected a hex quantity".to_owned()))?;
    u64::from_str_radix(raw.trim_start_matches("0x"), 16)
        .map_err(|e| ClaimError::Transport(format!("invalid hex quantity {raw}: {e}")))
}
