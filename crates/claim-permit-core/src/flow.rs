use std::sync::{Mutex, MutexGuard};

use alloy::primitives::{Address, B256, U256};

use crate::domain::{
    Authorization, ClaimRequest, ReceiptStatus, Session, TransactionIntent, TransactionResult,
    TxStatus,
};
use crate::ports::{AuthorizerPort, ClaimError, ClockPort, CodecPort, VerifierPort, WalletPort};
use crate::state_machine::{claim_transition, ClaimAction, ClaimState, StateTransition};

#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub claim_contract: Address,
    pub expected_chain_id: u64,
    pub claim_id: u64,
    pub amount: U256,
    pub nonce_start: u64,
    pub confirmation_poll_interval_ms: u64,
    pub confirmation_timeout_ms: u64,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            claim_contract: Address::ZERO,
            expected_chain_id: 31337,
            claim_id: 1,
            amount: U256::from(10_000_000_000u64),
            nonce_start: 0,
            confirmation_poll_interval_ms: 1_000,
            confirmation_timeout_ms: 60_000,
        }
    }
}

#[derive(Debug, Default)]
struct ClaimAttempt {
    state: ClaimState,
    request: Option<ClaimRequest>,
    digest: Option<B256>,
    authorization: Option<Authorization>,
    result: Option<TransactionResult>,
    next_nonce: u64,
}

/// Drives one session's claim workflow: session lifecycle, authorization
/// request, submission, confirmation. The attempt mutex is the explicit
/// per-session guard: a new attempt cannot start until the held
/// authorization is consumed or discarded, so two attempts never race on
/// the same nonce.
pub struct ClaimFlow<W, V, A, X, C>
where
    W: WalletPort,
    V: VerifierPort,
    A: AuthorizerPort,
    X: CodecPort,
    C: ClockPort,
{
    pub wallet: W,
    pub verifier: V,
    pub authorizer: A,
    pub codec: X,
    pub clock: C,
    settings: FlowSettings,
    session: Mutex<Session>,
    attempt: Mutex<ClaimAttempt>,
    log: Mutex<Vec<StateTransition>>,
}

impl<W, V, A, X, C> ClaimFlow<W, V, A, X, C>
where
    W: WalletPort,
    V: VerifierPort,
    A: AuthorizerPort,
    X: CodecPort,
    C: ClockPort,
{
    pub fn new(
        wallet: W,
        verifier: V,
        authorizer: A,
        codec: X,
        clock: C,
        settings: FlowSettings,
    ) -> Self {
        let attempt = ClaimAttempt {
            next_nonce: settings.nonce_start,
            ..ClaimAttempt::default()
        };
        Self {
            wallet,
            verifier,
            authorizer,
            codec,
            clock,
            settings,
            session: Mutex::new(Session::disconnected()),
            attempt: Mutex::new(attempt),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    pub fn session(&self) -> Result<Session, ClaimError> {
        Ok(self.lock_session()?.clone())
    }

    pub fn state(&self) -> Result<ClaimState, ClaimError> {
        Ok(self.lock_attempt()?.state)
    }

    pub fn transition_log(&self) -> Result<Vec<StateTransition>, ClaimError> {
        Ok(self.lock_log()?.clone())
    }

    /// Ask the wallet for a signing identity. A rejected or empty answer is
    /// terminal for this attempt; only a new user action retries.
    pub fn connect(&self) -> Result<Session, ClaimError> {
        let accounts = self.wallet.request_accounts()?;
        let address = accounts.first().copied().ok_or(ClaimError::WalletUnavailable)?;
        let chain_id = self.wallet.chain_id()?;
        let mut session = self.lock_session()?;
        *session = Session {
            connected: true,
            address: Some(address),
            chain_id: Some(chain_id),
        };
        Ok(session.clone())
    }

    /// Clears the session and abandons any in-memory attempt state. The
    /// nonce counter survives; nothing durable was written.
    pub fn disconnect(&self) -> Result<(), ClaimError> {
        *self.lock_session()? = Session::disconnected();
        let mut attempt = self.lock_attempt()?;
        *attempt = ClaimAttempt {
            next_nonce: attempt.next_nonce,
            ..ClaimAttempt::default()
        };
        Ok(())
    }

    /// Requests the wallet change its active chain. On any failure the
    /// session chain id is left untouched and the mismatch is surfaced,
    /// never swallowed.
    pub fn switch_network(&self, target: u64) -> Result<Session, ClaimError> {
        let mut session = self.lock_session()?;
        if !session.connected {
            return Err(ClaimError::WalletUnavailable);
        }
        match self.wallet.switch_chain(target) {
            Ok(()) => {
                session.chain_id = Some(target);
                Ok(session.clone())
            }
            Err(_) => Err(ClaimError::NetworkMismatch {
                expected: target,
                actual: session.chain_id.unwrap_or_default(),
            }),
        }
    }

    /// Obtains an authorization for `recipient` from the trusted signer:
    /// digest over (recipient, claim id, nonce, amount), then a signature
    /// over that digest. Failure leaves the attempt Idle; absence of an
    /// authorization means submission stays disabled.
    pub fn request_authorization(&self, recipient: Address) -> Result<Authorization, ClaimError> {
        let session = self.session()?;
        if !session.connected {
            return Err(ClaimError::WalletUnavailable);
        }
        // The claim contract recovers the signer against a digest rebuilt
        // from the transaction sender, so any other recipient would revert.
        if session.address != Some(recipient) {
            return Err(ClaimError::Validation(format!(
                "recipient {recipient} is not the connected account"
            )));
        }

        let mut attempt = self.lock_attempt()?;
        if attempt.state != ClaimState::Idle {
            return Err(ClaimError::Validation(format!(
                "claim attempt already in flight ({:?}); consume or discard it first",
                attempt.state
            )));
        }

        let request = ClaimRequest {
            recipient,
            claim_id: self.settings.claim_id,
            nonce: attempt.next_nonce,
            amount: self.settings.amount,
        };
        let digest = self
            .verifier
            .claim_digest(&request)
            .map_err(|e| ClaimError::AuthorizationUnobtainable(format!("digest unavailable: {e}")))?;
        let authorization = self
            .authorizer
            .sign_digest(digest)
            .map_err(|e| ClaimError::AuthorizationUnobtainable(format!("signing failed: {e}")))?;
        if !authorization.is_well_formed() {
            return Err(ClaimError::AuthorizationUnobtainable(
                "signer returned a malformed signature".to_owned(),
            ));
        }

        let (state, transition) = claim_transition(attempt.state, ClaimAction::Authorize)?;
        attempt.state = state;
        attempt.request = Some(request);
        attempt.digest = Some(digest);
        attempt.authorization = Some(authorization.clone());
        attempt.result = None;
        drop(attempt);
        self.record(transition)?;
        Ok(authorization)
    }

    /// Drops an unconsumed authorization so a fresh attempt may start.
    pub fn discard_authorization(&self) -> Result<(), ClaimError> {
        let mut attempt = self.lock_attempt()?;
        let (state, transition) = claim_transition(attempt.state, ClaimAction::Discard)?;
        attempt.state = state;
        attempt.request = None;
        attempt.digest = None;
        attempt.authorization = None;
        drop(attempt);
        self.record(transition)
    }

    /// Builds the claim transaction if a structurally well-formed
    /// authorization is held; otherwise a Disabled intent, never a
    /// submittable one.
    pub fn prepare(&self) -> Result<TransactionIntent, ClaimError> {
        let session = self.session()?;
        if !session.connected {
            return Err(ClaimError::WalletUnavailable);
        }
        let attempt = self.lock_attempt()?;
        let authorization = match attempt.authorization.as_ref() {
            Some(auth) if auth.is_well_formed() => auth,
            Some(_) => {
                return Ok(TransactionIntent::Disabled {
                    reason: "held authorization is malformed".to_owned(),
                })
            }
            None => {
                return Ok(TransactionIntent::Disabled {
                    reason: "no authorization held".to_owned(),
                })
            }
        };
        let request = attempt.request.as_ref().ok_or_else(|| {
            ClaimError::Validation("authorization held without its claim request".to_owned())
        })?;
        let input = self
            .codec
            .encode_claim(request.claim_id, request.amount, authorization)?;
        Ok(TransactionIntent::Ready {
            to: self.settings.claim_contract,
            input,
        })
    }

    /// Broadcasts a Ready intent. Consumes the held authorization and
    /// advances the nonce; a wallet refusal leaves the attempt Authorized
    /// for a later retry.
    pub fn submit(&self, intent: TransactionIntent) -> Result<TransactionResult, ClaimError> {
        let (to, input) = match intent {
            TransactionIntent::Disabled { reason } => {
                return Err(ClaimError::Validation(format!("submission disabled: {reason}")))
            }
            TransactionIntent::Ready { to, input } => (to, input),
        };
        let session = self.session()?;
        if !session.connected {
            return Err(ClaimError::WalletUnavailable);
        }
        let actual = session.chain_id.unwrap_or_default();
        if actual != self.settings.expected_chain_id {
            return Err(ClaimError::NetworkMismatch {
                expected: self.settings.expected_chain_id,
                actual,
            });
        }

        let mut attempt = self.lock_attempt()?;
        let (state, transition) = claim_transition(attempt.state, ClaimAction::Submit)?;
        let hash = self.wallet.send_transaction(to, input)?;

        attempt.state = state;
        attempt.authorization = None;
        attempt.next_nonce = attempt.next_nonce.saturating_add(1);
        let result = TransactionResult {
            hash,
            status: TxStatus::Pending,
        };
        attempt.result = Some(result);
        drop(attempt);
        self.record(transition)?;
        Ok(result)
    }

    /// Polls for the receipt until the timeout bound. A reverted receipt
    /// (stale, reused, or mismatched authorization) fails the attempt.
    pub fn await_confirmation(&self, hash: B256) -> Result<TransactionResult, ClaimError> {
        {
            let attempt = self.lock_attempt()?;
            if attempt.state != ClaimState::Pending {
                return Err(ClaimError::Validation(format!(
                    "no claim transaction in flight ({:?})",
                    attempt.state
                )));
            }
            if attempt.result.map(|r| r.hash) != Some(hash) {
                return Err(ClaimError::Validation(format!(
                    "unknown claim transaction hash {hash}"
                )));
            }
        }

        let started = self.clock.now_ms()?;
        let deadline = started.saturating_add(self.settings.confirmation_timeout_ms);
        loop {
            match self.wallet.transaction_receipt(hash)? {
                Some(ReceiptStatus::Success) => {
                    return self.finalize(ClaimAction::Confirm, TxStatus::Success);
                }
                Some(ReceiptStatus::Reverted) => {
                    self.finalize(ClaimAction::Revert, TxStatus::Failed)?;
                    return Err(ClaimError::TransactionReverted(format!(
                        "claim transaction {hash} reverted on-chain"
                    )));
                }
                None => {
                    if self.clock.now_ms()? >= deadline {
                        self.finalize(ClaimAction::Revert, TxStatus::Failed)?;
                        return Err(ClaimError::Timeout(format!(
                            "no confirmation for {hash} within {}ms",
                            self.settings.confirmation_timeout_ms
                        )));
                    }
                    self.clock.sleep_ms(self.settings.confirmation_poll_interval_ms);
                }
            }
        }
    }

    /// Resets a finished attempt so a new request/authorization cycle can
    /// begin. Refused while a transaction is still in flight.
    pub fn begin_new_cycle(&self) -> Result<(), ClaimError> {
        let mut attempt = self.lock_attempt()?;
        if attempt.state == ClaimState::Pending {
            return Err(ClaimError::Validation(
                "claim transaction still pending; await its confirmation first".to_owned(),
            ));
        }
        *attempt = ClaimAttempt {
            next_nonce: attempt.next_nonce,
            ..ClaimAttempt::default()
        };
        Ok(())
    }

    /// Full cycle for one recipient: authorize, prepare, submit, confirm.
    pub fn run_claim(&self, recipient: Address) -> Result<TransactionResult, ClaimError> {
        self.request_authorization(recipient)?;
        let intent = self.prepare()?;
        let pending = self.submit(intent)?;
        self.await_confirmation(pending.hash)
    }

    fn finalize(
        &self,
        action: ClaimAction,
        status: TxStatus,
    ) -> Result<TransactionResult, ClaimError> {
        let mut attempt = self.lock_attempt()?;
        let (state, transition) = claim_transition(attempt.state, action)?;
        attempt.state = state;
        let result = match attempt.result.as_mut() {
            Some(result) => {
                result.status = status;
                *result
            }
            None => {
                return Err(ClaimError::Validation(
                    "pending attempt lost its transaction result".to_owned(),
                ))
            }
        };
        drop(attempt);
        self.record(transition)?;
        Ok(result)
    }

    fn record(&self, transition: StateTransition) -> Result<(), ClaimError> {
        self.lock_log()?.push(transition);
        Ok(())
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, Session>, ClaimError> {
        self.session
            .lock()
            .map_err(|e| ClaimError::Transport(format!("session lock poisoned: {e}")))
    }

    fn lock_attempt(&self) -> Result<MutexGuard<'_, ClaimAttempt>, ClaimError> {
        self.attempt
            .lock()
            .map_err(|e| ClaimError::Transport(format!("attempt lock poisoned: {e}")))
    }

    fn lock_log(&self) -> Result<MutexGuard<'_, Vec<StateTransition>>, ClaimError> {
        self.log
            .lock()
            .map_err(|e| ClaimError::Transport(format!("transition log lock poisoned: {e}")))
    }
}
