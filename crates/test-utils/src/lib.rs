//! Test utilities for multisig coordinator components.
//!
//! This crate provides scriptable in-memory stand-ins for the two
//! collaborator traits the coordinator consumes, [`LedgerQueryService`] and
//! [`WalletSigner`], plus fixture helpers shared by tests across this
//! workspace.
//!
//! The mocks answer with sensible defaults until a test scripts specific
//! outcomes, so the happy path needs no setup beyond registering account
//! state.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use multisig_coordinator_domain::{
    account::{AccountAddress, AccountSigner, SignerKey},
    envelope::{Envelope, EnvelopeBytes, EnvelopeSignature},
    proposal::SettlementRef,
};
use multisig_ledger_client::{
    SigningContext,
    provider::{
        AccountState, ConfirmationStatus, LedgerError, LedgerQueryService, LedgerThresholds,
        SimulationResult, SubmitReceipt, SubmitStatus, TxStatusReport, WalletSigner,
        WalletSignerError,
    },
};

/// Resource fee the mock ledger reports for every unscripted simulation.
pub const MOCK_RESOURCE_FEE: u64 = 40;

// MOCK LEDGER
// ================================================================================================

/// A scriptable [`LedgerQueryService`] backed by in-memory state.
///
/// Unscripted calls fall back to defaults: simulations succeed with
/// [`MOCK_RESOURCE_FEE`], submissions succeed synchronously under a fresh
/// settlement reference, and status polls report success. Tests queue
/// specific outcomes up front and inspect captured submissions afterwards.
#[derive(Default)]
pub struct MockLedger {
    accounts: Mutex<HashMap<AccountAddress, AccountState>>,
    simulations: Mutex<VecDeque<Result<SimulationResult, LedgerError>>>,
    submissions: Mutex<VecDeque<Result<SubmitReceipt, LedgerError>>>,
    statuses: Mutex<VecDeque<Result<TxStatusReport, LedgerError>>>,
    submitted: Mutex<Vec<Envelope>>,
    next_reference: AtomicU64,
}

impl MockLedger {
    /// Creates an empty mock ledger knowing no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `state` so the account resolves on the mock ledger.
    #[must_use]
    pub fn with_account(mut self, state: AccountState) -> Self {
        let accounts = self.accounts.get_mut().unwrap();
        accounts.insert(state.address().clone(), state);
        self
    }

    /// Queues the outcome for the next unconsumed `simulate` call.
    pub fn enqueue_simulation(&self, outcome: Result<SimulationResult, LedgerError>) {
        self.simulations.lock().unwrap().push_back(outcome);
    }

    /// Queues the outcome for the next unconsumed `submit` call.
    pub fn enqueue_submit(&self, outcome: Result<SubmitReceipt, LedgerError>) {
        self.submissions.lock().unwrap().push_back(outcome);
    }

    /// Queues the outcome for the next unconsumed `transaction_status` call.
    pub fn enqueue_status(&self, outcome: Result<TxStatusReport, LedgerError>) {
        self.statuses.lock().unwrap().push_back(outcome);
    }

    /// Returns every envelope submitted so far, in submission order.
    pub fn submitted(&self) -> Vec<Envelope> {
        self.submitted.lock().unwrap().clone()
    }

    fn fresh_reference(&self) -> SettlementRef {
        let n = self.next_reference.fetch_add(1, Ordering::Relaxed);
        SettlementRef::from(format!("SET_{:04}", n + 1))
    }
}

#[async_trait]
impl LedgerQueryService for MockLedger {
    async fn account_state(&self, address: &AccountAddress) -> Result<AccountState, LedgerError> {
        self.accounts
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| LedgerError::AccountNotFound(address.clone()))
    }

    async fn simulate(&self, _envelope: &Envelope) -> Result<SimulationResult, LedgerError> {
        if let Some(outcome) = self.simulations.lock().unwrap().pop_front() {
            return outcome;
        }

        Ok(SimulationResult::builder()
            .resource_fee(MOCK_RESOURCE_FEE)
            .footprint(EnvelopeBytes::from(b"mock-footprint".to_vec()))
            .build())
    }

    async fn submit(&self, envelope: &Envelope) -> Result<SubmitReceipt, LedgerError> {
        self.submitted.lock().unwrap().push(envelope.clone());

        if let Some(outcome) = self.submissions.lock().unwrap().pop_front() {
            return outcome;
        }

        Ok(SubmitReceipt::builder()
            .status(SubmitStatus::Success)
            .reference(self.fresh_reference())
            .build())
    }

    async fn transaction_status(
        &self,
        _reference: &SettlementRef,
    ) -> Result<TxStatusReport, LedgerError> {
        if let Some(outcome) = self.statuses.lock().unwrap().pop_front() {
            return outcome;
        }

        Ok(TxStatusReport::builder().status(ConfirmationStatus::Success).build())
    }
}

// MOCK WALLET
// ================================================================================================

/// How a [`MockWallet`] answers signature requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletMode {
    /// Sign with deterministic bytes derived from the signer key.
    Approve,
    /// Refuse as a user decision.
    Decline,
    /// Fail as a technical wallet fault.
    Fail,
}

/// A [`WalletSigner`] double with a switchable answer mode.
///
/// Approvals append a deterministic signature attributed to the context's
/// wallet address; an envelope that already carries this signer's signature
/// is returned unchanged, the way a wallet refuses to double-sign. Every
/// prompt is captured for later inspection, declined ones included.
pub struct MockWallet {
    mode: Mutex<WalletMode>,
    prompts: Mutex<Vec<SignerKey>>,
}

impl MockWallet {
    /// Creates a wallet answering in the given mode.
    pub fn new(mode: WalletMode) -> Self {
        Self { mode: Mutex::new(mode), prompts: Mutex::new(Vec::new()) }
    }

    /// Creates a wallet that approves every request.
    pub fn approving() -> Self {
        Self::new(WalletMode::Approve)
    }

    /// Switches the answer mode for subsequent requests.
    pub fn set_mode(&self, mode: WalletMode) {
        *self.mode.lock().unwrap() = mode;
    }

    /// Returns the wallet address of every prompt seen so far.
    pub fn prompts(&self) -> Vec<SignerKey> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletSigner for MockWallet {
    async fn sign_envelope(
        &self,
        envelope: &Envelope,
        ctx: &SigningContext,
    ) -> Result<Envelope, WalletSignerError> {
        let signer = ctx.wallet_address().clone();
        self.prompts.lock().unwrap().push(signer.clone());

        match *self.mode.lock().unwrap() {
            WalletMode::Decline => Err(WalletSignerError::Declined),
            WalletMode::Fail => Err(WalletSignerError::wallet("wallet connection lost")),
            WalletMode::Approve => {
                if envelope.signatures().iter().any(|signature| *signature.signer() == signer) {
                    return Ok(envelope.clone());
                }

                let signature = EnvelopeSignature::builder()
                    .signer(signer.clone())
                    .bytes(format!("sig:{signer}").into_bytes())
                    .build();

                Ok(envelope.clone().with_signature(signature))
            },
        }
    }
}

// FIXTURES
// ================================================================================================

/// Builds a weight-1 signer entry for `key`.
pub fn signer_entry(key: &str) -> AccountSigner {
    AccountSigner::builder().key(SignerKey::from(key)).build()
}

/// Builds a signer entry for `key` with an explicit weight.
pub fn weighted_signer(key: &str, weight: u8) -> AccountSigner {
    AccountSigner::builder().key(SignerKey::from(key)).weight(weight).build()
}

/// Builds the live state of a multisig account as the ledger reports it:
/// the master key disabled at weight zero, the given cosigners at weight
/// one, and all three threshold tiers set to `threshold`.
pub fn multisig_account_state(address: &str, cosigners: &[&str], threshold: u8) -> AccountState {
    let mut signers = vec![weighted_signer(address, 0)];
    signers.extend(cosigners.iter().map(|key| signer_entry(key)));

    AccountState::builder()
        .address(AccountAddress::from(address))
        .sequence(41)
        .signers(signers)
        .thresholds(
            LedgerThresholds::builder().low(threshold).medium(threshold).high(threshold).build(),
        )
        .build()
}
