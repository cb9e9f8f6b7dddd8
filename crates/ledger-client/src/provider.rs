//! Collaborator contracts consumed by the coordinator.
//!
//! Implementations of these traits are out of scope for this workspace:
//! ledger RPC transports, wallet browser extensions, and hardware signers
//! all live in the embedding application. The coordinator only ever sees
//! these interfaces, and wraps their failures into its own error taxonomy
//! so callers get a stable contract independent of the underlying stack.

use std::borrow::Cow;

use async_trait::async_trait;
use bon::Builder;
use dissolve_derive::Dissolve;

use multisig_coordinator_domain::{
    account::{AccountAddress, AccountSigner, SignerKey},
    envelope::{Envelope, EnvelopeBytes},
    proposal::SettlementRef,
};
use strum::{Display, EnumString, IntoStaticStr};

use crate::SigningContext;

/// The live state of a ledger account, as reported by a
/// [`LedgerQueryService`].
#[derive(Debug, Clone, Builder, Dissolve)]
pub struct AccountState {
    /// The account's public address.
    address: AccountAddress,

    /// The account's current sequence number.
    sequence: u64,

    /// Every signer entry on the account, the master key included.
    signers: Vec<AccountSigner>,

    /// The account's three threshold tiers.
    thresholds: LedgerThresholds,
}

impl AccountState {
    /// Returns the account's public address.
    pub fn address(&self) -> &AccountAddress {
        &self.address
    }

    /// Returns the account's current sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns every signer entry on the account, the master key included.
    pub fn signers(&self) -> &[AccountSigner] {
        &self.signers
    }

    /// Returns the threshold tiers.
    pub fn thresholds(&self) -> LedgerThresholds {
        self.thresholds
    }

    /// Returns the co-signers of the account: every signer entry except the
    /// account's own master key.
    ///
    /// This is the set a presentation layer shows as "the signers", and the
    /// set proposals collect approvals from.
    pub fn cosigners(&self) -> Vec<AccountSigner> {
        let master = SignerKey::from(self.address.as_str());

        self.signers
            .iter()
            .filter(|signer| *signer.key() != master)
            .cloned()
            .collect()
    }

    /// Returns the threshold gating proposal execution.
    ///
    /// Account-model convention: the high tier is the one signer-set and
    /// payment-approval changes are measured against.
    pub fn approval_threshold(&self) -> u8 {
        self.thresholds.high()
    }
}

/// The three threshold tiers of a ledger account.
#[derive(Debug, Clone, Copy, Builder, Dissolve)]
pub struct LedgerThresholds {
    /// The low-security tier.
    low: u8,

    /// The medium-security tier.
    medium: u8,

    /// The high-security tier.
    high: u8,
}

impl LedgerThresholds {
    /// Returns the low-security tier.
    pub fn low(&self) -> u8 {
        self.low
    }

    /// Returns the medium-security tier.
    pub fn medium(&self) -> u8 {
        self.medium
    }

    /// Returns the high-security tier.
    pub fn high(&self) -> u8 {
        self.high
    }
}

/// The outcome of simulating an envelope against the ledger.
#[derive(Debug, Clone, Builder, Dissolve)]
pub struct SimulationResult {
    /// The resource fee the ledger charges on top of the inclusion fee.
    resource_fee: u64,

    /// The opaque ledger footprint the final envelope must carry.
    footprint: EnvelopeBytes,
}

impl SimulationResult {
    /// Returns the resource fee charged on top of the inclusion fee.
    pub fn resource_fee(&self) -> u64 {
        self.resource_fee
    }

    /// Returns the opaque ledger footprint.
    pub fn footprint(&self) -> &EnvelopeBytes {
        &self.footprint
    }
}

/// The synchronous status a submission returns with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SubmitStatus {
    /// The envelope was applied synchronously.
    Success,
    /// The envelope was accepted and is awaiting inclusion.
    Pending,
    /// The envelope was rejected outright.
    Failed,
}

/// The receipt a submission returns with.
#[derive(Debug, Clone, Builder, Dissolve)]
pub struct SubmitReceipt {
    /// The synchronous outcome.
    status: SubmitStatus,

    /// The reference to poll confirmation under, when the ledger issued one.
    reference: Option<SettlementRef>,

    /// Ledger-provided failure detail, when available.
    detail: Option<String>,
}

impl SubmitReceipt {
    /// Returns the synchronous outcome.
    pub fn status(&self) -> SubmitStatus {
        self.status
    }

    /// Returns the reference to poll confirmation under, if one was issued.
    pub fn reference(&self) -> Option<&SettlementRef> {
        self.reference.as_ref()
    }

    /// Returns ledger-provided failure detail, if any.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

/// The confirmation status of a previously submitted envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConfirmationStatus {
    /// The transaction landed and applied successfully.
    Success,
    /// The transaction landed and failed.
    Failed,
    /// The transaction has not reached a terminal status yet.
    Pending,
    /// The ledger does not know the reference (yet).
    NotFound,
}

/// One confirmation poll response.
#[derive(Debug, Clone, Builder, Dissolve)]
pub struct TxStatusReport {
    /// The confirmation status.
    status: ConfirmationStatus,

    /// Ledger-provided detail, when available.
    detail: Option<String>,
}

impl TxStatusReport {
    /// Returns the confirmation status.
    pub fn status(&self) -> ConfirmationStatus {
        self.status
    }

    /// Returns ledger-provided detail, if any.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

/// Errors reported by a [`LedgerQueryService`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The queried account does not exist on the ledger.
    #[error("account not found on ledger: {0}")]
    AccountNotFound(AccountAddress),

    /// The ledger ran the simulation and reported an error.
    #[error("simulation error: {0}")]
    Simulation(Cow<'static, str>),

    /// The service could not reach the ledger or the response was malformed.
    #[error("ledger transport error: {0}")]
    Transport(Cow<'static, str>),
}

impl LedgerError {
    /// Creates a [`LedgerError::Simulation`] from anything convertible into
    /// the payload.
    pub fn simulation<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Simulation(err.into())
    }

    /// Creates a [`LedgerError::Transport`] from anything convertible into
    /// the payload.
    pub fn transport<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Transport(err.into())
    }
}

/// Errors reported by a [`WalletSigner`] implementation.
///
/// User cancellation is kept distinct from technical failure so a caller can
/// decide between re-prompting and reporting an outage.
#[derive(Debug, thiserror::Error)]
pub enum WalletSignerError {
    /// The user declined the signature request.
    #[error("signature request declined by the user")]
    Declined,

    /// The wallet failed for a technical reason (disconnect, internal error).
    #[error("wallet failure: {0}")]
    Wallet(Cow<'static, str>),
}

impl WalletSignerError {
    /// Creates a [`WalletSignerError::Wallet`] from anything convertible into
    /// the payload.
    pub fn wallet<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Wallet(err.into())
    }

    /// Returns whether the failure was a user decision rather than a
    /// technical fault.
    pub fn is_declined(&self) -> bool {
        matches!(self, Self::Declined)
    }
}

/// Read-only ledger access plus the two side-effecting submission calls.
///
/// Every method suspends on a network round trip; none of them rely on
/// client-side caching, so a dropped call leaves nothing to clean up.
#[async_trait]
pub trait LedgerQueryService: Send + Sync {
    /// Resolves the live state of `address`.
    async fn account_state(&self, address: &AccountAddress) -> Result<AccountState, LedgerError>;

    /// Dry-runs `envelope`, resolving its resource costs and footprint.
    async fn simulate(&self, envelope: &Envelope) -> Result<SimulationResult, LedgerError>;

    /// Submits `envelope` to the network.
    ///
    /// Submission is side-effecting and not idempotent; callers decide
    /// whether and when to retry.
    async fn submit(&self, envelope: &Envelope) -> Result<SubmitReceipt, LedgerError>;

    /// Queries the confirmation status of a previously submitted envelope.
    async fn transaction_status(
        &self,
        reference: &SettlementRef,
    ) -> Result<TxStatusReport, LedgerError>;
}

/// A wallet capable of signing envelopes on behalf of one signer.
///
/// Never assumed synchronous: a signature request may sit in front of a
/// human indefinitely, and callers must be able to abandon it without side
/// effects.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Requests a signature over `envelope` under the given context.
    ///
    /// On success the returned envelope carries every prior signature plus
    /// the wallet's new one, appended last.
    async fn sign_envelope(
        &self,
        envelope: &Envelope,
        ctx: &SigningContext,
    ) -> Result<Envelope, WalletSignerError>;
}
