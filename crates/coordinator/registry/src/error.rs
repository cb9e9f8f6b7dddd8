//! Approval ledger errors.

use std::borrow::Cow;

use multisig_coordinator_domain::{account::SignerKey, proposal::ProposalStatus};
use multisig_ledger_client::encoding::EnvelopeCodecError;

use crate::store::RegistryStoreError;

/// A [`Result`](core::result::Result) alias defaulting to
/// [`ApprovalLedgerError`].
pub type Result<T, E = ApprovalLedgerError> = core::result::Result<T, E>;

/// Errors produced by approval bookkeeping.
///
/// The consistency variants (`EnvelopeTampered`, `AlreadyExecuted`,
/// `ThresholdNotMet`, `ProposalDeleted`) mean the caller's view of proposal
/// state is stale; the resolution is refetch-then-retry, never a blind
/// retry.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalLedgerError {
    /// The signer is not a member of the account's signer set.
    #[error("signer `{0}` is not a member of the account's signer set")]
    UnauthorizedSigner(SignerKey),

    /// The submitted envelope does not extend the one on record.
    ///
    /// A prior signature is missing or altered, more than one signature was
    /// appended at once, or the write raced a concurrent approval.
    #[error("envelope does not extend the one on record")]
    EnvelopeTampered,

    /// The proposal has already executed and accepts no further mutation.
    #[error("proposal already executed")]
    AlreadyExecuted,

    /// The collected signature weight does not meet the account threshold.
    #[error("approval threshold not met")]
    ThresholdNotMet,

    /// The proposal was rejected or soft-deleted.
    #[error("proposal was rejected or deleted")]
    ProposalDeleted,

    /// The requested account or proposal does not exist.
    #[error("not found: {0}")]
    NotFound(Cow<'static, str>),

    /// The stored envelope bytes could not be decoded, or an envelope could
    /// not be encoded for storage.
    #[error("envelope codec error: {0}")]
    Codec(#[from] EnvelopeCodecError),

    /// A store failure below the ledger's own semantics.
    #[error("registry store error: {0}")]
    Store(RegistryStoreError),

    /// The input failed a validation rule.
    #[error("validation error: {0}")]
    Validation(Cow<'static, str>),

    /// Any other approval ledger failure.
    #[error("other error: {0}")]
    Other(Cow<'static, str>),
}

impl ApprovalLedgerError {
    /// Creates a [`ApprovalLedgerError::Validation`] from anything
    /// convertible into the payload.
    pub fn validation<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Validation(err.into())
    }

    /// Creates a [`ApprovalLedgerError::Other`] from anything convertible
    /// into the payload.
    pub fn other<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Other(err.into())
    }
}

impl From<RegistryStoreError> for ApprovalLedgerError {
    /// Lifts store-level rejections into the ledger taxonomy.
    ///
    /// A compare-and-swap failure surfaces as `EnvelopeTampered` and a
    /// transition rejection surfaces as the consistency error matching the
    /// status the store observed, so callers see one stable contract
    /// regardless of which side detected the staleness.
    fn from(err: RegistryStoreError) -> Self {
        match err {
            RegistryStoreError::StaleEnvelope => Self::EnvelopeTampered,
            RegistryStoreError::InvalidTransition { from: ProposalStatus::Executed } => {
                Self::AlreadyExecuted
            },
            RegistryStoreError::InvalidTransition { from: ProposalStatus::RejectedOrDeleted } => {
                Self::ProposalDeleted
            },
            RegistryStoreError::InvalidTransition { .. } => Self::ThresholdNotMet,
            RegistryStoreError::NotFound(what) => Self::NotFound(what),
            other => Self::Store(other),
        }
    }
}
