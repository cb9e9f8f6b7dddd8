//! The registry store contract the approval ledger runs against.
//!
//! The authoritative account and proposal records live in an external
//! registry (a service or an on-chain contract); this module defines the
//! interface the in-process bookkeeping calls into. [`MemoryRegistry`]
//! (crate::MemoryRegistry) is the bundled in-process implementation used by
//! tests and single-instance deployments.

use std::borrow::Cow;

use async_trait::async_trait;
use bon::Builder;
use dissolve_derive::Dissolve;

use multisig_coordinator_domain::{
    Timestamps,
    account::{AccountAddress, MultisigAccount, SignerKey, WithSigners},
    envelope::EnvelopeBytes,
    proposal::{Proposal, ProposalId, ProposalStats, ProposalStatus, SettlementRef, SignatureRecord},
};

/// Errors reported by a [`RegistryStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum RegistryStoreError {
    /// The requested account or proposal does not exist.
    #[error("not found: {0}")]
    NotFound(Cow<'static, str>),

    /// The stored envelope changed between the caller's read and this write.
    ///
    /// The caller's validation ran against a stale envelope; refetching and
    /// re-validating is the resolution.
    #[error("stored envelope changed since it was read")]
    StaleEnvelope,

    /// The proposal's current status does not admit the requested write.
    #[error("invalid transition from status `{from}`")]
    InvalidTransition {
        /// The status the proposal held when the write was rejected.
        from: ProposalStatus,
    },

    /// The write failed a store-side validation rule.
    #[error("validation error: {0}")]
    Validation(Cow<'static, str>),

    /// Stored data could not be converted to or from its persisted form.
    #[error("serialization error: {0}")]
    Serialization(Cow<'static, str>),

    /// Any other store failure.
    #[error("other error: {0}")]
    Other(Cow<'static, str>),
}

impl RegistryStoreError {
    /// Creates a [`RegistryStoreError::NotFound`] from anything convertible
    /// into the payload.
    pub fn not_found<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::NotFound(err.into())
    }

    /// Creates a [`RegistryStoreError::Validation`] from anything convertible
    /// into the payload.
    pub fn validation<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Validation(err.into())
    }

    /// Creates a [`RegistryStoreError::Other`] from anything convertible into
    /// the payload.
    pub fn other<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Other(err.into())
    }
}

/// Insert parameters for a new proposal.
///
/// The store assigns the per-account identifier and the timestamps; callers
/// supply everything else.
#[derive(Debug, Clone, Builder, Dissolve)]
pub struct NewProposal {
    /// The multisig account the proposal targets.
    account: AccountAddress,

    /// A human-readable description for display purposes.
    description: String,

    /// The canonical envelope at creation time.
    envelope: EnvelopeBytes,

    /// The status the proposal starts in.
    status: ProposalStatus,
}

impl NewProposal {
    /// Returns the multisig account the proposal targets.
    pub fn account(&self) -> &AccountAddress {
        &self.account
    }

    /// Returns the human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the canonical envelope at creation time.
    pub fn envelope(&self) -> &EnvelopeBytes {
        &self.envelope
    }

    /// Returns the status the proposal starts in.
    pub fn status(&self) -> ProposalStatus {
        self.status
    }
}

/// Write parameters for recording one accepted signature.
///
/// `prior_envelope` carries the bytes the caller's validation ran against;
/// the store applies the write only while those bytes are still current,
/// failing [`RegistryStoreError::StaleEnvelope`] otherwise. This is the
/// compare-and-swap that keeps interleaved approvals from clobbering each
/// other without holding any lock across a network round trip.
#[derive(Debug, Clone, Builder, Dissolve)]
pub struct NewApproval {
    /// The multisig account the proposal targets.
    account: AccountAddress,

    /// The proposal being approved.
    proposal_id: ProposalId,

    /// The approving signer.
    signer: SignerKey,

    /// The envelope bytes the caller validated against.
    prior_envelope: EnvelopeBytes,

    /// The replacement envelope carrying the new signature.
    signed_envelope: EnvelopeBytes,

    /// The status the proposal moves to once the record is inserted.
    new_status: ProposalStatus,
}

impl NewApproval {
    /// Returns the multisig account the proposal targets.
    pub fn account(&self) -> &AccountAddress {
        &self.account
    }

    /// Returns the proposal being approved.
    pub fn proposal_id(&self) -> ProposalId {
        self.proposal_id
    }

    /// Returns the approving signer.
    pub fn signer(&self) -> &SignerKey {
        &self.signer
    }

    /// Returns the envelope bytes the caller validated against.
    pub fn prior_envelope(&self) -> &EnvelopeBytes {
        &self.prior_envelope
    }

    /// Returns the replacement envelope carrying the new signature.
    pub fn signed_envelope(&self) -> &EnvelopeBytes {
        &self.signed_envelope
    }

    /// Returns the status the proposal moves to.
    pub fn new_status(&self) -> ProposalStatus {
        self.new_status
    }
}

/// Long-term persistence of accounts, proposals, and signature records.
///
/// Every mutating operation is atomic: it either applies fully or reports an
/// error with nothing written, so a caller abandoning a suspended call never
/// leaves partial state behind.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Saves an account, assigning timestamps.
    ///
    /// Re-registering an existing address replaces its record while keeping
    /// the original creation timestamp.
    async fn save_account(
        &self,
        account: MultisigAccount<WithSigners, ()>,
    ) -> Result<MultisigAccount<WithSigners>, RegistryStoreError>;

    /// Resolves an account by address.
    async fn fetch_account(
        &self,
        address: &AccountAddress,
    ) -> Result<Option<MultisigAccount<WithSigners>>, RegistryStoreError>;

    /// Lists every account whose signer set contains `signer`.
    async fn accounts_for_signer(
        &self,
        signer: &SignerKey,
    ) -> Result<Vec<MultisigAccount<WithSigners>>, RegistryStoreError>;

    /// Inserts a new proposal, assigning the next per-account identifier and
    /// timestamps.
    async fn create_proposal(
        &self,
        proposal: NewProposal,
    ) -> Result<Proposal<Timestamps>, RegistryStoreError>;

    /// Resolves a proposal by account and identifier, soft-deleted ones
    /// included.
    async fn fetch_proposal(
        &self,
        account: &AccountAddress,
        id: ProposalId,
    ) -> Result<Option<Proposal<Timestamps>>, RegistryStoreError>;

    /// Lists an account's proposals in identifier order.
    ///
    /// Soft-deleted proposals are excluded unless `include_deleted` is set.
    async fn list_proposals(
        &self,
        account: &AccountAddress,
        include_deleted: bool,
    ) -> Result<Vec<Proposal<Timestamps>>, RegistryStoreError>;

    /// Lists a proposal's signature records in acceptance order.
    async fn signature_records(
        &self,
        account: &AccountAddress,
        id: ProposalId,
    ) -> Result<Vec<SignatureRecord<Timestamps>>, RegistryStoreError>;

    /// Atomically inserts a signature record, replaces the stored envelope,
    /// and moves the proposal status.
    ///
    /// Fails [`RegistryStoreError::StaleEnvelope`] when the stored envelope
    /// no longer equals [`NewApproval::prior_envelope`], and
    /// [`RegistryStoreError::InvalidTransition`] when the proposal has
    /// reached a terminal status since the caller's read.
    async fn record_approval(
        &self,
        approval: NewApproval,
    ) -> Result<SignatureRecord<Timestamps>, RegistryStoreError>;

    /// Transitions a proposal to executed, fixing the settlement reference.
    ///
    /// Valid only from [`ProposalStatus::Ready`]; any other current status
    /// fails [`RegistryStoreError::InvalidTransition`].
    async fn mark_executed(
        &self,
        account: &AccountAddress,
        id: ProposalId,
        reference: SettlementRef,
    ) -> Result<(), RegistryStoreError>;

    /// Sets a proposal's soft-delete flag.
    ///
    /// A no-op when already deleted; fails
    /// [`RegistryStoreError::InvalidTransition`] from
    /// [`ProposalStatus::Executed`].
    async fn soft_delete(
        &self,
        account: &AccountAddress,
        id: ProposalId,
    ) -> Result<(), RegistryStoreError>;

    /// Computes proposal statistics for an account.
    async fn proposal_stats(
        &self,
        account: &AccountAddress,
    ) -> Result<ProposalStats, RegistryStoreError>;
}
