//! Proposal domain models, approval records, and status tracking.

use core::fmt;

use alloc::string::String;

use bon::Builder;
use dissolve_derive::Dissolve;
use strum::{Display, EnumString, IntoStaticStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use serde_with::DisplayFromStr;

use crate::{
    Timestamps,
    account::{AccountAddress, SignerKey},
    envelope::EnvelopeBytes,
};

/// The numeric identifier of a proposal.
///
/// Identifiers are unique per account and assigned monotonically by the
/// registry store; this wrapper provides type safety and seamless conversion
/// to/from the underlying integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct ProposalId(u64);

/// The external identifier confirming on-chain execution, typically a
/// transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct SettlementRef(String);

/// The lifecycle status of a proposal.
///
/// A proposal progresses through these states as signatures are collected
/// and the envelope is executed. `RejectedOrDeleted` is reachable from any
/// non-executed state; `Executed` and `RejectedOrDeleted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ProposalStatus {
    /// The proposal exists but its envelope carries no signature yet.
    Created,
    /// Signatures are being collected and the threshold is not met.
    Pending,
    /// The collected signature weight meets the account threshold.
    Ready,
    /// The envelope was confirmed on-chain; the proposal is immutable.
    Executed,
    /// The proposal was rejected or soft-deleted; it stays queryable for
    /// audit but accepts no further mutation.
    RejectedOrDeleted,
}

impl ProposalStatus {
    /// Returns whether the status accepts no further signatures or envelope
    /// mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Executed | Self::RejectedOrDeleted)
    }
}

/// A proposed action against a multisig account, tracked from creation
/// through approval to execution or rejection.
///
/// # Type Parameters
///
/// * `AUX` - Auxiliary data type, defaults to [`Timestamps`] for tracking
///   metadata.
#[cfg_attr(feature = "serde", serde_with::serde_as)]
#[derive(Debug, Clone, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Proposal<AUX = Timestamps> {
    /// The per-account numeric identifier.
    id: ProposalId,

    /// The multisig account this proposal targets.
    account: AccountAddress,

    /// A human-readable description for display purposes.
    description: String,

    /// The canonical envelope, unsigned at creation and replaced as
    /// signatures are appended.
    envelope: EnvelopeBytes,

    /// The current lifecycle status.
    #[cfg_attr(feature = "serde", serde_as(as = "DisplayFromStr"))]
    status: ProposalStatus,

    /// The settlement reference, present once executed.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    settlement_ref: Option<SettlementRef>,

    /// Whether the proposal has been soft-deleted.
    #[builder(default)]
    deleted: bool,

    /// Auxiliary metadata associated with this proposal.
    aux: AUX,
}

impl<AUX> Proposal<AUX> {
    /// Returns the per-account numeric identifier.
    pub fn id(&self) -> ProposalId {
        self.id
    }

    /// Returns the address of the multisig account this proposal targets.
    pub fn account(&self) -> &AccountAddress {
        &self.account
    }

    /// Returns the human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the canonical envelope bytes currently on record.
    pub fn envelope(&self) -> &EnvelopeBytes {
        &self.envelope
    }

    /// Returns the current lifecycle status.
    pub fn status(&self) -> ProposalStatus {
        self.status
    }

    /// Returns the settlement reference, if the proposal has executed.
    pub fn settlement_ref(&self) -> Option<&SettlementRef> {
        self.settlement_ref.as_ref()
    }

    /// Returns whether the proposal has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Returns a reference to the auxiliary metadata.
    pub fn aux(&self) -> &AUX {
        &self.aux
    }

    /// Replaces the canonical envelope and status after an accepted
    /// signature.
    pub fn with_approval(mut self, envelope: EnvelopeBytes, status: ProposalStatus) -> Self {
        self.envelope = envelope;
        self.status = status;
        self
    }

    /// Transitions the proposal to [`ProposalStatus::Executed`], fixing the
    /// settlement reference.
    pub fn into_executed(mut self, reference: SettlementRef) -> Self {
        self.status = ProposalStatus::Executed;
        self.settlement_ref = Some(reference);
        self
    }

    /// Sets the soft-delete flag and moves the status to
    /// [`ProposalStatus::RejectedOrDeleted`].
    pub fn into_deleted(mut self) -> Self {
        self.deleted = true;
        self.status = ProposalStatus::RejectedOrDeleted;
        self
    }

    /// Replaces the auxiliary data with a new value, returning both the
    /// updated proposal and the old auxiliary data.
    pub fn with_aux<AUX2>(self, aux: AUX2) -> (Proposal<AUX2>, AUX) {
        let proposal = Proposal {
            id: self.id,
            account: self.account,
            description: self.description,
            envelope: self.envelope,
            status: self.status,
            settlement_ref: self.settlement_ref,
            deleted: self.deleted,
            aux,
        };

        (proposal, self.aux)
    }
}

/// Proof that one signer approved one proposal's envelope.
///
/// Records are ordered by acceptance time via `ordinal`; the ordering is
/// exposed for display and carries no weight in threshold evaluation.
///
/// # Type Parameters
///
/// * `AUX` - Auxiliary data type, defaults to [`Timestamps`] for tracking
///   metadata.
#[derive(Debug, Clone, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignatureRecord<AUX = Timestamps> {
    /// The proposal this record belongs to.
    proposal_id: ProposalId,

    /// The account the proposal targets.
    account: AccountAddress,

    /// The approving signer.
    signer: SignerKey,

    /// The zero-based acceptance order of this record within its proposal.
    ordinal: u32,

    /// Auxiliary metadata associated with this record.
    aux: AUX,
}

impl<AUX> SignatureRecord<AUX> {
    /// Returns the proposal this record belongs to.
    pub fn proposal_id(&self) -> ProposalId {
        self.proposal_id
    }

    /// Returns the account the proposal targets.
    pub fn account(&self) -> &AccountAddress {
        &self.account
    }

    /// Returns the approving signer.
    pub fn signer(&self) -> &SignerKey {
        &self.signer
    }

    /// Returns the zero-based acceptance order within the proposal.
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Returns a reference to the auxiliary metadata.
    pub fn aux(&self) -> &AUX {
        &self.aux
    }
}

/// Statistics over one account's proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProposalStats {
    /// The total number of proposals, soft-deleted ones included.
    total: u64,

    /// The number of proposals created within the last month.
    last_month: u64,

    /// The total number of executed proposals.
    total_executed: u64,
}

impl ProposalStats {
    /// Returns the total number of proposals.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Returns the number of proposals created within the last month.
    pub fn last_month(&self) -> u64 {
        self.last_month
    }

    /// Returns the total number of executed proposals.
    pub fn total_executed(&self) -> u64 {
        self.total_executed
    }
}

impl From<u64> for ProposalId {
    /// Wraps a raw numeric identifier.
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ProposalId> for u64 {
    /// Unwraps the raw numeric identifier.
    fn from(ProposalId(id): ProposalId) -> Self {
        id
    }
}

impl ProposalId {
    /// Returns the identifier that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ProposalId {
    /// Formats the identifier as its underlying integer representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SettlementRef {
    /// Returns the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SettlementRef {
    /// Wraps a plain string reference.
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

impl From<&str> for SettlementRef {
    /// Wraps a plain string reference.
    fn from(reference: &str) -> Self {
        Self(reference.into())
    }
}

impl From<SettlementRef> for String {
    /// Unwraps the underlying string reference.
    fn from(SettlementRef(reference): SettlementRef) -> Self {
        reference
    }
}

impl fmt::Display for SettlementRef {
    /// Formats the reference as its underlying string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
