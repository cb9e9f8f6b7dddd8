//! Transaction envelope model and pure envelope queries.
//!
//! An envelope is the serializable representation of one proposed ledger
//! transaction: source account, fee, sequence, validity window, ordered
//! operations, and the signatures collected so far. Envelopes are append-only
//! with respect to signatures: nothing in this module ever reorders or
//! rewrites a previously attached signature, which is what lets concurrent
//! signers detect stale views by simple prefix comparison.

use core::fmt;

use alloc::{string::String, vec::Vec};

use bon::Builder;
use dissolve_derive::Dissolve;
use strum::{Display, EnumString, IntoStaticStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::account::{AccountAddress, SignerKey};

#[cfg(feature = "serde")]
use crate::with_serde;

/// The address of a deployed contract an invocation targets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct ContractAddress(String);

/// The version tag of the envelope byte format.
///
/// Decoders reject bytes whose version they do not understand instead of
/// guessing at field layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EnvelopeVersion {
    /// The initial envelope layout.
    V1,
}

impl Default for EnvelopeVersion {
    /// Defaults to the current layout, [`EnvelopeVersion::V1`].
    fn default() -> Self {
        Self::V1
    }
}

/// The validity window of an envelope.
///
/// The ledger rejects an envelope submitted outside its window, so a stale
/// proposal expires on-chain rather than executing long after its approvals
/// were collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeBounds {
    /// The earliest ledger time at which the envelope may execute.
    min_time: chrono::DateTime<chrono::Utc>,

    /// The latest ledger time at which the envelope may execute.
    max_time: chrono::DateTime<chrono::Utc>,
}

impl TimeBounds {
    /// Returns the earliest ledger time at which the envelope may execute.
    pub fn min_time(&self) -> chrono::DateTime<chrono::Utc> {
        self.min_time
    }

    /// Returns the latest ledger time at which the envelope may execute.
    pub fn max_time(&self) -> chrono::DateTime<chrono::Utc> {
        self.max_time
    }
}

/// The declared primitive kind of one invocation argument.
///
/// Schemas map parameter names to these kinds so arguments can be converted
/// into the ledger's typed value representation before an invocation envelope
/// is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ArgKind {
    /// A ledger account or contract address.
    Address,
    /// A boolean flag.
    Bool,
    /// An opaque byte blob, supplied hex-encoded.
    Bytes,
    /// A signed 32-bit integer.
    I32,
    /// A signed 64-bit integer.
    I64,
    /// A signed 128-bit integer.
    I128,
    /// A UTF-8 string.
    Str,
    /// An unsigned 32-bit integer.
    U32,
    /// An unsigned 64-bit integer.
    U64,
    /// An unsigned 128-bit integer.
    U128,
}

/// One declared invocation parameter: its name and primitive kind.
///
/// Parameters keep their declaration order, which is also the order their
/// converted values take inside an [`Operation::Invoke`].
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArgParam {
    /// The parameter name arguments are matched against.
    name: String,

    /// The declared primitive kind.
    kind: ArgKind,
}

impl ArgParam {
    /// Returns the parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared primitive kind.
    pub fn kind(&self) -> ArgKind {
        self.kind
    }
}

/// An ordered invocation parameter schema.
pub type ArgSchema = Vec<ArgParam>;

/// One invocation argument converted to the ledger's typed representation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InvokeValue {
    /// A ledger account or contract address.
    Address(String),
    /// A boolean flag.
    Bool(bool),
    /// An opaque byte blob.
    Bytes(#[cfg_attr(feature = "serde", serde(with = "with_serde::hex_bytes"))] Vec<u8>),
    /// A signed 32-bit integer.
    I32(i32),
    /// A signed 64-bit integer.
    I64(i64),
    /// A signed 128-bit integer.
    I128(i128),
    /// A UTF-8 string.
    Str(String),
    /// An unsigned 32-bit integer.
    U32(u32),
    /// An unsigned 64-bit integer.
    U64(u64),
    /// An unsigned 128-bit integer.
    U128(u128),
}

/// One operation inside an envelope.
///
/// Operations execute atomically and in order once the envelope lands
/// on-chain.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operation {
    /// Moves `amount` native units from the envelope source to `destination`.
    Payment {
        /// The receiving account.
        destination: AccountAddress,
        /// The amount in the ledger's smallest native unit.
        amount: u64,
    },

    /// Invokes `function` on `contract` with the given typed arguments.
    Invoke {
        /// The target contract.
        contract: ContractAddress,
        /// The exported function to call.
        function: String,
        /// The converted arguments, in declaration order.
        args: Vec<InvokeValue>,
    },

    /// Sets the weight of `signer` on the source account.
    ///
    /// Weight zero revokes the signer; a positive weight adds or updates it.
    SetSignerWeight {
        /// The affected signer.
        signer: SignerKey,
        /// The new signature weight.
        weight: u8,
    },

    /// Sets the source account's three threshold tiers.
    SetThresholds {
        /// The low-security tier.
        low: u8,
        /// The medium-security tier.
        medium: u8,
        /// The high-security tier, which gates signer and threshold changes.
        high: u8,
    },
}

/// One signature attached to an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnvelopeSignature {
    /// The key of the signer this signature is attributed to.
    signer: SignerKey,

    /// The raw signature bytes produced by the signer's wallet.
    #[cfg_attr(feature = "serde", serde(with = "with_serde::hex_bytes"))]
    bytes: Vec<u8>,
}

impl EnvelopeSignature {
    /// Returns the key of the signer this signature is attributed to.
    pub fn signer(&self) -> &SignerKey {
        &self.signer
    }

    /// Returns the raw signature bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A transaction envelope: the signable, submittable unit this coordinator
/// moves through the proposal lifecycle.
///
/// Envelopes are created unsigned by the envelope builder, gain signatures by
/// appending (never by rewriting), and become terminal once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Envelope {
    /// The byte-format version this envelope serializes under.
    #[builder(default)]
    version: EnvelopeVersion,

    /// The account whose sequence and balance the envelope spends.
    source: AccountAddress,

    /// The total fee offered, in the ledger's smallest native unit.
    fee: u64,

    /// The source account sequence number this envelope consumes.
    sequence: u64,

    /// The validity window.
    time_bounds: TimeBounds,

    /// An optional human-readable memo carried on-chain.
    memo: Option<String>,

    /// The ordered operations to execute.
    operations: Vec<Operation>,

    /// The resource fee resolved by simulation, once fees are assembled.
    resource_fee: Option<u64>,

    /// The ledger footprint resolved by simulation, once fees are assembled.
    footprint: Option<EnvelopeBytes>,

    /// The signatures collected so far, in attachment order.
    #[builder(default)]
    signatures: Vec<EnvelopeSignature>,
}

impl Envelope {
    /// Returns the byte-format version.
    pub fn version(&self) -> EnvelopeVersion {
        self.version
    }

    /// Returns the source account.
    pub fn source(&self) -> &AccountAddress {
        &self.source
    }

    /// Returns the total fee offered.
    pub fn fee(&self) -> u64 {
        self.fee
    }

    /// Returns the source sequence number this envelope consumes.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the validity window.
    pub fn time_bounds(&self) -> TimeBounds {
        self.time_bounds
    }

    /// Returns the memo, if one is attached.
    pub fn memo(&self) -> Option<&str> {
        self.memo.as_deref()
    }

    /// Returns the ordered operations.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Returns the simulation-resolved resource fee, once assembled.
    pub fn resource_fee(&self) -> Option<u64> {
        self.resource_fee
    }

    /// Returns the simulation-resolved footprint, once assembled.
    pub fn footprint(&self) -> Option<&EnvelopeBytes> {
        self.footprint.as_ref()
    }

    /// Returns the attached signatures in attachment order.
    pub fn signatures(&self) -> &[EnvelopeSignature] {
        &self.signatures
    }

    /// Returns whether no signature has been attached yet.
    pub fn is_unsigned(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Returns the signature attributed to `signer`, if present.
    pub fn signature_of(&self, signer: &SignerKey) -> Option<&EnvelopeSignature> {
        self.signatures
            .iter()
            .find(|signature| signature.signer() == signer)
    }

    /// Returns whether a signature attributed to `signer` is attached.
    pub fn is_signed_by(&self, signer: &SignerKey) -> bool {
        self.signature_of(signer).is_some()
    }

    /// Iterates over the keys of all signers with an attached signature.
    pub fn signer_keys(&self) -> impl Iterator<Item = &SignerKey> + '_ {
        self.signatures.iter().map(EnvelopeSignature::signer)
    }

    /// Appends a signature, preserving every previously attached one.
    pub fn with_signature(mut self, signature: EnvelopeSignature) -> Self {
        self.signatures.push(signature);
        self
    }

    /// Folds a simulation result into the envelope.
    ///
    /// The resource fee is added on top of the inclusion fee already offered,
    /// and the footprint is attached for submission.
    pub fn with_assembled_fees(mut self, resource_fee: u64, footprint: EnvelopeBytes) -> Self {
        self.fee = self.fee.saturating_add(resource_fee);
        self.resource_fee = Some(resource_fee);
        self.footprint = Some(footprint);
        self
    }

    /// Returns whether `other` describes the same transaction, ignoring
    /// signatures.
    ///
    /// Any difference in the signed-over fields (source, fee, sequence,
    /// window, memo, operations, assembled resources) invalidates previously
    /// collected signatures, so the comparison covers all of them.
    pub fn core_matches(&self, other: &Envelope) -> bool {
        self.version == other.version
            && self.source == other.source
            && self.fee == other.fee
            && self.sequence == other.sequence
            && self.time_bounds == other.time_bounds
            && self.memo == other.memo
            && self.operations == other.operations
            && self.resource_fee == other.resource_fee
            && self.footprint == other.footprint
    }

    /// Returns whether this envelope extends `prior`: same transaction, with
    /// every signature of `prior` preserved unaltered as a prefix.
    pub fn extends(&self, prior: &Envelope) -> bool {
        self.core_matches(prior)
            && self.signatures.len() >= prior.signatures.len()
            && self.signatures[..prior.signatures.len()] == prior.signatures[..]
    }
}

/// The opaque serialized form of an [`Envelope`].
///
/// This is the only envelope representation the registry store and external
/// collaborators ever see; the structured form above is decoded from it one
/// operation at a time and never cached across operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct EnvelopeBytes(#[cfg_attr(feature = "serde", serde(with = "with_serde::hex_bytes"))] Vec<u8>);

impl EnvelopeBytes {
    /// Returns the serialized bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns the number of serialized bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the serialized form is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for EnvelopeBytes {
    /// Wraps raw serialized bytes.
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<EnvelopeBytes> for Vec<u8> {
    /// Unwraps the raw serialized bytes.
    fn from(EnvelopeBytes(bytes): EnvelopeBytes) -> Self {
        bytes
    }
}

impl AsRef<[u8]> for EnvelopeBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl ContractAddress {
    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ContractAddress {
    /// Wraps a plain string address.
    fn from(address: String) -> Self {
        Self(address)
    }
}

impl From<&str> for ContractAddress {
    /// Wraps a plain string address.
    fn from(address: &str) -> Self {
        Self(address.into())
    }
}

impl From<ContractAddress> for String {
    /// Unwraps the underlying string address.
    fn from(ContractAddress(address): ContractAddress) -> Self {
        address
    }
}

impl fmt::Display for ContractAddress {
    /// Formats the address as its underlying string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
