//! Envelope builder errors.

use std::borrow::Cow;

use multisig_coordinator_domain::account::AccountAddress;

use crate::provider::LedgerError;

/// A [`Result`](core::result::Result) alias defaulting to
/// [`EnvelopeBuilderError`].
pub type Result<T, E = EnvelopeBuilderError> = core::result::Result<T, E>;

/// Errors produced while building envelopes.
///
/// Validation variants fire before any ledger call and are safe to retry
/// after correcting input; the external variants wrap collaborator failures
/// and leave the retry decision to the caller.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeBuilderError {
    /// The transfer amount must be strictly positive.
    #[error("invalid amount: {0}")]
    InvalidAmount(u64),

    /// A required invocation argument is missing or has the wrong shape.
    #[error("schema mismatch for argument `{name}`: {reason}")]
    SchemaMismatch {
        /// The declared parameter name.
        name: String,
        /// Why the supplied argument did not satisfy the declaration.
        reason: Cow<'static, str>,
    },

    /// A declared argument kind has no conversion rule.
    #[error("unsupported argument kind `{kind}` for `{name}`")]
    UnsupportedType {
        /// The declared parameter name.
        name: String,
        /// The declared kind that could not be converted.
        kind: String,
    },

    /// A signer update that changes nothing was requested.
    #[error("no change requested: signer sets are equal and no threshold update was given")]
    NoChangeRequested,

    /// The update would leave the account with an unsatisfiable threshold.
    #[error("invalid threshold {threshold} for a signer set of {signers}")]
    InvalidThreshold {
        /// The threshold the update would leave in force.
        threshold: u8,
        /// The size of the signer set after the update.
        signers: usize,
    },

    /// The source account does not resolve on the ledger.
    #[error("account not found: {0}")]
    AccountNotFound(AccountAddress),

    /// The dry-run reported an error; the envelope is not submittable as is.
    #[error("simulation failed: {0}")]
    SimulationFailed(Cow<'static, str>),

    /// A ledger query failed below the builder's own semantics.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Any other builder failure.
    #[error("other error: {0}")]
    Other(Cow<'static, str>),
}

impl EnvelopeBuilderError {
    /// Creates a [`EnvelopeBuilderError::SchemaMismatch`] for `name`.
    pub fn schema_mismatch<N, R>(name: N, reason: R) -> Self
    where
        N: Into<String>,
        Cow<'static, str>: From<R>,
    {
        Self::SchemaMismatch {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a [`EnvelopeBuilderError::SimulationFailed`] from anything
    /// convertible into the payload.
    pub fn simulation_failed<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::SimulationFailed(err.into())
    }

    /// Creates a [`EnvelopeBuilderError::Other`] from anything convertible
    /// into the payload.
    pub fn other<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Other(err.into())
    }
}
