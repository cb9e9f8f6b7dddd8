//! Error surface of the coordinator engine.

use std::borrow::Cow;

use multisig_coordinator_registry::ApprovalLedgerError;
use multisig_ledger_client::{
    error::EnvelopeBuilderError,
    provider::{LedgerError, WalletSignerError},
};

use crate::executor::ExecutionError;

/// A [`Result`](core::result::Result) alias where the `Err` case defaults to
/// [`MultisigEngineError`].
pub type Result<T, E = MultisigEngineError> = core::result::Result<T, E>;

/// An opaque failure of an engine operation.
///
/// Callers that need to branch on the cause inspect [`kind`](Self::kind);
/// everything else can treat the value as a plain error.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct MultisigEngineError(#[from] MultisigEngineErrorKind);

impl MultisigEngineError {
    /// The underlying failure kind.
    pub fn kind(&self) -> &MultisigEngineErrorKind {
        &self.0
    }
}

/// The kinds of failure an engine operation can surface.
#[derive(Debug, thiserror::Error)]
pub enum MultisigEngineErrorKind {
    /// Envelope construction or fee assembly failed before anything was
    /// stored.
    #[error("envelope builder error: {0}")]
    Build(#[from] EnvelopeBuilderError),

    /// The approval ledger rejected the operation.
    #[error("approval ledger error: {0}")]
    Approval(#[from] ApprovalLedgerError),

    /// Driving a ready proposal on chain failed.
    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// The wallet declined or failed to sign.
    #[error("signing aborted: {0}")]
    SigningAborted(#[from] WalletSignerError),

    /// A live ledger query failed.
    #[error("ledger query error: {0}")]
    Query(#[from] LedgerError),

    /// The engine configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(Cow<'static, str>),

    /// Any other error.
    #[error("error: {0}")]
    Other(Cow<'static, str>),
}

impl MultisigEngineErrorKind {
    /// Creates a new [`MultisigEngineErrorKind::NotFound`] error.
    pub fn not_found<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::NotFound(err.into())
    }

    /// Creates a new [`MultisigEngineErrorKind::Other`] error.
    pub fn other<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Other(err.into())
    }
}
