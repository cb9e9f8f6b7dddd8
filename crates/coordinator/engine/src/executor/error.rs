use std::borrow::Cow;

use multisig_coordinator_registry::ApprovalLedgerError;
use multisig_ledger_client::provider::{LedgerError, WalletSignerError};

/// A [`Result`](core::result::Result) alias where the `Err` case defaults to
/// [`ExecutionError`].
pub type Result<T, E = ExecutionError> = core::result::Result<T, E>;

/// The ways driving a ready proposal on chain can fail.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// The wallet declined or failed to produce the final signature. No
    /// proposal state was touched.
    #[error("signing aborted: {0}")]
    SigningAborted(#[from] WalletSignerError),

    /// The ledger reported the submitted envelope as failed. The proposal
    /// stays `Ready`.
    #[error("on-chain execution failed: {0}")]
    OnChainExecutionFailed(Cow<'static, str>),

    /// No terminal status was observed within the confirmation window. The
    /// transaction may still land later; re-query out of band before
    /// resubmitting.
    #[error("confirmation window elapsed without a terminal transaction status")]
    ConfirmationTimeout,

    /// The approval ledger refused the execution, e.g. because the proposal
    /// is below threshold or already executed.
    #[error("approval ledger error: {0}")]
    Approval(#[from] ApprovalLedgerError),

    /// Talking to the ledger failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl ExecutionError {
    /// Creates a new [`ExecutionError::OnChainExecutionFailed`] error.
    pub fn on_chain<E>(detail: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::OnChainExecutionFailed(detail.into())
    }
}
