//! Driving a ready proposal to its on-chain outcome.
//!
//! The [`ExecutionCoordinator`] owns the last mile of the proposal
//! lifecycle: an optional final wallet signature, submission through the
//! [`LedgerQueryService`], confirmation polling when the ledger only
//! acknowledges acceptance, and the terminal `Executed` transition in the
//! approval ledger once the transaction lands.

mod error;

use std::{sync::Arc, time::Duration};

use multisig_coordinator_domain::{
    account::AccountAddress,
    proposal::{ProposalId, ProposalStatus, SettlementRef},
};
use multisig_coordinator_registry::{ApprovalLedger, ApprovalLedgerError};
use multisig_ledger_client::{
    SigningContext,
    encoding::decode_envelope,
    provider::{ConfirmationStatus, LedgerQueryService, SubmitStatus, WalletSigner},
};

pub use self::error::ExecutionError;
use self::error::Result;

/// How often the coordinator re-queries a pending transaction.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// How long the coordinator keeps polling before giving up.
pub const DEFAULT_POLL_WINDOW: Duration = Duration::from_secs(15);

/// Submits ready proposals and confirms their on-chain outcome.
#[derive(Clone)]
pub struct ExecutionCoordinator {
    query: Arc<dyn LedgerQueryService>,
    wallet: Arc<dyn WalletSigner>,
    approvals: ApprovalLedger,
    poll_interval: Duration,
    poll_window: Duration,
}

#[bon::bon]
impl ExecutionCoordinator {
    /// Creates a coordinator over the given ledger and wallet handles.
    #[builder]
    pub fn new(
        query: Arc<dyn LedgerQueryService>,
        wallet: Arc<dyn WalletSigner>,
        approvals: ApprovalLedger,
        #[builder(default = DEFAULT_POLL_INTERVAL)] poll_interval: Duration,
        #[builder(default = DEFAULT_POLL_WINDOW)] poll_window: Duration,
    ) -> Self {
        Self { query, wallet, approvals, poll_interval, poll_window }
    }
}

impl ExecutionCoordinator {
    /// Drives a ready proposal to a terminal on-chain outcome.
    ///
    /// With `require_final_signature` set the executing signer's wallet
    /// countersigns the stored envelope first; that signature rides along
    /// for submission only and is never written back to the approval
    /// ledger. The envelope then goes out through
    /// [`LedgerQueryService::submit`], and a merely accepted transaction is
    /// polled until the ledger reports a terminal status or the
    /// confirmation window elapses.
    ///
    /// Only a confirmed transaction transitions the proposal to
    /// [`ProposalStatus::Executed`]; every failure leaves it `Ready` for
    /// another attempt.
    #[tracing::instrument(
        skip_all,
        fields(%account, %proposal_id, final_signature = require_final_signature),
    )]
    pub async fn execute(
        &self,
        account: &AccountAddress,
        proposal_id: ProposalId,
        ctx: &SigningContext,
        require_final_signature: bool,
    ) -> Result<SettlementRef> {
        let proposal = self
            .approvals
            .proposal(account, proposal_id)
            .await?
            .ok_or_else(|| ApprovalLedgerError::NotFound("proposal does not exist".into()))?;

        match proposal.status() {
            ProposalStatus::Ready => {},
            ProposalStatus::Executed => return Err(ApprovalLedgerError::AlreadyExecuted.into()),
            ProposalStatus::RejectedOrDeleted => {
                return Err(ApprovalLedgerError::ProposalDeleted.into());
            },
            ProposalStatus::Created | ProposalStatus::Pending => {
                return Err(ApprovalLedgerError::ThresholdNotMet.into());
            },
        }

        let stored = decode_envelope(proposal.envelope()).map_err(ApprovalLedgerError::from)?;
        let envelope = if require_final_signature {
            // A decline here leaves every record untouched.
            self.wallet.sign_envelope(&stored, ctx).await?
        } else {
            stored
        };

        let receipt = self.query.submit(&envelope).await?;
        let reference = match receipt.status() {
            SubmitStatus::Success => receipt.reference().cloned().ok_or_else(|| {
                ExecutionError::on_chain("ledger reported success without a settlement reference")
            })?,
            SubmitStatus::Pending => {
                let reference = receipt.reference().cloned().ok_or_else(|| {
                    ExecutionError::on_chain(
                        "ledger accepted the envelope without a settlement reference",
                    )
                })?;
                self.await_confirmation(reference).await?
            },
            SubmitStatus::Failed => {
                let detail =
                    receipt.detail().unwrap_or("submission rejected by the ledger").to_owned();
                return Err(ExecutionError::on_chain(detail));
            },
        };

        self.approvals.mark_executed(account, proposal_id, reference.clone()).await?;
        tracing::info!(%reference, "proposal executed");

        Ok(reference)
    }

    /// Polls the transaction status until it turns terminal or the
    /// confirmation window elapses.
    async fn await_confirmation(&self, reference: SettlementRef) -> Result<SettlementRef> {
        let deadline = tokio::time::Instant::now() + self.poll_window;

        while tokio::time::Instant::now() < deadline {
            tokio::time::sleep(self.poll_interval).await;

            let report = match self.query.transaction_status(&reference).await {
                Ok(report) => report,
                Err(err) => {
                    // One failed poll is not a verdict; the window caps the
                    // retries.
                    tracing::warn!(%reference, %err, "confirmation poll failed");
                    continue;
                },
            };

            match report.status() {
                ConfirmationStatus::Success => return Ok(reference),
                ConfirmationStatus::Failed => {
                    let detail =
                        report.detail().unwrap_or("transaction failed on chain").to_owned();
                    return Err(ExecutionError::on_chain(detail));
                },
                ConfirmationStatus::Pending | ConfirmationStatus::NotFound => {},
            }
        }

        tracing::warn!(%reference, "confirmation window elapsed");
        Err(ExecutionError::ConfirmationTimeout)
    }
}
