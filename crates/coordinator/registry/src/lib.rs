//! Approval bookkeeping for the multisig proposal coordinator.
//!
//! This crate decides which signers have approved which proposals and what
//! each proposal's lifecycle status is. The authoritative records live in a
//! [`RegistryStore`]; the [`ApprovalLedger`] is the in-process logic that
//! validates every mutation before asking the store to apply it atomically.
//!
//! # Architecture
//!
//! Signature recording is optimistic: the ledger validates a submitted
//! envelope against its latest read of the stored one, then hands the store
//! both the bytes it validated against and the replacement. The store applies
//! the write only if the stored bytes are unchanged, so two signers
//! approving concurrently can interleave safely and the loser simply
//! refetches and retries. No lock is ever held across a network round trip.
//!
//! # Main Components
//!
//! - [`ApprovalLedger`] - The primary interface for approval bookkeeping
//! - [`RegistryStore`] - The persistence contract the ledger runs against
//! - [`MemoryRegistry`] - A bundled in-process store for tests and
//!   single-instance use
//! - [`ApprovalLedgerError`] - Error types for ledger operations
//!
//! # Usage
//!
//! ```ignore
//! let ledger = ApprovalLedger::builder().store(store).build();
//!
//! let account = ledger
//!     .register_account(address, "ops treasury".into(), threshold, signers)
//!     .await?;
//!
//! let proposal = ledger.create_proposal(&address, description, &envelope).await?;
//! let record = ledger.record_signature(&address, proposal.id(), signer, &signed).await?;
//! ```

mod error;
mod memory;
mod store;

#[cfg(test)]
mod tests;

pub use self::{
    error::{ApprovalLedgerError, Result},
    memory::MemoryRegistry,
    store::{NewApproval, NewProposal, RegistryStore, RegistryStoreError},
};

use std::{num::NonZeroU8, sync::Arc};

use multisig_coordinator_domain::{
    account::{AccountAddress, AccountSigner, MultisigAccount, SignerKey, WithSigners},
    envelope::Envelope,
    proposal::{Proposal, ProposalId, ProposalStats, ProposalStatus, SettlementRef, SignatureRecord},
};
use multisig_ledger_client::encoding::{decode_envelope, encode_envelope};

/// The authoritative bookkeeping interface for proposals and approvals.
///
/// All status derivation is a client-side prediction: the ledger compares
/// collected signature weight against the account threshold the same way the
/// target ledger will, but final enforcement happens at submission time.
#[derive(Clone)]
pub struct ApprovalLedger {
    store: Arc<dyn RegistryStore>,
}

#[bon::bon]
impl ApprovalLedger {
    /// Creates a ledger over the given registry store.
    #[builder]
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self { store }
    }
}

impl ApprovalLedger {
    /// Registers a multisig account with the registry.
    ///
    /// The signer set must be non-empty, free of duplicate keys, and carry
    /// enough total weight to ever satisfy `threshold`; otherwise the call
    /// fails with [`ApprovalLedgerError::Validation`] before anything is
    /// stored.
    #[tracing::instrument(skip_all, fields(%address, threshold = threshold.get(), signers = signers.len()))]
    pub async fn register_account(
        &self,
        address: AccountAddress,
        label: String,
        threshold: NonZeroU8,
        signers: Vec<AccountSigner>,
    ) -> Result<MultisigAccount<WithSigners>> {
        let account = MultisigAccount::builder()
            .address(address)
            .label(label)
            .threshold(threshold)
            .aux(())
            .build()
            .with_signers(signers)
            .ok_or_else(|| {
                ApprovalLedgerError::validation(
                    "signer set must be non-empty, unique, and cover the threshold",
                )
            })?;

        Ok(self.store.save_account(account).await?)
    }

    /// Resolves a registered account by address.
    pub async fn account(
        &self,
        address: &AccountAddress,
    ) -> Result<Option<MultisigAccount<WithSigners>>> {
        Ok(self.store.fetch_account(address).await?)
    }

    /// Lists every registered account whose signer set contains `signer`.
    pub async fn accounts_for_signer(
        &self,
        signer: &SignerKey,
    ) -> Result<Vec<MultisigAccount<WithSigners>>> {
        Ok(self.store.accounts_for_signer(signer).await?)
    }

    /// Creates a proposal carrying `envelope` as its canonical transaction.
    ///
    /// Proposals enter the ledger unsigned; signatures are only ever
    /// attached through [`record_signature`](Self::record_signature), so an
    /// already-signed envelope fails with
    /// [`ApprovalLedgerError::Validation`].
    #[tracing::instrument(skip_all, fields(%account))]
    pub async fn create_proposal(
        &self,
        account: &AccountAddress,
        description: String,
        envelope: &Envelope,
    ) -> Result<Proposal> {
        if !envelope.is_unsigned() {
            return Err(ApprovalLedgerError::validation(
                "proposals enter the ledger unsigned",
            ));
        }

        let bytes = encode_envelope(envelope)?;
        let proposal = self
            .store
            .create_proposal(
                NewProposal::builder()
                    .account(account.clone())
                    .description(description)
                    .envelope(bytes)
                    .status(ProposalStatus::Created)
                    .build(),
            )
            .await?;

        Ok(proposal)
    }

    /// Records one signer's approval of a proposal.
    ///
    /// `signed` must extend the envelope on record: every prior signature
    /// preserved unaltered, plus exactly one new signature attributed to
    /// `signer`. A repeat call with the envelope already on record is a
    /// no-op returning the existing record.
    ///
    /// On [`ApprovalLedgerError::EnvelopeTampered`] the caller's view is
    /// stale; refetch the proposal and re-sign against its current envelope.
    #[tracing::instrument(skip_all, fields(%account, %proposal_id, %signer))]
    pub async fn record_signature(
        &self,
        account: &AccountAddress,
        proposal_id: ProposalId,
        signer: SignerKey,
        signed: &Envelope,
    ) -> Result<SignatureRecord> {
        let registered = self.require_account(account).await?;
        let proposal = self.require_proposal(account, proposal_id).await?;

        match proposal.status() {
            ProposalStatus::Executed => return Err(ApprovalLedgerError::AlreadyExecuted),
            ProposalStatus::RejectedOrDeleted => {
                return Err(ApprovalLedgerError::ProposalDeleted);
            },
            _ => {},
        }

        let Some(entry) = registered.signer(&signer) else {
            return Err(ApprovalLedgerError::UnauthorizedSigner(signer));
        };
        let signer_weight = u32::from(entry.weight());

        let stored = decode_envelope(proposal.envelope())?;
        let records = self.store.signature_records(account, proposal_id).await?;

        if let Some(existing) = records.iter().find(|record| *record.signer() == signer) {
            // Same signer, same envelope: the approval is already on record.
            if *signed == stored {
                return Ok(existing.clone());
            }
            return Err(ApprovalLedgerError::EnvelopeTampered);
        }

        if !signed.extends(&stored)
            || signed.signatures().len() != stored.signatures().len() + 1
        {
            return Err(ApprovalLedgerError::EnvelopeTampered);
        }
        let appended_by_signer = signed
            .signatures()
            .last()
            .is_some_and(|signature| *signature.signer() == signer);
        if !appended_by_signer {
            return Err(ApprovalLedgerError::EnvelopeTampered);
        }

        let approved = signer_weight
            + approved_weight_of(&registered, records.iter().map(SignatureRecord::signer));
        let new_status = if approved >= u32::from(registered.threshold().get()) {
            ProposalStatus::Ready
        } else {
            ProposalStatus::Pending
        };

        let record = self
            .store
            .record_approval(
                NewApproval::builder()
                    .account(account.clone())
                    .proposal_id(proposal_id)
                    .signer(signer)
                    .prior_envelope(proposal.envelope().clone())
                    .signed_envelope(encode_envelope(signed)?)
                    .new_status(new_status)
                    .build(),
            )
            .await?;

        Ok(record)
    }

    /// Transitions a proposal to executed, fixing the settlement reference.
    ///
    /// Valid only from [`ProposalStatus::Ready`]: fails
    /// [`ApprovalLedgerError::ThresholdNotMet`] while pending and
    /// [`ApprovalLedgerError::AlreadyExecuted`] once executed. The proposal
    /// and its signature records are immutable afterwards.
    #[tracing::instrument(skip_all, fields(%account, %proposal_id, %reference))]
    pub async fn mark_executed(
        &self,
        account: &AccountAddress,
        proposal_id: ProposalId,
        reference: SettlementRef,
    ) -> Result<()> {
        Ok(self.store.mark_executed(account, proposal_id, reference).await?)
    }

    /// Sets a proposal's soft-delete flag.
    ///
    /// Valid from any non-executed state and idempotent; the proposal drops
    /// out of default listings but stays queryable by id for audit.
    #[tracing::instrument(skip_all, fields(%account, %proposal_id))]
    pub async fn soft_delete(
        &self,
        account: &AccountAddress,
        proposal_id: ProposalId,
    ) -> Result<()> {
        Ok(self.store.soft_delete(account, proposal_id).await?)
    }

    /// Returns a proposal's current lifecycle status.
    pub async fn status(
        &self,
        account: &AccountAddress,
        proposal_id: ProposalId,
    ) -> Result<ProposalStatus> {
        Ok(self.require_proposal(account, proposal_id).await?.status())
    }

    /// Returns the number of signers with a recorded approval.
    pub async fn approval_count(
        &self,
        account: &AccountAddress,
        proposal_id: ProposalId,
    ) -> Result<u32> {
        let records = self.store.signature_records(account, proposal_id).await?;
        Ok(records.len() as u32)
    }

    /// Returns the combined signature weight collected so far.
    ///
    /// Signers that have since left the account's signer set contribute
    /// nothing, mirroring what the target ledger would enforce at
    /// submission.
    pub async fn approved_weight(
        &self,
        account: &AccountAddress,
        proposal_id: ProposalId,
    ) -> Result<u32> {
        let registered = self.require_account(account).await?;
        let records = self.store.signature_records(account, proposal_id).await?;

        Ok(approved_weight_of(&registered, records.iter().map(SignatureRecord::signer)))
    }

    /// Resolves a proposal by account and identifier, soft-deleted ones
    /// included.
    pub async fn proposal(
        &self,
        account: &AccountAddress,
        proposal_id: ProposalId,
    ) -> Result<Option<Proposal>> {
        Ok(self.store.fetch_proposal(account, proposal_id).await?)
    }

    /// Lists an account's proposals in identifier order.
    pub async fn list_proposals(
        &self,
        account: &AccountAddress,
        include_deleted: bool,
    ) -> Result<Vec<Proposal>> {
        Ok(self.store.list_proposals(account, include_deleted).await?)
    }

    /// Lists a proposal's signature records in acceptance order.
    pub async fn signature_records(
        &self,
        account: &AccountAddress,
        proposal_id: ProposalId,
    ) -> Result<Vec<SignatureRecord>> {
        Ok(self.store.signature_records(account, proposal_id).await?)
    }

    /// Computes proposal statistics for an account.
    pub async fn stats(&self, account: &AccountAddress) -> Result<ProposalStats> {
        Ok(self.store.proposal_stats(account).await?)
    }

    async fn require_account(
        &self,
        address: &AccountAddress,
    ) -> Result<MultisigAccount<WithSigners>> {
        self.store
            .fetch_account(address)
            .await?
            .ok_or_else(|| ApprovalLedgerError::NotFound("account is not registered".into()))
    }

    async fn require_proposal(
        &self,
        account: &AccountAddress,
        proposal_id: ProposalId,
    ) -> Result<Proposal> {
        self.store
            .fetch_proposal(account, proposal_id)
            .await?
            .ok_or_else(|| ApprovalLedgerError::NotFound("proposal does not exist".into()))
    }
}

fn approved_weight_of<'a>(
    account: &MultisigAccount<WithSigners>,
    signers: impl Iterator<Item = &'a SignerKey>,
) -> u32 {
    signers
        .map(|key| account.signer(key).map_or(0, |entry| u32::from(entry.weight())))
        .sum()
}
