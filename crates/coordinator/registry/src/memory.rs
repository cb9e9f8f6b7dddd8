//! In-process registry store backed by a mutex-guarded map set.
//!
//! Suitable for tests and single-instance deployments; multi-process
//! deployments supply their own [`RegistryStore`] over a shared database or
//! an on-chain registry contract. Every operation takes the single lock once
//! and applies its whole effect under it, which is what makes the
//! compare-and-swap in [`record_approval`](RegistryStore::record_approval)
//! sound without any lock being held across a suspension point.

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;

use multisig_coordinator_domain::{
    Timestamps,
    account::{AccountAddress, MultisigAccount, SignerKey, WithSigners},
    proposal::{Proposal, ProposalId, ProposalStats, ProposalStatus, SettlementRef, SignatureRecord},
};

use crate::store::{NewApproval, NewApprovalDissolved, NewProposal, NewProposalDissolved, RegistryStore, RegistryStoreError};

#[derive(Default)]
struct RegistryInner {
    accounts: BTreeMap<AccountAddress, MultisigAccount<WithSigners, Timestamps>>,
    proposals: BTreeMap<(AccountAddress, ProposalId), Proposal<Timestamps>>,
    records: BTreeMap<(AccountAddress, ProposalId), Vec<SignatureRecord<Timestamps>>>,
    next_ids: BTreeMap<AccountAddress, ProposalId>,
}

/// An in-memory [`RegistryStore`].
#[derive(Default)]
pub struct MemoryRegistry {
    inner: Mutex<RegistryInner>,
}

impl MemoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_inner(&self) -> Result<MutexGuard<'_, RegistryInner>, RegistryStoreError> {
        self.inner
            .lock()
            .map_err(|_| RegistryStoreError::other("memory registry lock poisoned"))
    }
}

#[async_trait]
impl RegistryStore for MemoryRegistry {
    async fn save_account(
        &self,
        account: MultisigAccount<WithSigners, ()>,
    ) -> Result<MultisigAccount<WithSigners>, RegistryStoreError> {
        let mut inner = self.lock_inner()?;
        let now = Utc::now();

        // Re-registering keeps the original creation timestamp.
        let created_at = inner
            .accounts
            .get(account.address())
            .map_or(now, |existing| existing.aux().created_at());
        let timestamps = Timestamps::builder().created_at(created_at).updated_at(now).build();

        let (account, ()) = account.with_aux(timestamps);
        inner.accounts.insert(account.address().clone(), account.clone());

        Ok(account)
    }

    async fn fetch_account(
        &self,
        address: &AccountAddress,
    ) -> Result<Option<MultisigAccount<WithSigners>>, RegistryStoreError> {
        Ok(self.lock_inner()?.accounts.get(address).cloned())
    }

    async fn accounts_for_signer(
        &self,
        signer: &SignerKey,
    ) -> Result<Vec<MultisigAccount<WithSigners>>, RegistryStoreError> {
        Ok(self
            .lock_inner()?
            .accounts
            .values()
            .filter(|account| account.is_signer(signer))
            .cloned()
            .collect())
    }

    async fn create_proposal(
        &self,
        proposal: NewProposal,
    ) -> Result<Proposal<Timestamps>, RegistryStoreError> {
        let mut inner = self.lock_inner()?;

        let NewProposalDissolved { account, description, envelope, status } = proposal.dissolve();

        if !inner.accounts.contains_key(&account) {
            return Err(RegistryStoreError::not_found("account is not registered"));
        }

        let id = *inner.next_ids.entry(account.clone()).or_insert(ProposalId::from(1));
        inner.next_ids.insert(account.clone(), id.next());

        let now = Utc::now();
        let proposal = Proposal::builder()
            .id(id)
            .account(account.clone())
            .description(description)
            .envelope(envelope)
            .status(status)
            .aux(Timestamps::builder().created_at(now).updated_at(now).build())
            .build();

        inner.proposals.insert((account, id), proposal.clone());

        Ok(proposal)
    }

    async fn fetch_proposal(
        &self,
        account: &AccountAddress,
        id: ProposalId,
    ) -> Result<Option<Proposal<Timestamps>>, RegistryStoreError> {
        Ok(self.lock_inner()?.proposals.get(&(account.clone(), id)).cloned())
    }

    async fn list_proposals(
        &self,
        account: &AccountAddress,
        include_deleted: bool,
    ) -> Result<Vec<Proposal<Timestamps>>, RegistryStoreError> {
        Ok(self
            .lock_inner()?
            .proposals
            .iter()
            .filter(|((address, _), _)| address == account)
            .map(|(_, proposal)| proposal)
            .filter(|proposal| include_deleted || !proposal.is_deleted())
            .cloned()
            .collect())
    }

    async fn signature_records(
        &self,
        account: &AccountAddress,
        id: ProposalId,
    ) -> Result<Vec<SignatureRecord<Timestamps>>, RegistryStoreError> {
        Ok(self
            .lock_inner()?
            .records
            .get(&(account.clone(), id))
            .cloned()
            .unwrap_or_default())
    }

    async fn record_approval(
        &self,
        approval: NewApproval,
    ) -> Result<SignatureRecord<Timestamps>, RegistryStoreError> {
        let mut inner = self.lock_inner()?;

        let NewApprovalDissolved {
            account,
            proposal_id,
            signer,
            prior_envelope,
            signed_envelope,
            new_status,
        } = approval.dissolve();

        let key = (account.clone(), proposal_id);
        let proposal = inner
            .proposals
            .get(&key)
            .ok_or_else(|| RegistryStoreError::not_found("proposal does not exist"))?;

        if proposal.status().is_terminal() {
            return Err(RegistryStoreError::InvalidTransition { from: proposal.status() });
        }
        if *proposal.envelope() != prior_envelope {
            return Err(RegistryStoreError::StaleEnvelope);
        }

        // at most one record per (proposal, signer)
        let ordinal = match inner.records.get(&key) {
            Some(records) if records.iter().any(|record| *record.signer() == signer) => {
                return Err(RegistryStoreError::validation("signer already recorded"));
            },
            Some(records) => records.len() as u32,
            None => 0,
        };

        let proposal = inner
            .proposals
            .remove(&key)
            .ok_or_else(|| RegistryStoreError::not_found("proposal does not exist"))?;

        let now = Utc::now();
        let record = SignatureRecord::builder()
            .proposal_id(proposal_id)
            .account(account)
            .signer(signer)
            .ordinal(ordinal)
            .aux(Timestamps::builder().created_at(now).updated_at(now).build())
            .build();
        inner.records.entry(key.clone()).or_default().push(record.clone());

        let refreshed = proposal.aux().clone().updated(now);
        let (proposal, _) =
            proposal.with_approval(signed_envelope, new_status).with_aux(refreshed);
        inner.proposals.insert(key, proposal);

        Ok(record)
    }

    async fn mark_executed(
        &self,
        account: &AccountAddress,
        id: ProposalId,
        reference: SettlementRef,
    ) -> Result<(), RegistryStoreError> {
        let mut inner = self.lock_inner()?;
        let key = (account.clone(), id);

        let proposal = inner
            .proposals
            .get(&key)
            .ok_or_else(|| RegistryStoreError::not_found("proposal does not exist"))?;

        match proposal.status() {
            ProposalStatus::Ready => {},
            from => return Err(RegistryStoreError::InvalidTransition { from }),
        }

        let proposal = inner
            .proposals
            .remove(&key)
            .ok_or_else(|| RegistryStoreError::not_found("proposal does not exist"))?;
        let refreshed = proposal.aux().clone().updated(Utc::now());
        let (proposal, _) = proposal.into_executed(reference).with_aux(refreshed);
        inner.proposals.insert(key, proposal);

        Ok(())
    }

    async fn soft_delete(
        &self,
        account: &AccountAddress,
        id: ProposalId,
    ) -> Result<(), RegistryStoreError> {
        let mut inner = self.lock_inner()?;
        let key = (account.clone(), id);

        let proposal = inner
            .proposals
            .get(&key)
            .ok_or_else(|| RegistryStoreError::not_found("proposal does not exist"))?;

        if proposal.is_deleted() {
            return Ok(());
        }
        if proposal.status() == ProposalStatus::Executed {
            return Err(RegistryStoreError::InvalidTransition {
                from: ProposalStatus::Executed,
            });
        }

        let proposal = inner
            .proposals
            .remove(&key)
            .ok_or_else(|| RegistryStoreError::not_found("proposal does not exist"))?;
        let refreshed = proposal.aux().clone().updated(Utc::now());
        let (proposal, _) = proposal.into_deleted().with_aux(refreshed);
        inner.proposals.insert(key, proposal);

        Ok(())
    }

    async fn proposal_stats(
        &self,
        account: &AccountAddress,
    ) -> Result<ProposalStats, RegistryStoreError> {
        let inner = self.lock_inner()?;
        let month_ago = Utc::now() - chrono::Duration::days(30);

        let mut total = 0u64;
        let mut last_month = 0u64;
        let mut total_executed = 0u64;

        for proposal in inner
            .proposals
            .iter()
            .filter(|((address, _), _)| address == account)
            .map(|(_, proposal)| proposal)
        {
            total += 1;
            if proposal.aux().created_at() > month_ago {
                last_month += 1;
            }
            if proposal.status() == ProposalStatus::Executed {
                total_executed += 1;
            }
        }

        Ok(ProposalStats::builder()
            .total(total)
            .last_month(last_month)
            .total_executed(total_executed)
            .build())
    }
}
