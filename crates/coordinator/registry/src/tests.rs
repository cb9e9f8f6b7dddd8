use std::{num::NonZeroU8, sync::Arc};

use chrono::Utc;
use multisig_coordinator_domain::{
    account::{AccountAddress, AccountSigner, SignerKey},
    envelope::{Envelope, EnvelopeSignature, Operation, TimeBounds},
    proposal::{ProposalId, ProposalStatus, SettlementRef},
};
use multisig_ledger_client::encoding::{decode_envelope, encode_envelope};

use crate::{
    ApprovalLedger, ApprovalLedgerError, MemoryRegistry, NewApproval, RegistryStore,
    RegistryStoreError,
};

const TREASURY: &str = "LDG_TREASURY_ACCOUNT";
const GRANTS: &str = "LDG_GRANTS_ACCOUNT";
const DESTINATION: &str = "LDG_DESTINATION_ACCOUNT";
const SIGNER_A: &str = "KEY_SIGNER_A";
const SIGNER_B: &str = "KEY_SIGNER_B";
const SIGNER_C: &str = "KEY_SIGNER_C";
const SIGNER_D: &str = "KEY_SIGNER_D";
const OUTSIDER: &str = "KEY_OUTSIDER";

#[tokio::test]
async fn registration_validates_the_signer_set() {
    let ledger = ledger_over_memory();

    let empty = ledger
        .register_account(TREASURY.into(), "ops treasury".to_owned(), threshold(2), vec![])
        .await;
    assert!(matches!(empty, Err(ApprovalLedgerError::Validation(_))));

    let duplicated = ledger
        .register_account(
            TREASURY.into(),
            "ops treasury".to_owned(),
            threshold(2),
            vec![entry(SIGNER_A), entry(SIGNER_A), entry(SIGNER_B)],
        )
        .await;
    assert!(matches!(duplicated, Err(ApprovalLedgerError::Validation(_))));

    let underweight = ledger
        .register_account(
            TREASURY.into(),
            "ops treasury".to_owned(),
            threshold(3),
            vec![entry(SIGNER_A), entry(SIGNER_B)],
        )
        .await;
    assert!(matches!(underweight, Err(ApprovalLedgerError::Validation(_))));

    let account = ledger
        .register_account(
            TREASURY.into(),
            "ops treasury".to_owned(),
            threshold(2),
            vec![entry(SIGNER_A), entry(SIGNER_B), entry(SIGNER_C)],
        )
        .await
        .unwrap();

    assert_eq!(account.address(), &AccountAddress::from(TREASURY));
    assert_eq!(account.label(), "ops treasury");
    assert_eq!(account.threshold(), threshold(2));
    assert_eq!(account.signers().len(), 3);
    assert!(account.is_signer(&SIGNER_B.into()));
}

#[tokio::test]
async fn accounts_are_listed_by_signer_membership() {
    let (ledger, treasury) = registered_ledger().await;
    ledger
        .register_account(
            GRANTS.into(),
            "grants pool".to_owned(),
            threshold(1),
            vec![entry(SIGNER_A), entry(SIGNER_D)],
        )
        .await
        .unwrap();

    let for_a = ledger.accounts_for_signer(&SIGNER_A.into()).await.unwrap();
    assert_eq!(for_a.len(), 2);

    let for_d = ledger.accounts_for_signer(&SIGNER_D.into()).await.unwrap();
    assert_eq!(for_d.len(), 1);
    assert_eq!(for_d[0].address(), &AccountAddress::from(GRANTS));

    let nobody = ledger.accounts_for_signer(&OUTSIDER.into()).await.unwrap();
    assert!(nobody.is_empty());

    let fetched = ledger.account(&treasury).await.unwrap().unwrap();
    assert_eq!(fetched.label(), "ops treasury");
    assert!(ledger.account(&GRANTS.into()).await.unwrap().is_some());
}

#[tokio::test]
async fn proposals_enter_the_ledger_unsigned() {
    let (ledger, treasury) = registered_ledger().await;
    let envelope = transfer_envelope();

    let signed = envelope.clone().with_signature(approval_of(SIGNER_A));
    let rejected = ledger.create_proposal(&treasury, "pay vendor".to_owned(), &signed).await;
    assert!(matches!(rejected, Err(ApprovalLedgerError::Validation(_))));

    let proposal =
        ledger.create_proposal(&treasury, "pay vendor".to_owned(), &envelope).await.unwrap();

    assert_eq!(proposal.id(), ProposalId::from(1));
    assert_eq!(proposal.status(), ProposalStatus::Created);
    assert_eq!(proposal.description(), "pay vendor");
    assert!(!proposal.is_deleted());
    assert!(proposal.settlement_ref().is_none());
    assert_eq!(decode_envelope(proposal.envelope()).unwrap(), envelope);
}

#[tokio::test]
async fn proposal_creation_requires_a_registered_account() {
    let ledger = ledger_over_memory();

    let err = ledger
        .create_proposal(&TREASURY.into(), "pay vendor".to_owned(), &transfer_envelope())
        .await
        .unwrap_err();

    assert!(matches!(err, ApprovalLedgerError::NotFound(_)));
}

#[tokio::test]
async fn proposal_identifiers_count_up_per_account() {
    let (ledger, treasury) = registered_ledger().await;
    ledger
        .register_account(
            GRANTS.into(),
            "grants pool".to_owned(),
            threshold(1),
            vec![entry(SIGNER_A)],
        )
        .await
        .unwrap();

    let first =
        ledger.create_proposal(&treasury, "first".to_owned(), &transfer_envelope()).await.unwrap();
    let second =
        ledger.create_proposal(&treasury, "second".to_owned(), &transfer_envelope()).await.unwrap();
    let elsewhere = ledger
        .create_proposal(&GRANTS.into(), "elsewhere".to_owned(), &transfer_envelope())
        .await
        .unwrap();

    assert_eq!(first.id(), ProposalId::from(1));
    assert_eq!(second.id(), ProposalId::from(2));
    assert_eq!(elsewhere.id(), ProposalId::from(1));

    let listed = ledger.list_proposals(&treasury, false).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id(), ProposalId::from(1));
    assert_eq!(listed[1].id(), ProposalId::from(2));
}

#[tokio::test]
async fn approvals_move_created_through_pending_to_ready() {
    let (ledger, treasury) = registered_ledger().await;
    let proposal = ledger
        .create_proposal(&treasury, "pay vendor".to_owned(), &transfer_envelope())
        .await
        .unwrap();
    let id = proposal.id();

    let once = decode_envelope(proposal.envelope()).unwrap().with_signature(approval_of(SIGNER_A));
    let record = ledger.record_signature(&treasury, id, SIGNER_A.into(), &once).await.unwrap();

    assert_eq!(record.signer(), &SignerKey::from(SIGNER_A));
    assert_eq!(record.ordinal(), 0);
    assert_eq!(ledger.status(&treasury, id).await.unwrap(), ProposalStatus::Pending);
    assert_eq!(ledger.approval_count(&treasury, id).await.unwrap(), 1);
    assert_eq!(ledger.approved_weight(&treasury, id).await.unwrap(), 1);

    // Later signers build on the refetched envelope, never their own copy.
    let stored = fetch_envelope(&ledger, &treasury, id).await;
    assert!(stored.is_signed_by(&SIGNER_A.into()));

    let twice = stored.with_signature(approval_of(SIGNER_B));
    let record = ledger.record_signature(&treasury, id, SIGNER_B.into(), &twice).await.unwrap();

    assert_eq!(record.ordinal(), 1);
    assert_eq!(ledger.status(&treasury, id).await.unwrap(), ProposalStatus::Ready);
    assert_eq!(ledger.approval_count(&treasury, id).await.unwrap(), 2);
    assert_eq!(ledger.approved_weight(&treasury, id).await.unwrap(), 2);

    let records = ledger.signature_records(&treasury, id).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].signer(), &SignerKey::from(SIGNER_A));
    assert_eq!(records[1].signer(), &SignerKey::from(SIGNER_B));
}

#[tokio::test]
async fn repeat_approval_with_the_same_envelope_is_a_no_op() {
    let (ledger, treasury) = registered_ledger().await;
    let id = created_proposal(&ledger, &treasury).await;

    let once = fetch_envelope(&ledger, &treasury, id).await.with_signature(approval_of(SIGNER_A));
    let first = ledger.record_signature(&treasury, id, SIGNER_A.into(), &once).await.unwrap();
    let replay = ledger.record_signature(&treasury, id, SIGNER_A.into(), &once).await.unwrap();

    assert_eq!(replay.ordinal(), first.ordinal());
    assert_eq!(ledger.approval_count(&treasury, id).await.unwrap(), 1);
    assert_eq!(ledger.status(&treasury, id).await.unwrap(), ProposalStatus::Pending);
}

#[tokio::test]
async fn a_signer_cannot_swap_in_a_different_envelope() {
    let (ledger, treasury) = registered_ledger().await;
    let id = created_proposal(&ledger, &treasury).await;

    let original = fetch_envelope(&ledger, &treasury, id).await;
    let once = original.clone().with_signature(approval_of(SIGNER_A));
    ledger.record_signature(&treasury, id, SIGNER_A.into(), &once).await.unwrap();

    // The same signer resubmitting over different bytes is not idempotent.
    let resigned =
        EnvelopeSignature::builder().signer(SIGNER_A.into()).bytes(vec![0xFF]).build();
    let reworked = original.with_signature(resigned);
    let err =
        ledger.record_signature(&treasury, id, SIGNER_A.into(), &reworked).await.unwrap_err();

    assert!(matches!(err, ApprovalLedgerError::EnvelopeTampered));
    assert_eq!(ledger.approval_count(&treasury, id).await.unwrap(), 1);
}

#[tokio::test]
async fn an_unknown_signer_is_rejected_without_side_effects() {
    let (ledger, treasury) = registered_ledger().await;
    let id = created_proposal(&ledger, &treasury).await;

    let signed = fetch_envelope(&ledger, &treasury, id).await.with_signature(approval_of(OUTSIDER));
    let err = ledger.record_signature(&treasury, id, OUTSIDER.into(), &signed).await.unwrap_err();

    assert!(
        matches!(err, ApprovalLedgerError::UnauthorizedSigner(key) if key == OUTSIDER.into())
    );
    assert_eq!(ledger.approval_count(&treasury, id).await.unwrap(), 0);
    assert_eq!(ledger.status(&treasury, id).await.unwrap(), ProposalStatus::Created);
}

#[tokio::test]
async fn signing_a_stale_envelope_fails_until_refetched() {
    let (ledger, treasury) = registered_ledger().await;
    let id = created_proposal(&ledger, &treasury).await;

    // Both signers read the unsigned envelope before either approves.
    let stale = fetch_envelope(&ledger, &treasury, id).await;
    let once = stale.clone().with_signature(approval_of(SIGNER_A));
    ledger.record_signature(&treasury, id, SIGNER_A.into(), &once).await.unwrap();

    let raced = stale.with_signature(approval_of(SIGNER_B));
    let err = ledger.record_signature(&treasury, id, SIGNER_B.into(), &raced).await.unwrap_err();
    assert!(matches!(err, ApprovalLedgerError::EnvelopeTampered));

    // Refetch and re-sign resolves the race without losing the first approval.
    let refetched =
        fetch_envelope(&ledger, &treasury, id).await.with_signature(approval_of(SIGNER_B));
    ledger.record_signature(&treasury, id, SIGNER_B.into(), &refetched).await.unwrap();

    assert_eq!(ledger.status(&treasury, id).await.unwrap(), ProposalStatus::Ready);
    assert_eq!(ledger.approval_count(&treasury, id).await.unwrap(), 2);
}

#[tokio::test]
async fn a_rewritten_envelope_is_rejected() {
    let (ledger, treasury) = registered_ledger().await;
    let id = created_proposal(&ledger, &treasury).await;

    let stored = fetch_envelope(&ledger, &treasury, id).await;
    let inflated = Envelope::builder()
        .source(stored.source().clone())
        .fee(stored.fee() + 1)
        .sequence(stored.sequence())
        .time_bounds(stored.time_bounds())
        .maybe_memo(stored.memo().map(str::to_owned))
        .operations(stored.operations().to_vec())
        .build()
        .with_signature(approval_of(SIGNER_A));

    let err =
        ledger.record_signature(&treasury, id, SIGNER_A.into(), &inflated).await.unwrap_err();

    assert!(matches!(err, ApprovalLedgerError::EnvelopeTampered));
    assert_eq!(ledger.approval_count(&treasury, id).await.unwrap(), 0);
}

#[tokio::test]
async fn an_approval_must_append_exactly_one_signature() {
    let (ledger, treasury) = registered_ledger().await;
    let id = created_proposal(&ledger, &treasury).await;
    let stored = fetch_envelope(&ledger, &treasury, id).await;

    // Two signatures in one call would leave one of them unattributed.
    let batched =
        stored.clone().with_signature(approval_of(SIGNER_A)).with_signature(approval_of(SIGNER_B));
    let err = ledger.record_signature(&treasury, id, SIGNER_B.into(), &batched).await.unwrap_err();
    assert!(matches!(err, ApprovalLedgerError::EnvelopeTampered));

    // Submitting the stored envelope untouched appends nothing.
    let err = ledger.record_signature(&treasury, id, SIGNER_A.into(), &stored).await.unwrap_err();
    assert!(matches!(err, ApprovalLedgerError::EnvelopeTampered));

    assert_eq!(ledger.approval_count(&treasury, id).await.unwrap(), 0);
}

#[tokio::test]
async fn the_appended_signature_must_belong_to_the_caller() {
    let (ledger, treasury) = registered_ledger().await;
    let id = created_proposal(&ledger, &treasury).await;

    let signed = fetch_envelope(&ledger, &treasury, id).await.with_signature(approval_of(SIGNER_C));
    let err = ledger.record_signature(&treasury, id, SIGNER_B.into(), &signed).await.unwrap_err();

    assert!(matches!(err, ApprovalLedgerError::EnvelopeTampered));
    assert_eq!(ledger.approval_count(&treasury, id).await.unwrap(), 0);
}

#[tokio::test]
async fn execution_is_refused_below_threshold() {
    let (ledger, treasury) = registered_ledger().await;
    let id = created_proposal(&ledger, &treasury).await;

    let err = ledger
        .mark_executed(&treasury, id, SettlementRef::from("txh:premature"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApprovalLedgerError::ThresholdNotMet));

    let once = fetch_envelope(&ledger, &treasury, id).await.with_signature(approval_of(SIGNER_A));
    ledger.record_signature(&treasury, id, SIGNER_A.into(), &once).await.unwrap();

    let err = ledger
        .mark_executed(&treasury, id, SettlementRef::from("txh:premature"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApprovalLedgerError::ThresholdNotMet));
    assert_eq!(ledger.status(&treasury, id).await.unwrap(), ProposalStatus::Pending);
}

#[tokio::test]
async fn execution_fixes_the_settlement_reference() {
    let (ledger, treasury) = registered_ledger().await;
    let id = ready_proposal(&ledger, &treasury).await;

    ledger.mark_executed(&treasury, id, SettlementRef::from("txh:settled")).await.unwrap();

    let proposal = ledger.proposal(&treasury, id).await.unwrap().unwrap();
    assert_eq!(proposal.status(), ProposalStatus::Executed);
    assert_eq!(proposal.settlement_ref(), Some(&SettlementRef::from("txh:settled")));

    // The envelope and its signatures stay on record for audit.
    let stored = decode_envelope(proposal.envelope()).unwrap();
    assert!(stored.is_signed_by(&SIGNER_A.into()));
    assert!(stored.is_signed_by(&SIGNER_B.into()));
    assert_eq!(ledger.signature_records(&treasury, id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn executed_proposals_are_immutable() {
    let (ledger, treasury) = registered_ledger().await;
    let id = ready_proposal(&ledger, &treasury).await;
    ledger.mark_executed(&treasury, id, SettlementRef::from("txh:settled")).await.unwrap();

    let again = ledger.mark_executed(&treasury, id, SettlementRef::from("txh:other")).await;
    assert!(matches!(again, Err(ApprovalLedgerError::AlreadyExecuted)));

    let late = fetch_envelope(&ledger, &treasury, id).await.with_signature(approval_of(SIGNER_C));
    let err = ledger.record_signature(&treasury, id, SIGNER_C.into(), &late).await.unwrap_err();
    assert!(matches!(err, ApprovalLedgerError::AlreadyExecuted));

    let deleted = ledger.soft_delete(&treasury, id).await;
    assert!(matches!(deleted, Err(ApprovalLedgerError::AlreadyExecuted)));

    let proposal = ledger.proposal(&treasury, id).await.unwrap().unwrap();
    assert_eq!(proposal.settlement_ref(), Some(&SettlementRef::from("txh:settled")));
}

#[tokio::test]
async fn soft_deletion_hides_but_keeps_the_proposal() {
    let (ledger, treasury) = registered_ledger().await;
    let keep = created_proposal(&ledger, &treasury).await;
    let retracted = ledger
        .create_proposal(&treasury, "retracted".to_owned(), &transfer_envelope())
        .await
        .unwrap()
        .id();

    ledger.soft_delete(&treasury, retracted).await.unwrap();
    // Deleting again is a no-op, not an error.
    ledger.soft_delete(&treasury, retracted).await.unwrap();

    let listed = ledger.list_proposals(&treasury, false).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), keep);

    let with_deleted = ledger.list_proposals(&treasury, true).await.unwrap();
    assert_eq!(with_deleted.len(), 2);

    // Still resolvable by identifier for audit.
    let proposal = ledger.proposal(&treasury, retracted).await.unwrap().unwrap();
    assert!(proposal.is_deleted());
    assert_eq!(proposal.status(), ProposalStatus::RejectedOrDeleted);

    let signed = transfer_envelope().with_signature(approval_of(SIGNER_A));
    let err = ledger
        .record_signature(&treasury, retracted, SIGNER_A.into(), &signed)
        .await
        .unwrap_err();
    assert!(matches!(err, ApprovalLedgerError::ProposalDeleted));
}

#[tokio::test]
async fn signer_weights_count_towards_readiness() {
    let ledger = ledger_over_memory();
    ledger
        .register_account(
            TREASURY.into(),
            "ops treasury".to_owned(),
            threshold(2),
            vec![weighted(SIGNER_A, 2), entry(SIGNER_B), entry(SIGNER_C)],
        )
        .await
        .unwrap();
    let treasury = AccountAddress::from(TREASURY);
    let id = created_proposal(&ledger, &treasury).await;

    let once = fetch_envelope(&ledger, &treasury, id).await.with_signature(approval_of(SIGNER_A));
    ledger.record_signature(&treasury, id, SIGNER_A.into(), &once).await.unwrap();

    assert_eq!(ledger.status(&treasury, id).await.unwrap(), ProposalStatus::Ready);
    assert_eq!(ledger.approval_count(&treasury, id).await.unwrap(), 1);
    assert_eq!(ledger.approved_weight(&treasury, id).await.unwrap(), 2);
}

#[tokio::test]
async fn weight_of_former_signers_is_discounted() {
    let (ledger, treasury) = registered_ledger().await;
    let id = created_proposal(&ledger, &treasury).await;

    let once = fetch_envelope(&ledger, &treasury, id).await.with_signature(approval_of(SIGNER_A));
    ledger.record_signature(&treasury, id, SIGNER_A.into(), &once).await.unwrap();
    assert_eq!(ledger.approved_weight(&treasury, id).await.unwrap(), 1);

    // The signer set rotates and the first approver drops out of it.
    ledger
        .register_account(
            TREASURY.into(),
            "ops treasury".to_owned(),
            threshold(2),
            vec![entry(SIGNER_B), entry(SIGNER_C), entry(SIGNER_D)],
        )
        .await
        .unwrap();

    assert_eq!(ledger.approved_weight(&treasury, id).await.unwrap(), 0);

    let twice = fetch_envelope(&ledger, &treasury, id).await.with_signature(approval_of(SIGNER_B));
    ledger.record_signature(&treasury, id, SIGNER_B.into(), &twice).await.unwrap();

    // One live signature out of two required.
    assert_eq!(ledger.status(&treasury, id).await.unwrap(), ProposalStatus::Pending);
    assert_eq!(ledger.approved_weight(&treasury, id).await.unwrap(), 1);
}

#[tokio::test]
async fn statistics_roll_up_per_account() {
    let (ledger, treasury) = registered_ledger().await;

    let executed = ready_proposal(&ledger, &treasury).await;
    ledger.mark_executed(&treasury, executed, SettlementRef::from("txh:settled")).await.unwrap();
    created_proposal(&ledger, &treasury).await;
    let deleted = created_proposal(&ledger, &treasury).await;
    ledger.soft_delete(&treasury, deleted).await.unwrap();

    let stats = ledger.stats(&treasury).await.unwrap();
    assert_eq!(stats.total(), 3);
    assert_eq!(stats.last_month(), 3);
    assert_eq!(stats.total_executed(), 1);

    let elsewhere = ledger.stats(&GRANTS.into()).await.unwrap();
    assert_eq!(elsewhere.total(), 0);
}

#[tokio::test]
async fn missing_proposals_surface_not_found() {
    let (ledger, treasury) = registered_ledger().await;

    let err = ledger.status(&treasury, ProposalId::from(404)).await.unwrap_err();
    assert!(matches!(err, ApprovalLedgerError::NotFound(_)));

    let signed = transfer_envelope().with_signature(approval_of(SIGNER_A));
    let err = ledger
        .record_signature(&treasury, ProposalId::from(404), SIGNER_A.into(), &signed)
        .await
        .unwrap_err();
    assert!(matches!(err, ApprovalLedgerError::NotFound(_)));

    assert!(ledger.proposal(&treasury, ProposalId::from(404)).await.unwrap().is_none());
}

#[tokio::test]
async fn the_store_swap_rejects_writes_over_a_changed_envelope() {
    let store = Arc::new(MemoryRegistry::new());
    let ledger = ApprovalLedger::builder().store(store.clone()).build();
    let treasury = AccountAddress::from(TREASURY);
    ledger
        .register_account(
            TREASURY.into(),
            "ops treasury".to_owned(),
            threshold(2),
            vec![entry(SIGNER_A), entry(SIGNER_B), entry(SIGNER_C)],
        )
        .await
        .unwrap();
    let id = created_proposal(&ledger, &treasury).await;

    // A writer that validated against bytes the store no longer holds must
    // lose the swap, leaving no record behind.
    let current = fetch_envelope(&ledger, &treasury, id).await;
    let never_stored =
        encode_envelope(&current.clone().with_signature(approval_of(SIGNER_A))).unwrap();
    let attempted = encode_envelope(&current.with_signature(approval_of(SIGNER_B))).unwrap();
    let err = store
        .record_approval(
            NewApproval::builder()
                .account(treasury.clone())
                .proposal_id(id)
                .signer(SIGNER_B.into())
                .prior_envelope(never_stored)
                .signed_envelope(attempted)
                .new_status(ProposalStatus::Pending)
                .build(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryStoreError::StaleEnvelope));
    assert!(matches!(ApprovalLedgerError::from(err), ApprovalLedgerError::EnvelopeTampered));
    assert!(store.signature_records(&treasury, id).await.unwrap().is_empty());
}

// HELPERS
// ================================================================================================

fn ledger_over_memory() -> ApprovalLedger {
    ApprovalLedger::builder().store(Arc::new(MemoryRegistry::new())).build()
}

async fn registered_ledger() -> (ApprovalLedger, AccountAddress) {
    let ledger = ledger_over_memory();
    ledger
        .register_account(
            TREASURY.into(),
            "ops treasury".to_owned(),
            threshold(2),
            vec![entry(SIGNER_A), entry(SIGNER_B), entry(SIGNER_C)],
        )
        .await
        .unwrap();

    (ledger, AccountAddress::from(TREASURY))
}

async fn created_proposal(ledger: &ApprovalLedger, account: &AccountAddress) -> ProposalId {
    ledger
        .create_proposal(account, "pay vendor".to_owned(), &transfer_envelope())
        .await
        .unwrap()
        .id()
}

async fn ready_proposal(ledger: &ApprovalLedger, account: &AccountAddress) -> ProposalId {
    let id = created_proposal(ledger, account).await;

    let once = fetch_envelope(ledger, account, id).await.with_signature(approval_of(SIGNER_A));
    ledger.record_signature(account, id, SIGNER_A.into(), &once).await.unwrap();
    let twice = fetch_envelope(ledger, account, id).await.with_signature(approval_of(SIGNER_B));
    ledger.record_signature(account, id, SIGNER_B.into(), &twice).await.unwrap();

    id
}

async fn fetch_envelope(
    ledger: &ApprovalLedger,
    account: &AccountAddress,
    id: ProposalId,
) -> Envelope {
    let proposal = ledger.proposal(account, id).await.unwrap().unwrap();
    decode_envelope(proposal.envelope()).unwrap()
}

fn threshold(value: u8) -> NonZeroU8 {
    NonZeroU8::new(value).unwrap()
}

fn entry(key: &str) -> AccountSigner {
    AccountSigner::builder().key(key.into()).build()
}

fn weighted(key: &str, weight: u8) -> AccountSigner {
    AccountSigner::builder().key(key.into()).weight(weight).build()
}

fn approval_of(signer: &str) -> EnvelopeSignature {
    EnvelopeSignature::builder()
        .signer(signer.into())
        .bytes(format!("sig:{signer}").into_bytes())
        .build()
}

fn transfer_envelope() -> Envelope {
    let now = Utc::now();
    let bounds = TimeBounds::builder()
        .min_time(now)
        .max_time(now + chrono::Duration::hours(6))
        .build();

    Envelope::builder()
        .source(TREASURY.into())
        .fee(100)
        .sequence(41)
        .time_bounds(bounds)
        .memo("quarterly payout".to_owned())
        .operations(vec![Operation::Payment { destination: DESTINATION.into(), amount: 900 }])
        .build()
}
