use std::{collections::BTreeMap, num::NonZeroU8, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use multisig_coordinator_domain::{
    account::{AccountAddress, AccountSigner, DEFAULT_SIGNER_WEIGHT, SignerKey},
    envelope::{
        ArgKind, Envelope, EnvelopeBytes, EnvelopeSignature, InvokeValue, Operation, TimeBounds,
    },
    proposal::SettlementRef,
};
use serde_json::json;

use crate::{
    builder::{ArgEncoding, BuilderConfig, DEFAULT_BASE_FEE, EnvelopeBuilder, parse_arg_schema},
    encoding::{EnvelopeCodecError, decode_envelope, encode_envelope},
    error::EnvelopeBuilderError,
    provider::{
        AccountState, LedgerError, LedgerQueryService, LedgerThresholds, SimulationResult,
        SubmitReceipt, TxStatusReport,
    },
};

const SOURCE: &str = "LDG_SOURCE_ACCOUNT";
const DESTINATION: &str = "LDG_DESTINATION_ACCOUNT";
const CONTRACT: &str = "LDG_TOKEN_CONTRACT";
const SIGNER_A: &str = "KEY_SIGNER_A";
const SIGNER_B: &str = "KEY_SIGNER_B";
const SIGNER_C: &str = "KEY_SIGNER_C";
const SIGNER_D: &str = "KEY_SIGNER_D";

#[tokio::test]
async fn transfer_rejects_zero_amount_before_any_lookup() {
    // The stub knows no accounts, so reaching the ledger would surface
    // AccountNotFound instead of the expected validation error.
    let builder = builder_over(StubLedger::default());

    let err = builder
        .build_transfer(&SOURCE.into(), &DESTINATION.into(), 0, None)
        .await
        .unwrap_err();

    assert!(matches!(err, EnvelopeBuilderError::InvalidAmount(0)));
}

#[tokio::test]
async fn transfer_fails_for_unknown_source() {
    let builder = builder_over(StubLedger::default());

    let err = builder
        .build_transfer(&SOURCE.into(), &DESTINATION.into(), 50, None)
        .await
        .unwrap_err();

    assert!(matches!(err, EnvelopeBuilderError::AccountNotFound(address) if address == SOURCE.into()));
}

#[tokio::test]
async fn transfer_populates_every_envelope_field() {
    let builder = builder_over(StubLedger::with_account(funded_account(7, 2)));

    let envelope = builder
        .build_transfer(&SOURCE.into(), &DESTINATION.into(), 250, Some("rent".to_owned()))
        .await
        .unwrap();

    assert_eq!(*envelope.source(), SOURCE.into());
    assert_eq!(envelope.fee(), DEFAULT_BASE_FEE);
    assert_eq!(envelope.sequence(), 8);
    assert_eq!(envelope.memo(), Some("rent"));
    assert!(envelope.is_unsigned());
    assert!(envelope.resource_fee().is_none());
    assert_eq!(
        envelope.operations(),
        &[Operation::Payment { destination: DESTINATION.into(), amount: 250 }]
    );

    let bounds = envelope.time_bounds();
    assert_eq!(bounds.max_time() - bounds.min_time(), chrono::Duration::days(2));
}

#[tokio::test]
async fn transfer_honours_configured_fee_and_window() {
    let config = BuilderConfig::builder()
        .base_fee(40)
        .validity_window(Duration::from_secs(3600))
        .build();
    let builder = EnvelopeBuilder::builder()
        .ledger(Arc::new(StubLedger::with_account(funded_account(0, 2))))
        .config(config)
        .build();

    let envelope = builder
        .build_transfer(&SOURCE.into(), &DESTINATION.into(), 1, None)
        .await
        .unwrap();

    assert_eq!(envelope.fee(), 40);
    let bounds = envelope.time_bounds();
    assert_eq!(bounds.max_time() - bounds.min_time(), chrono::Duration::hours(1));
}

#[tokio::test]
async fn invocation_converts_arguments_in_schema_order() {
    let builder = builder_over(StubLedger::with_account(funded_account(3, 2)));
    // Schema order deliberately disagrees with the map's alphabetical order.
    let schema = parse_arg_schema(&[
        pair("recipient", "address"),
        pair("amount", "u64"),
        pair("payload", "bytes"),
        pair("frozen", "bool"),
    ])
    .unwrap();
    let args = BTreeMap::from([
        ("amount".to_owned(), json!("250")),
        ("frozen".to_owned(), json!(false)),
        ("payload".to_owned(), json!("0xdeadbeef")),
        ("recipient".to_owned(), json!(DESTINATION)),
    ]);

    let build = builder
        .build_invocation(&SOURCE.into(), &CONTRACT.into(), "transfer", &args, Some(&schema))
        .await
        .unwrap();

    assert_eq!(build.arg_encoding(), ArgEncoding::SchemaTyped);
    let [Operation::Invoke { contract, function, args }] = build.envelope().operations() else {
        panic!("expected a single invoke operation");
    };
    assert_eq!(contract.as_str(), CONTRACT);
    assert_eq!(function, "transfer");
    assert_eq!(
        args,
        &vec![
            InvokeValue::Address(DESTINATION.to_owned()),
            InvokeValue::U64(250),
            InvokeValue::Bytes(vec![0xde, 0xad, 0xbe, 0xef]),
            InvokeValue::Bool(false),
        ]
    );
}

#[tokio::test]
async fn invocation_rejects_missing_argument() {
    let builder = builder_over(StubLedger::with_account(funded_account(3, 2)));
    let schema = parse_arg_schema(&[pair("recipient", "address"), pair("amount", "u64")]).unwrap();
    let args = BTreeMap::from([("recipient".to_owned(), json!(DESTINATION))]);

    let err = builder
        .build_invocation(&SOURCE.into(), &CONTRACT.into(), "transfer", &args, Some(&schema))
        .await
        .unwrap_err();

    assert!(matches!(err, EnvelopeBuilderError::SchemaMismatch { name, .. } if name == "amount"));
}

#[tokio::test]
async fn invocation_rejects_ill_shaped_argument() {
    let builder = builder_over(StubLedger::with_account(funded_account(3, 2)));
    let schema = parse_arg_schema(&[pair("amount", "u64")]).unwrap();
    let args = BTreeMap::from([("amount".to_owned(), json!("not a number"))]);

    let err = builder
        .build_invocation(&SOURCE.into(), &CONTRACT.into(), "mint", &args, Some(&schema))
        .await
        .unwrap_err();

    assert!(matches!(err, EnvelopeBuilderError::SchemaMismatch { name, .. } if name == "amount"));
}

#[tokio::test]
async fn invocation_without_schema_is_flagged_best_effort() {
    let builder = builder_over(StubLedger::with_account(funded_account(3, 2)));
    let args = BTreeMap::from([
        ("active".to_owned(), json!(true)),
        ("count".to_owned(), json!(42)),
        ("delta".to_owned(), json!(-3)),
        ("label".to_owned(), json!("treasury")),
    ]);

    let build = builder
        .build_invocation(&SOURCE.into(), &CONTRACT.into(), "configure", &args, None)
        .await
        .unwrap();

    assert_eq!(build.arg_encoding(), ArgEncoding::BestEffort);
    let [Operation::Invoke { args, .. }] = build.envelope().operations() else {
        panic!("expected a single invoke operation");
    };
    assert_eq!(
        args,
        &vec![
            InvokeValue::Bool(true),
            InvokeValue::U64(42),
            InvokeValue::I64(-3),
            InvokeValue::Str("treasury".to_owned()),
        ]
    );
}

#[test]
fn schema_parsing_rejects_unknown_kind() {
    let err =
        parse_arg_schema(&[pair("amount", "u64"), pair("blob", "matrix")]).unwrap_err();

    assert!(matches!(
        err,
        EnvelopeBuilderError::UnsupportedType { name, kind } if name == "blob" && kind == "matrix"
    ));
}

#[test]
fn schema_parsing_preserves_declaration_order() {
    let schema =
        parse_arg_schema(&[pair("zz_first", "u32"), pair("aa_second", "str")]).unwrap();

    assert_eq!(schema.len(), 2);
    assert_eq!(schema[0].name(), "zz_first");
    assert_eq!(schema[0].kind(), ArgKind::U32);
    assert_eq!(schema[1].name(), "aa_second");
    assert_eq!(schema[1].kind(), ArgKind::Str);
}

#[tokio::test]
async fn signer_update_requires_a_change() {
    // Duplicates in the input collapse before comparison, and validation
    // fires before any ledger lookup (the stub knows no accounts).
    let builder = builder_over(StubLedger::default());
    let current = signer_keys(&[SIGNER_A, SIGNER_B]);
    let desired = signer_keys(&[SIGNER_B, SIGNER_A, SIGNER_A]);

    let err = builder
        .build_signer_update(&SOURCE.into(), &current, &desired, None)
        .await
        .unwrap_err();

    assert!(matches!(err, EnvelopeBuilderError::NoChangeRequested));
}

#[tokio::test]
async fn signer_update_rejects_unsatisfiable_new_threshold() {
    let builder = builder_over(StubLedger::default());
    let current = signer_keys(&[SIGNER_A, SIGNER_B, SIGNER_C]);
    let desired = signer_keys(&[SIGNER_A, SIGNER_B]);

    let err = builder
        .build_signer_update(
            &SOURCE.into(),
            &current,
            &desired,
            Some(NonZeroU8::new(3).unwrap()),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EnvelopeBuilderError::InvalidThreshold { threshold: 3, signers: 2 }
    ));
}

#[tokio::test]
async fn signer_update_rejects_shrinking_below_current_threshold() {
    // No new threshold requested, so the account's standing threshold of 3
    // must still be satisfiable by the shrunken set.
    let builder = builder_over(StubLedger::with_account(funded_account(3, 3)));
    let current = signer_keys(&[SIGNER_A, SIGNER_B, SIGNER_C]);
    let desired = signer_keys(&[SIGNER_A, SIGNER_B]);

    let err = builder
        .build_signer_update(&SOURCE.into(), &current, &desired, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EnvelopeBuilderError::InvalidThreshold { threshold: 3, signers: 2 }
    ));
}

#[tokio::test]
async fn signer_update_emits_removals_additions_then_threshold() {
    let builder = builder_over(StubLedger::with_account(funded_account(3, 2)));
    let current = signer_keys(&[SIGNER_A, SIGNER_B, SIGNER_C]);
    let desired = signer_keys(&[SIGNER_A, SIGNER_B, SIGNER_D]);

    let envelope = builder
        .build_signer_update(
            &SOURCE.into(),
            &current,
            &desired,
            Some(NonZeroU8::new(2).unwrap()),
        )
        .await
        .unwrap();

    assert_eq!(
        envelope.operations(),
        &[
            Operation::SetSignerWeight { signer: SIGNER_C.into(), weight: 0 },
            Operation::SetSignerWeight {
                signer: SIGNER_D.into(),
                weight: DEFAULT_SIGNER_WEIGHT
            },
            Operation::SetThresholds { low: 2, medium: 2, high: 2 },
        ]
    );
}

#[tokio::test]
async fn fee_assembly_folds_simulation_into_the_envelope() {
    let ledger = StubLedger::with_account(funded_account(1, 2))
        .simulation(SimulationScript::Succeed { resource_fee: 40, footprint: vec![1, 2, 3] });
    let builder = builder_over(ledger);

    let unsigned = builder
        .build_transfer(&SOURCE.into(), &DESTINATION.into(), 10, None)
        .await
        .unwrap();
    let assembled = builder.estimate_and_assemble_fees(unsigned).await.unwrap();

    assert_eq!(assembled.fee(), DEFAULT_BASE_FEE + 40);
    assert_eq!(assembled.resource_fee(), Some(40));
    assert_eq!(assembled.footprint(), Some(&EnvelopeBytes::from(vec![1, 2, 3])));
}

#[tokio::test]
async fn fee_assembly_surfaces_simulation_failure() {
    let ledger = StubLedger::with_account(funded_account(1, 2))
        .simulation(SimulationScript::Fail("contract trapped"));
    let builder = builder_over(ledger);

    let unsigned = builder
        .build_transfer(&SOURCE.into(), &DESTINATION.into(), 10, None)
        .await
        .unwrap();
    let err = builder.estimate_and_assemble_fees(unsigned).await.unwrap_err();

    assert!(matches!(
        err,
        EnvelopeBuilderError::SimulationFailed(reason) if reason.contains("contract trapped")
    ));
}

#[test]
fn codec_round_trips_a_signed_envelope() {
    let envelope = manual_envelope()
        .with_signature(signature(SIGNER_A, vec![0xAA; 64]))
        .with_signature(signature(SIGNER_B, vec![0xBB; 64]))
        .with_assembled_fees(25, EnvelopeBytes::from(vec![7, 7]));

    let bytes = encode_envelope(&envelope).unwrap();
    let decoded = decode_envelope(&bytes).unwrap();

    assert_eq!(decoded, envelope);
}

#[test]
fn codec_rejects_empty_and_unknown_version_bytes() {
    let empty = decode_envelope(&EnvelopeBytes::from(Vec::new())).unwrap_err();
    assert!(matches!(empty, EnvelopeCodecError::Empty));

    let unknown = decode_envelope(&EnvelopeBytes::from(vec![9, 1, 2, 3])).unwrap_err();
    assert!(matches!(unknown, EnvelopeCodecError::UnsupportedVersion(9)));
}

#[test]
fn envelope_extension_accepts_appends_and_rejects_rewrites() {
    let base = manual_envelope();
    let once = base.clone().with_signature(signature(SIGNER_A, vec![0xAA; 64]));
    let twice = once.clone().with_signature(signature(SIGNER_B, vec![0xBB; 64]));

    assert!(once.extends(&base));
    assert!(twice.extends(&once));
    assert!(twice.extends(&base));
    assert!(!base.extends(&once));

    // Same signature count, different attribution: not an extension.
    let swapped = base.clone().with_signature(signature(SIGNER_B, vec![0xAA; 64]));
    assert!(!swapped.extends(&once));

    // Touching a signed-over field invalidates the lineage entirely.
    let refitted = once.clone().with_assembled_fees(5, EnvelopeBytes::from(vec![1]));
    assert!(!refitted.core_matches(&once));
    assert!(!refitted.extends(&once));
}

// HELPERS
// ================================================================================================

enum SimulationScript {
    Succeed { resource_fee: u64, footprint: Vec<u8> },
    Fail(&'static str),
}

#[derive(Default)]
struct StubLedger {
    accounts: BTreeMap<AccountAddress, AccountState>,
    simulation: Option<SimulationScript>,
}

impl StubLedger {
    fn with_account(state: AccountState) -> Self {
        let mut accounts = BTreeMap::new();
        accounts.insert(state.address().clone(), state);
        Self { accounts, simulation: None }
    }

    fn simulation(mut self, script: SimulationScript) -> Self {
        self.simulation = Some(script);
        self
    }
}

#[async_trait]
impl LedgerQueryService for StubLedger {
    async fn account_state(&self, address: &AccountAddress) -> Result<AccountState, LedgerError> {
        self.accounts
            .get(address)
            .cloned()
            .ok_or_else(|| LedgerError::AccountNotFound(address.clone()))
    }

    async fn simulate(&self, _envelope: &Envelope) -> Result<SimulationResult, LedgerError> {
        match &self.simulation {
            Some(SimulationScript::Succeed { resource_fee, footprint }) => {
                Ok(SimulationResult::builder()
                    .resource_fee(*resource_fee)
                    .footprint(footprint.clone().into())
                    .build())
            },
            Some(SimulationScript::Fail(reason)) => Err(LedgerError::simulation(*reason)),
            None => Err(LedgerError::transport("no simulation scripted")),
        }
    }

    async fn submit(&self, _envelope: &Envelope) -> Result<SubmitReceipt, LedgerError> {
        Err(LedgerError::transport("submit not scripted"))
    }

    async fn transaction_status(
        &self,
        _reference: &SettlementRef,
    ) -> Result<TxStatusReport, LedgerError> {
        Err(LedgerError::transport("status not scripted"))
    }
}

fn builder_over(ledger: StubLedger) -> EnvelopeBuilder {
    EnvelopeBuilder::builder().ledger(Arc::new(ledger)).build()
}

fn funded_account(sequence: u64, threshold: u8) -> AccountState {
    AccountState::builder()
        .address(SOURCE.into())
        .sequence(sequence)
        .signers(vec![
            signer_entry(SOURCE),
            signer_entry(SIGNER_A),
            signer_entry(SIGNER_B),
            signer_entry(SIGNER_C),
        ])
        .thresholds(LedgerThresholds::builder().low(1).medium(threshold).high(threshold).build())
        .build()
}

fn signer_entry(key: &str) -> AccountSigner {
    AccountSigner::builder().key(key.into()).build()
}

fn signer_keys(keys: &[&str]) -> Vec<SignerKey> {
    keys.iter().map(|key| SignerKey::from(*key)).collect()
}

fn pair(name: &str, kind: &str) -> (String, String) {
    (name.to_owned(), kind.to_owned())
}

fn signature(signer: &str, bytes: Vec<u8>) -> EnvelopeSignature {
    EnvelopeSignature::builder().signer(signer.into()).bytes(bytes).build()
}

fn manual_envelope() -> Envelope {
    let now = Utc::now();
    let bounds = TimeBounds::builder()
        .min_time(now)
        .max_time(now + chrono::Duration::hours(6))
        .build();

    Envelope::builder()
        .source(SOURCE.into())
        .fee(100)
        .sequence(12)
        .time_bounds(bounds)
        .memo("quarterly payout".to_owned())
        .operations(vec![Operation::Payment { destination: DESTINATION.into(), amount: 900 }])
        .build()
}
