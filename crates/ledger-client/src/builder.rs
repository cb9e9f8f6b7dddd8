//! Envelope construction for every proposal flavour the coordinator
//! understands.
//!
//! The [`EnvelopeBuilder`] owns a [`LedgerQueryService`] handle and turns
//! caller intent (a transfer, a contract invocation, a signer-set change)
//! into a fully-populated unsigned [`Envelope`]. All local validation runs
//! before the first network round-trip so bad input fails fast.

use std::{collections::BTreeMap, num::NonZeroU8, sync::Arc, time::Duration};

use bon::Builder;
use chrono::Utc;
use dissolve_derive::Dissolve;
use itertools::Itertools;
use multisig_coordinator_domain::{
    account::{AccountAddress, DEFAULT_SIGNER_WEIGHT, SignerKey},
    envelope::{
        ArgKind, ArgParam, ArgSchema, ContractAddress, Envelope, InvokeValue, Operation,
        TimeBounds,
    },
};
use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    error::{EnvelopeBuilderError, Result},
    provider::{
        AccountState, LedgerError, LedgerQueryService, SimulationResult,
        SimulationResultDissolved,
    },
};

/// Flat fee charged per envelope before simulation refines it.
pub const DEFAULT_BASE_FEE: u64 = 100;

/// How long a freshly built envelope stays valid on chain.
pub const DEFAULT_VALIDITY_WINDOW: Duration = Duration::from_secs(2 * 24 * 60 * 60);

/// Tuning knobs for envelope construction.
#[derive(Debug, Clone, Builder)]
pub struct BuilderConfig {
    /// Flat fee attached to every envelope at build time.
    #[builder(default = DEFAULT_BASE_FEE)]
    base_fee: u64,
    /// Width of the time-bounds window starting at build time.
    #[builder(default = DEFAULT_VALIDITY_WINDOW)]
    validity_window: Duration,
}

impl BuilderConfig {
    /// Flat fee attached to every envelope at build time.
    pub fn base_fee(&self) -> u64 {
        self.base_fee
    }

    /// Width of the time-bounds window starting at build time.
    pub fn validity_window(&self) -> Duration {
        self.validity_window
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// How invocation arguments were encoded into the envelope.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum ArgEncoding {
    /// Every argument was converted against the declared schema.
    SchemaTyped,
    /// No usable schema; argument kinds were inferred from the values.
    BestEffort,
}

/// Result of [`EnvelopeBuilder::build_invocation`].
#[derive(Debug, Clone, Dissolve)]
pub struct InvocationBuild {
    /// The unsigned invocation envelope.
    envelope: Envelope,
    /// Whether the arguments were schema-typed or best-effort inferred.
    arg_encoding: ArgEncoding,
}

impl InvocationBuild {
    /// The unsigned invocation envelope.
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Whether the arguments were schema-typed or best-effort inferred.
    pub fn arg_encoding(&self) -> ArgEncoding {
        self.arg_encoding
    }
}

/// Builds unsigned envelopes for the supported proposal operations.
#[derive(Clone)]
pub struct EnvelopeBuilder {
    ledger: Arc<dyn LedgerQueryService>,
    config: BuilderConfig,
}

#[bon::bon]
impl EnvelopeBuilder {
    /// Creates a builder over the given ledger handle.
    #[builder]
    pub fn new(
        ledger: Arc<dyn LedgerQueryService>,
        #[builder(default)] config: BuilderConfig,
    ) -> Self {
        Self { ledger, config }
    }
}

impl EnvelopeBuilder {
    /// Builds an unsigned payment envelope moving `amount` from `source` to
    /// `destination`.
    ///
    /// Fails with [`EnvelopeBuilderError::InvalidAmount`] before any network
    /// call when `amount` is zero.
    #[tracing::instrument(skip_all, fields(%source, %destination, amount))]
    pub async fn build_transfer(
        &self,
        source: &AccountAddress,
        destination: &AccountAddress,
        amount: u64,
        memo: Option<String>,
    ) -> Result<Envelope> {
        if amount == 0 {
            return Err(EnvelopeBuilderError::InvalidAmount(amount));
        }

        let state = self.account_state(source).await?;
        let operation = Operation::Payment { destination: destination.clone(), amount };
        self.base_envelope(&state, memo, vec![operation])
    }

    /// Builds an unsigned invocation envelope calling `function` on
    /// `contract` with `named_args`.
    ///
    /// When `arg_schema` is present every argument is converted against it
    /// and a missing or ill-shaped value fails the build. Without a schema
    /// the argument kinds are inferred from the JSON values and the result
    /// is flagged [`ArgEncoding::BestEffort`].
    #[tracing::instrument(skip_all, fields(%source, %contract, function, args = named_args.len()))]
    pub async fn build_invocation(
        &self,
        source: &AccountAddress,
        contract: &ContractAddress,
        function: &str,
        named_args: &BTreeMap<String, Value>,
        arg_schema: Option<&ArgSchema>,
    ) -> Result<InvocationBuild> {
        let (args, arg_encoding) = match arg_schema {
            Some(schema) if !schema.is_empty() => {
                (convert_args(schema, named_args)?, ArgEncoding::SchemaTyped)
            },
            _ => {
                tracing::warn!(
                    %contract,
                    function,
                    "no argument schema available, falling back to inferred argument kinds"
                );
                (infer_args(named_args), ArgEncoding::BestEffort)
            },
        };

        let state = self.account_state(source).await?;
        let operation = Operation::Invoke {
            contract: contract.clone(),
            function: function.to_owned(),
            args,
        };
        let envelope = self.base_envelope(&state, None, vec![operation])?;

        Ok(InvocationBuild { envelope, arg_encoding })
    }

    /// Builds an unsigned envelope reshaping the signer set of `source` to
    /// exactly `new_signers`, optionally moving the approval threshold to
    /// `new_threshold`.
    ///
    /// Signers present on chain but absent from `new_signers` are removed
    /// (weight set to zero), new entries are added at the default weight,
    /// and a threshold change is appended last so it lands after the set
    /// reshuffle.
    #[tracing::instrument(
        skip_all,
        fields(%source, new_signers = new_signers.len(), threshold = ?new_threshold)
    )]
    pub async fn build_signer_update(
        &self,
        source: &AccountAddress,
        current_signers: &[SignerKey],
        new_signers: &[SignerKey],
        new_threshold: Option<NonZeroU8>,
    ) -> Result<Envelope> {
        let current: Vec<&SignerKey> = current_signers.iter().unique().collect();
        let desired: Vec<&SignerKey> = new_signers.iter().unique().collect();

        let removed: Vec<&SignerKey> =
            current.iter().filter(|key| !desired.contains(key)).copied().collect();
        let added: Vec<&SignerKey> =
            desired.iter().filter(|key| !current.contains(key)).copied().collect();

        if removed.is_empty() && added.is_empty() && new_threshold.is_none() {
            return Err(EnvelopeBuilderError::NoChangeRequested);
        }

        if let Some(threshold) = new_threshold
            && usize::from(threshold.get()) > desired.len()
        {
            return Err(EnvelopeBuilderError::InvalidThreshold {
                threshold: threshold.get(),
                signers: desired.len(),
            });
        }

        let state = self.account_state(source).await?;

        let effective_threshold =
            new_threshold.map(NonZeroU8::get).unwrap_or_else(|| state.approval_threshold());
        if effective_threshold == 0
            || usize::from(effective_threshold) > desired.len()
        {
            return Err(EnvelopeBuilderError::InvalidThreshold {
                threshold: effective_threshold,
                signers: desired.len(),
            });
        }

        let mut operations = Vec::with_capacity(removed.len() + added.len() + 1);
        operations.extend(removed.into_iter().map(|key| Operation::SetSignerWeight {
            signer: key.clone(),
            weight: 0,
        }));
        operations.extend(added.into_iter().map(|key| Operation::SetSignerWeight {
            signer: key.clone(),
            weight: DEFAULT_SIGNER_WEIGHT,
        }));
        if let Some(threshold) = new_threshold {
            operations.push(Operation::SetThresholds {
                low: threshold.get(),
                medium: threshold.get(),
                high: threshold.get(),
            });
        }

        self.base_envelope(&state, None, operations)
    }

    /// Simulates `envelope` and folds the discovered resource fee and
    /// footprint back into it.
    ///
    /// Any simulation failure surfaces as
    /// [`EnvelopeBuilderError::SimulationFailed`]; the input envelope is
    /// left untouched in that case.
    #[tracing::instrument(skip_all, fields(source = %envelope.source(), fee = envelope.fee()))]
    pub async fn estimate_and_assemble_fees(&self, envelope: Envelope) -> Result<Envelope> {
        let simulation: SimulationResult =
            self.ledger.simulate(&envelope).await.map_err(|err| {
                EnvelopeBuilderError::simulation_failed(err.to_string())
            })?;

        let SimulationResultDissolved { resource_fee, footprint } = simulation.dissolve();
        Ok(envelope.with_assembled_fees(resource_fee, footprint))
    }

    async fn account_state(&self, address: &AccountAddress) -> Result<AccountState> {
        self.ledger.account_state(address).await.map_err(|err| match err {
            LedgerError::AccountNotFound(address) => {
                EnvelopeBuilderError::AccountNotFound(address)
            },
            other => EnvelopeBuilderError::Ledger(other),
        })
    }

    fn base_envelope(
        &self,
        state: &AccountState,
        memo: Option<String>,
        operations: Vec<Operation>,
    ) -> Result<Envelope> {
        let window = chrono::Duration::from_std(self.config.validity_window)
            .map_err(|err| EnvelopeBuilderError::other(err.to_string()))?;
        let now = Utc::now();
        let time_bounds =
            TimeBounds::builder().min_time(now).max_time(now + window).build();

        Ok(Envelope::builder()
            .source(state.address().clone())
            .fee(self.config.base_fee)
            .sequence(state.sequence() + 1)
            .time_bounds(time_bounds)
            .maybe_memo(memo)
            .operations(operations)
            .build())
    }
}

/// Parses `(name, kind)` pairs into an [`ArgSchema`], preserving order.
///
/// An unknown kind string fails with
/// [`EnvelopeBuilderError::UnsupportedType`] naming the offending
/// parameter.
pub fn parse_arg_schema(pairs: &[(String, String)]) -> Result<ArgSchema> {
    pairs
        .iter()
        .map(|(name, kind)| {
            kind.parse::<ArgKind>()
                .map(|kind| ArgParam::builder().name(name.clone()).kind(kind).build())
                .map_err(|_| EnvelopeBuilderError::UnsupportedType {
                    name: name.clone(),
                    kind: kind.clone(),
                })
        })
        .try_collect()
}

fn convert_args(
    schema: &ArgSchema,
    named_args: &BTreeMap<String, Value>,
) -> Result<Vec<InvokeValue>> {
    schema
        .iter()
        .map(|param| {
            let value = named_args.get(param.name()).ok_or_else(|| {
                EnvelopeBuilderError::schema_mismatch(param.name(), "missing argument")
            })?;
            convert_value(param.name(), param.kind(), value)
        })
        .try_collect()
}

fn convert_value(name: &str, kind: ArgKind, value: &Value) -> Result<InvokeValue> {
    match kind {
        ArgKind::Address => value
            .as_str()
            .map(|s| InvokeValue::Address(s.to_owned()))
            .ok_or_else(|| mismatch(name, "expected an address string")),
        ArgKind::Bool => value
            .as_bool()
            .map(InvokeValue::Bool)
            .ok_or_else(|| mismatch(name, "expected a boolean")),
        ArgKind::Bytes => {
            let hex_str = value
                .as_str()
                .ok_or_else(|| mismatch(name, "expected a hex string"))?;
            hex::decode(hex_str.trim_start_matches("0x"))
                .map(InvokeValue::Bytes)
                .map_err(|_| mismatch(name, "expected hex-encoded bytes"))
        },
        ArgKind::I32 => i32::try_from(parse_signed(name, value)?)
            .map(InvokeValue::I32)
            .map_err(|_| mismatch(name, "value out of range for i32")),
        ArgKind::I64 => parse_signed(name, value).map(InvokeValue::I64),
        ArgKind::I128 => parse_i128(name, value).map(InvokeValue::I128),
        ArgKind::Str => value
            .as_str()
            .map(|s| InvokeValue::Str(s.to_owned()))
            .ok_or_else(|| mismatch(name, "expected a string")),
        ArgKind::U32 => u32::try_from(parse_unsigned(name, value)?)
            .map(InvokeValue::U32)
            .map_err(|_| mismatch(name, "value out of range for u32")),
        ArgKind::U64 => parse_unsigned(name, value).map(InvokeValue::U64),
        ArgKind::U128 => parse_u128(name, value).map(InvokeValue::U128),
    }
}

fn parse_signed(name: &str, value: &Value) -> Result<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| mismatch(name, "expected a signed integer"))
}

fn parse_unsigned(name: &str, value: &Value) -> Result<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| mismatch(name, "expected an unsigned integer"))
}

fn parse_i128(name: &str, value: &Value) -> Result<i128> {
    value
        .as_i64()
        .map(i128::from)
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| mismatch(name, "expected a 128-bit signed integer"))
}

fn parse_u128(name: &str, value: &Value) -> Result<u128> {
    value
        .as_u64()
        .map(u128::from)
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| mismatch(name, "expected a 128-bit unsigned integer"))
}

fn infer_args(named_args: &BTreeMap<String, Value>) -> Vec<InvokeValue> {
    named_args.values().map(infer_value).collect()
}

fn infer_value(value: &Value) -> InvokeValue {
    match value {
        Value::Bool(flag) => InvokeValue::Bool(*flag),
        Value::Number(number) => number
            .as_u64()
            .map(InvokeValue::U64)
            .or_else(|| number.as_i64().map(InvokeValue::I64))
            .unwrap_or_else(|| InvokeValue::Str(number.to_string())),
        Value::String(text) => InvokeValue::Str(text.clone()),
        other => InvokeValue::Str(other.to_string()),
    }
}

fn mismatch(name: &str, reason: &'static str) -> EnvelopeBuilderError {
    EnvelopeBuilderError::schema_mismatch(name, reason)
}
