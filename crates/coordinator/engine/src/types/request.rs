//! Request types for coordinator engine operations.

mod error;

pub use self::error::{RegisterAccountRequestError, RequestError};

use core::num::NonZeroU8;
use std::collections::BTreeMap;

use bon::Builder;
use dissolve_derive::Dissolve;
use multisig_coordinator_domain::{
    account::{AccountAddress, AccountSigner, SignerKey},
    envelope::ContractAddress,
    proposal::ProposalId,
};
use serde_json::Value;

/// Request to register a multisig account with the coordinator.
///
/// # Validation
///
/// The request validates that:
/// - `signers` is non-empty and free of duplicate keys
/// - The threshold doesn't exceed the combined signer weight
#[derive(Debug, Dissolve)]
pub struct RegisterAccountRequest {
    /// The on-ledger address of the multisig account
    address: AccountAddress,

    /// A human-readable label for display purposes
    label: String,

    /// Combined signature weight required to execute proposals
    threshold: NonZeroU8,

    /// The signers allowed to approve proposals, with their weights
    signers: Vec<AccountSigner>,
}

/// Request to propose a payment from a multisig account.
#[derive(Debug, Builder, Dissolve)]
pub struct ProposeTransferRequest {
    /// The multisig account the payment is drawn from
    account: AccountAddress,

    /// The destination account
    destination: AccountAddress,

    /// The amount to move, in native units
    amount: u64,

    /// Optional memo carried inside the envelope
    memo: Option<String>,

    /// A human-readable description stored with the proposal
    description: String,

    /// The signer proposing the payment
    proposer: SignerKey,

    /// Whether to collect the proposer's signature right away
    #[builder(default = true)]
    sign_on_create: bool,
}

/// Request to propose a contract invocation from a multisig account.
#[derive(Debug, Builder, Dissolve)]
pub struct ProposeInvocationRequest {
    /// The multisig account invoking the contract
    account: AccountAddress,

    /// The contract to invoke
    contract: ContractAddress,

    /// The function to call on the contract
    function: String,

    /// The invocation arguments, keyed by parameter name
    args: BTreeMap<String, Value>,

    /// Declared parameter kinds as `(name, kind)` pairs, in call order.
    /// Without a schema the argument kinds are inferred from the values.
    schema: Option<Vec<(String, String)>>,

    /// A human-readable description stored with the proposal
    description: String,

    /// The signer proposing the invocation
    proposer: SignerKey,

    /// Whether to collect the proposer's signature right away
    #[builder(default = true)]
    sign_on_create: bool,
}

/// Request to propose a signer-set change for a multisig account.
#[derive(Debug, Builder, Dissolve)]
pub struct ProposeSignerUpdateRequest {
    /// The multisig account whose signer set changes
    account: AccountAddress,

    /// The signer keys currently on the account
    current_signers: Vec<SignerKey>,

    /// The signer keys the account should end up with
    new_signers: Vec<SignerKey>,

    /// Optional new approval threshold
    new_threshold: Option<NonZeroU8>,

    /// A human-readable description stored with the proposal
    description: String,

    /// The signer proposing the change
    proposer: SignerKey,

    /// Whether to collect the proposer's signature right away
    #[builder(default = true)]
    sign_on_create: bool,
}

/// Request to add one signer's approval to a proposal.
#[derive(Debug, Builder, Dissolve)]
pub struct ApproveProposalRequest {
    /// The multisig account the proposal belongs to
    account: AccountAddress,

    /// The proposal to approve
    proposal_id: ProposalId,

    /// The signer whose wallet provides the signature
    signer: SignerKey,
}

/// Request to execute a ready proposal on chain.
#[derive(Debug, Builder, Dissolve)]
pub struct ExecuteProposalRequest {
    /// The multisig account the proposal belongs to
    account: AccountAddress,

    /// The proposal to execute
    proposal_id: ProposalId,

    /// The signer driving the execution
    signer: SignerKey,

    /// Whether the executing signer's wallet countersigns before
    /// submission. The extra signature rides along for submission only and
    /// is never written back to the approval ledger.
    #[builder(default = true)]
    require_final_signature: bool,
}

/// Request to reject a proposal, hiding it from default listings.
#[derive(Debug, Builder, Dissolve)]
pub struct RejectProposalRequest {
    /// The multisig account the proposal belongs to
    account: AccountAddress,

    /// The proposal to reject
    proposal_id: ProposalId,
}

#[bon::bon]
impl RegisterAccountRequest {
    /// Creates a new account registration request with validation.
    ///
    /// # Parameters
    ///
    /// * `address` - The on-ledger address of the multisig account
    /// * `label` - A human-readable label for display purposes
    /// * `threshold` - Combined weight required (must not exceed the total signer weight)
    /// * `signers` - The approving signers (must be non-empty and free of duplicates)
    ///
    /// Returns an error if validation fails.
    #[builder]
    pub fn new(
        address: AccountAddress,
        label: String,
        threshold: NonZeroU8,
        signers: Vec<AccountSigner>,
    ) -> Result<Self, RegisterAccountRequestError> {
        if signers.is_empty() {
            return Err(RegisterAccountRequestError::EmptySigners);
        }

        let mut keys: Vec<&SignerKey> = signers.iter().map(AccountSigner::key).collect();
        keys.sort_unstable();
        if keys.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(RegisterAccountRequestError::DuplicateSigner);
        }

        let total_weight: u32 = signers.iter().map(|signer| u32::from(signer.weight())).sum();
        if u32::from(threshold.get()) > total_weight {
            return Err(RegisterAccountRequestError::ExcessThreshold);
        }

        Ok(Self { address, label, threshold, signers })
    }
}
