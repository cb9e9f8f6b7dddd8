//! Response types for coordinator engine operations.

use dissolve_derive::Dissolve;
use multisig_coordinator_domain::{
    account::{AccountSigner, MultisigAccount, WithSigners},
    proposal::{Proposal, ProposalStatus, SettlementRef, SignatureRecord},
};
use multisig_ledger_client::builder::ArgEncoding;

/// Response from registering a multisig account.
#[derive(Debug, Dissolve)]
pub struct RegisterAccountResponse {
    /// The stored account with its validated signer set
    account: MultisigAccount<WithSigners>,
}

/// Response from proposing a transfer.
#[derive(Debug, Dissolve)]
pub struct ProposeTransferResponse {
    /// The stored proposal, reflecting any immediate proposer approval
    proposal: Proposal,

    /// The proposer's signature record when `sign_on_create` was set
    record: Option<SignatureRecord>,
}

/// Response from proposing a contract invocation.
#[derive(Debug, Dissolve)]
pub struct ProposeInvocationResponse {
    /// The stored proposal, reflecting any immediate proposer approval
    proposal: Proposal,

    /// The proposer's signature record when `sign_on_create` was set
    record: Option<SignatureRecord>,

    /// How the invocation arguments were encoded. A
    /// [`ArgEncoding::BestEffort`] value means no usable schema was
    /// available and the envelope deserves extra review before approval.
    arg_encoding: ArgEncoding,
}

/// Response from proposing a signer-set change.
#[derive(Debug, Dissolve)]
pub struct ProposeSignerUpdateResponse {
    /// The stored proposal, reflecting any immediate proposer approval
    proposal: Proposal,

    /// The proposer's signature record when `sign_on_create` was set
    record: Option<SignatureRecord>,
}

/// Response from approving a proposal.
#[derive(Debug, Dissolve)]
pub struct ApproveProposalResponse {
    /// The signature record written for the approving signer
    record: SignatureRecord,

    /// The proposal status after the approval was counted
    status: ProposalStatus,
}

/// Response from executing a proposal on chain.
#[derive(Debug, Dissolve)]
pub struct ExecuteProposalResponse {
    /// The settlement reference fixed by the confirmed transaction
    settlement_ref: SettlementRef,
}

/// Response carrying the live on-ledger signer view of an account.
#[derive(Debug, Dissolve)]
pub struct LedgerSignersResponse {
    /// The cosigners with their on-ledger weights, master key excluded
    signers: Vec<AccountSigner>,

    /// The signature weight the ledger itself enforces
    threshold: u8,
}

#[bon::bon]
impl RegisterAccountResponse {
    #[builder]
    pub(crate) fn new(account: MultisigAccount<WithSigners>) -> Self {
        Self { account }
    }
}

#[bon::bon]
impl ProposeTransferResponse {
    #[builder]
    pub(crate) fn new(proposal: Proposal, record: Option<SignatureRecord>) -> Self {
        Self { proposal, record }
    }
}

#[bon::bon]
impl ProposeInvocationResponse {
    #[builder]
    pub(crate) fn new(
        proposal: Proposal,
        record: Option<SignatureRecord>,
        arg_encoding: ArgEncoding,
    ) -> Self {
        Self { proposal, record, arg_encoding }
    }
}

#[bon::bon]
impl ProposeSignerUpdateResponse {
    #[builder]
    pub(crate) fn new(proposal: Proposal, record: Option<SignatureRecord>) -> Self {
        Self { proposal, record }
    }
}

#[bon::bon]
impl ApproveProposalResponse {
    #[builder]
    pub(crate) fn new(record: SignatureRecord, status: ProposalStatus) -> Self {
        Self { record, status }
    }
}

#[bon::bon]
impl ExecuteProposalResponse {
    #[builder]
    pub(crate) fn new(settlement_ref: SettlementRef) -> Self {
        Self { settlement_ref }
    }
}

#[bon::bon]
impl LedgerSignersResponse {
    #[builder]
    pub(crate) fn new(signers: Vec<AccountSigner>, threshold: u8) -> Self {
        Self { signers, threshold }
    }
}
