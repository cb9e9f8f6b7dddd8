#![allow(missing_docs)]

mod config;
mod error;
mod executor;
mod types;

pub use self::{
    config::{CoordinatorConfig, get_configuration},
    error::{MultisigEngineError, MultisigEngineErrorKind},
    executor::{DEFAULT_POLL_INTERVAL, DEFAULT_POLL_WINDOW, ExecutionCoordinator, ExecutionError},
    types::{request, response},
};

use std::sync::Arc;

use multisig_coordinator_domain::{
    account::{AccountAddress, MultisigAccount, SignerKey, WithSigners},
    envelope::Envelope,
    proposal::{Proposal, ProposalId, ProposalStats, ProposalStatus, SignatureRecord},
};
use multisig_coordinator_registry::{ApprovalLedger, ApprovalLedgerError, RegistryStore};
use multisig_ledger_client::{
    SigningContext,
    builder::{BuilderConfig, EnvelopeBuilder, parse_arg_schema},
    encoding::decode_envelope,
    provider::{LedgerQueryService, WalletSigner},
};

use self::types::{
    request::{
        ApproveProposalRequest, ApproveProposalRequestDissolved, ExecuteProposalRequest,
        ExecuteProposalRequestDissolved, ProposeInvocationRequest,
        ProposeInvocationRequestDissolved, ProposeSignerUpdateRequest,
        ProposeSignerUpdateRequestDissolved, ProposeTransferRequest,
        ProposeTransferRequestDissolved, RegisterAccountRequest,
        RegisterAccountRequestDissolved, RejectProposalRequest, RejectProposalRequestDissolved,
    },
    response::{
        ApproveProposalResponse, ExecuteProposalResponse, LedgerSignersResponse,
        ProposeInvocationResponse, ProposeSignerUpdateResponse, ProposeTransferResponse,
        RegisterAccountResponse,
    },
};

pub struct MultisigEngine {
    builder: EnvelopeBuilder,
    approvals: ApprovalLedger,
    executor: ExecutionCoordinator,
    wallet: Arc<dyn WalletSigner>,
    query: Arc<dyn LedgerQueryService>,
    config: CoordinatorConfig,
}

#[bon::bon]
impl MultisigEngine {
    #[builder]
    pub fn new(
        query: Arc<dyn LedgerQueryService>,
        wallet: Arc<dyn WalletSigner>,
        store: Arc<dyn RegistryStore>,
        config: CoordinatorConfig,
    ) -> Self {
        let builder = EnvelopeBuilder::builder()
            .ledger(Arc::clone(&query))
            .config(
                BuilderConfig::builder()
                    .base_fee(config.base_fee)
                    .validity_window(config.validity_window)
                    .build(),
            )
            .build();

        let approvals = ApprovalLedger::builder().store(store).build();

        let executor = ExecutionCoordinator::builder()
            .query(Arc::clone(&query))
            .wallet(Arc::clone(&wallet))
            .approvals(approvals.clone())
            .poll_interval(config.poll_interval)
            .poll_window(config.poll_window)
            .build();

        Self { builder, approvals, executor, wallet, query, config }
    }
}

impl MultisigEngine {
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Builds the signing context handed to wallets, binding every signature
    /// request to the configured network and endpoint.
    pub fn signing_context(&self, wallet_address: SignerKey) -> SigningContext {
        SigningContext::builder()
            .wallet_address(wallet_address)
            .network(self.config.network)
            .rpc_endpoint(self.config.rpc_endpoint.clone())
            .build()
    }

    pub async fn register_account(
        &self,
        request: RegisterAccountRequest,
    ) -> Result<RegisterAccountResponse, MultisigEngineError> {
        let RegisterAccountRequestDissolved { address, label, threshold, signers } =
            request.dissolve();

        let account = self
            .approvals
            .register_account(address, label, threshold, signers)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        Ok(RegisterAccountResponse::builder().account(account).build())
    }

    pub async fn propose_transfer(
        &self,
        request: ProposeTransferRequest,
    ) -> Result<ProposeTransferResponse, MultisigEngineError> {
        let ProposeTransferRequestDissolved {
            account,
            destination,
            amount,
            memo,
            description,
            proposer,
            sign_on_create,
        } = request.dissolve();

        let envelope = self
            .builder
            .build_transfer(&account, &destination, amount, memo)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        let (proposal, record) =
            self.store_proposal(account, description, envelope, proposer, sign_on_create).await?;

        Ok(ProposeTransferResponse::builder().proposal(proposal).maybe_record(record).build())
    }

    pub async fn propose_invocation(
        &self,
        request: ProposeInvocationRequest,
    ) -> Result<ProposeInvocationResponse, MultisigEngineError> {
        let ProposeInvocationRequestDissolved {
            account,
            contract,
            function,
            args,
            schema,
            description,
            proposer,
            sign_on_create,
        } = request.dissolve();

        let schema = schema
            .as_deref()
            .map(parse_arg_schema)
            .transpose()
            .map_err(MultisigEngineErrorKind::from)?;

        let build = self
            .builder
            .build_invocation(&account, &contract, &function, &args, schema.as_ref())
            .await
            .map_err(MultisigEngineErrorKind::from)?;
        let arg_encoding = build.arg_encoding();

        // Invocations pick up simulated resource fees before entering the
        // ledger; transfers and signer updates keep the flat base fee.
        let envelope = self
            .builder
            .estimate_and_assemble_fees(build.envelope().clone())
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        let (proposal, record) =
            self.store_proposal(account, description, envelope, proposer, sign_on_create).await?;

        let response = ProposeInvocationResponse::builder()
            .proposal(proposal)
            .maybe_record(record)
            .arg_encoding(arg_encoding)
            .build();

        Ok(response)
    }

    pub async fn propose_signer_update(
        &self,
        request: ProposeSignerUpdateRequest,
    ) -> Result<ProposeSignerUpdateResponse, MultisigEngineError> {
        let ProposeSignerUpdateRequestDissolved {
            account,
            current_signers,
            new_signers,
            new_threshold,
            description,
            proposer,
            sign_on_create,
        } = request.dissolve();

        let envelope = self
            .builder
            .build_signer_update(&account, &current_signers, &new_signers, new_threshold)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        let (proposal, record) =
            self.store_proposal(account, description, envelope, proposer, sign_on_create).await?;

        Ok(ProposeSignerUpdateResponse::builder().proposal(proposal).maybe_record(record).build())
    }

    pub async fn approve_proposal(
        &self,
        request: ApproveProposalRequest,
    ) -> Result<ApproveProposalResponse, MultisigEngineError> {
        let ApproveProposalRequestDissolved { account, proposal_id, signer } = request.dissolve();

        // Refuse before the wallet prompts: an unauthorized signer or a
        // settled proposal must not trigger a signature request.
        let registered = self
            .approvals
            .account(&account)
            .await
            .map_err(MultisigEngineErrorKind::from)?
            .ok_or(MultisigEngineErrorKind::not_found("account is not registered"))?;

        if !registered.is_signer(&signer) {
            return Err(
                MultisigEngineErrorKind::Approval(ApprovalLedgerError::UnauthorizedSigner(signer))
                    .into(),
            );
        }

        let proposal = self
            .approvals
            .proposal(&account, proposal_id)
            .await
            .map_err(MultisigEngineErrorKind::from)?
            .ok_or(MultisigEngineErrorKind::not_found("proposal does not exist"))?;

        match proposal.status() {
            ProposalStatus::Executed => {
                return Err(
                    MultisigEngineErrorKind::Approval(ApprovalLedgerError::AlreadyExecuted).into()
                );
            },
            ProposalStatus::RejectedOrDeleted => {
                return Err(
                    MultisigEngineErrorKind::Approval(ApprovalLedgerError::ProposalDeleted).into()
                );
            },
            _ => {},
        }

        let stored = decode_envelope(proposal.envelope())
            .map_err(ApprovalLedgerError::from)
            .map_err(MultisigEngineErrorKind::from)?;

        let ctx = self.signing_context(signer.clone());
        let signed = self
            .wallet
            .sign_envelope(&stored, &ctx)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        let record = self
            .approvals
            .record_signature(&account, proposal_id, signer, &signed)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        let status = self
            .approvals
            .status(&account, proposal_id)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        Ok(ApproveProposalResponse::builder().record(record).status(status).build())
    }

    pub async fn execute_proposal(
        &self,
        request: ExecuteProposalRequest,
    ) -> Result<ExecuteProposalResponse, MultisigEngineError> {
        let ExecuteProposalRequestDissolved {
            account,
            proposal_id,
            signer,
            require_final_signature,
        } = request.dissolve();

        let ctx = self.signing_context(signer);
        let settlement_ref = self
            .executor
            .execute(&account, proposal_id, &ctx, require_final_signature)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        Ok(ExecuteProposalResponse::builder().settlement_ref(settlement_ref).build())
    }

    pub async fn reject_proposal(
        &self,
        request: RejectProposalRequest,
    ) -> Result<(), MultisigEngineError> {
        let RejectProposalRequestDissolved { account, proposal_id } = request.dissolve();

        self.approvals
            .soft_delete(&account, proposal_id)
            .await
            .map_err(MultisigEngineErrorKind::from)
            .map_err(From::from)
    }

    pub async fn account(
        &self,
        address: &AccountAddress,
    ) -> Result<Option<MultisigAccount<WithSigners>>, MultisigEngineError> {
        self.approvals
            .account(address)
            .await
            .map_err(MultisigEngineErrorKind::from)
            .map_err(From::from)
    }

    pub async fn accounts_for_signer(
        &self,
        signer: &SignerKey,
    ) -> Result<Vec<MultisigAccount<WithSigners>>, MultisigEngineError> {
        self.approvals
            .accounts_for_signer(signer)
            .await
            .map_err(MultisigEngineErrorKind::from)
            .map_err(From::from)
    }

    pub async fn proposal(
        &self,
        account: &AccountAddress,
        proposal_id: ProposalId,
    ) -> Result<Option<Proposal>, MultisigEngineError> {
        self.approvals
            .proposal(account, proposal_id)
            .await
            .map_err(MultisigEngineErrorKind::from)
            .map_err(From::from)
    }

    pub async fn list_proposals(
        &self,
        account: &AccountAddress,
        include_deleted: bool,
    ) -> Result<Vec<Proposal>, MultisigEngineError> {
        self.approvals
            .list_proposals(account, include_deleted)
            .await
            .map_err(MultisigEngineErrorKind::from)
            .map_err(From::from)
    }

    pub async fn proposal_status(
        &self,
        account: &AccountAddress,
        proposal_id: ProposalId,
    ) -> Result<ProposalStatus, MultisigEngineError> {
        self.approvals
            .status(account, proposal_id)
            .await
            .map_err(MultisigEngineErrorKind::from)
            .map_err(From::from)
    }

    pub async fn approval_count(
        &self,
        account: &AccountAddress,
        proposal_id: ProposalId,
    ) -> Result<u32, MultisigEngineError> {
        self.approvals
            .approval_count(account, proposal_id)
            .await
            .map_err(MultisigEngineErrorKind::from)
            .map_err(From::from)
    }

    pub async fn signature_records(
        &self,
        account: &AccountAddress,
        proposal_id: ProposalId,
    ) -> Result<Vec<SignatureRecord>, MultisigEngineError> {
        self.approvals
            .signature_records(account, proposal_id)
            .await
            .map_err(MultisigEngineErrorKind::from)
            .map_err(From::from)
    }

    pub async fn proposal_stats(
        &self,
        account: &AccountAddress,
    ) -> Result<ProposalStats, MultisigEngineError> {
        self.approvals
            .stats(account)
            .await
            .map_err(MultisigEngineErrorKind::from)
            .map_err(From::from)
    }

    /// Fetches the live signer configuration straight from the ledger,
    /// bypassing the registry. The registry may lag behind an executed
    /// signer update until re-registration.
    pub async fn ledger_signers(
        &self,
        account: &AccountAddress,
    ) -> Result<LedgerSignersResponse, MultisigEngineError> {
        let state = self
            .query
            .account_state(account)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        let threshold = state.approval_threshold();

        Ok(LedgerSignersResponse::builder().signers(state.cosigners()).threshold(threshold).build())
    }

    async fn store_proposal(
        &self,
        account: AccountAddress,
        description: String,
        envelope: Envelope,
        proposer: SignerKey,
        sign_on_create: bool,
    ) -> Result<(Proposal, Option<SignatureRecord>), MultisigEngineError> {
        let proposal = self
            .approvals
            .create_proposal(&account, description, &envelope)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        if !sign_on_create {
            return Ok((proposal, None));
        }

        // A wallet decline from here on leaves the proposal stored and
        // unsigned; the proposer can re-approve or reject it later.
        let ctx = self.signing_context(proposer.clone());
        let signed = self
            .wallet
            .sign_envelope(&envelope, &ctx)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        let record = self
            .approvals
            .record_signature(&account, proposal.id(), proposer, &signed)
            .await
            .map_err(MultisigEngineErrorKind::from)?;

        let proposal = self
            .approvals
            .proposal(&account, proposal.id())
            .await
            .map_err(MultisigEngineErrorKind::from)?
            .ok_or(MultisigEngineErrorKind::not_found("proposal does not exist"))?;

        Ok((proposal, Some(record)))
    }
}
