//! Ledger-facing client for the multisig proposal coordinator.
//!
//! This crate owns everything that talks about the target ledger without
//! owning the ledger itself:
//!
//! - The collaborator contracts the coordinator consumes: a
//!   [`LedgerQueryService`](provider::LedgerQueryService) for read-only
//!   queries, simulation, submission, and confirmation polling, and a
//!   [`WalletSigner`](provider::WalletSigner) for collecting signatures.
//!   Implementations (RPC transports, wallet extensions) are supplied by
//!   the embedding application.
//! - The [`EnvelopeBuilder`](builder::EnvelopeBuilder): transfer,
//!   invocation, and signer-update envelope construction plus fee
//!   estimation, resolving source account state from the ledger at call
//!   time.
//! - The version-prefixed [byte codec](encoding) that turns envelopes into
//!   the opaque serialized form stored and transported everywhere else.
//!
//! All signer-facing operations take an explicit [`SigningContext`] instead
//! of reading ambient process state, so one process can serve several
//! wallets and networks at once and tests need no global setup.

pub mod builder;
pub mod encoding;
pub mod error;
pub mod provider;

#[cfg(test)]
mod tests;

use bon::Builder;
use dissolve_derive::Dissolve;
use url::Url;

use multisig_coordinator_domain::{account::SignerKey, network::Network};

/// The explicit context a signature request is made under.
///
/// Carried alongside every wallet interaction so the wallet can verify it is
/// signing for the expected key, against the expected network, through the
/// expected endpoint.
#[derive(Debug, Clone, Builder, Dissolve)]
pub struct SigningContext {
    /// The key the wallet is expected to sign with.
    wallet_address: SignerKey,

    /// The ledger network the envelope targets.
    network: Network,

    /// The RPC endpoint serving that network.
    rpc_endpoint: Url,
}

impl SigningContext {
    /// Returns the key the wallet is expected to sign with.
    pub fn wallet_address(&self) -> &SignerKey {
        &self.wallet_address
    }

    /// Returns the ledger network the envelope targets.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Returns the RPC endpoint serving the network.
    pub fn rpc_endpoint(&self) -> &Url {
        &self.rpc_endpoint
    }
}
