//! Network selection for ledger-facing operations.

use strum::{Display, EnumString, IntoStaticStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The ledger network an operation targets.
///
/// The network travels inside the signing context handed to wallet
/// collaborators, so a signature request is always bound to one network and
/// never relies on ambient process state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Network {
    /// The production network.
    Mainnet,
    /// The public test network.
    Testnet,
    /// A locally hosted network, typically a development node.
    Local,
}

impl Default for Network {
    /// Defaults to [`Network::Testnet`], the safe choice for development.
    fn default() -> Self {
        Self::Testnet
    }
}
