//! Configuration management for the coordinator engine.
//!
//! This module provides configuration loading from both the compiled-in base
//! configuration file and environment variables. Environment variables
//! override the base configuration and use the prefix `MULTISIG_`.

use core::time::Duration;

use config::{ConfigError, Environment, File, FileFormat};
use multisig_coordinator_domain::network::Network;
use serde::Deserialize;
use url::Url;

/// Loads the engine configuration from base config and environment variables.
///
/// Environment variables use double underscores `__` to denote nested keys;
/// the engine surface is currently flat, so `MULTISIG_BASE_FEE` corresponds
/// to `base_fee`.
///
/// # Errors
///
/// If the configuration could not be loaded or parsed
pub fn get_configuration() -> Result<CoordinatorConfig, ConfigError> {
    load_with(
        Environment::with_prefix(CoordinatorConfig::CONFIG_ENV_PREFIX)
            .prefix_separator("_")
            .separator("__"),
    )
}

fn load_with(environment: Environment) -> Result<CoordinatorConfig, ConfigError> {
    config::Config::builder()
        .add_source(File::from_str(include_str!("base_config.ron"), FileFormat::Ron))
        .add_source(environment)
        .build()?
        .try_deserialize()
}

/// Root configuration structure containing all engine settings.
#[derive(Deserialize)]
pub struct CoordinatorConfig {
    /// The ledger network every operation targets
    pub network: Network,

    /// The RPC endpoint serving that network
    pub rpc_endpoint: Url,

    /// Flat fee attached to every envelope at build time, in native units
    pub base_fee: u64,

    /// How long a freshly built envelope stays valid on chain
    #[serde(with = "humantime_serde")]
    pub validity_window: Duration,

    /// How often a pending transaction is re-queried during execution
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// How long execution keeps polling before giving up
    #[serde(with = "humantime_serde")]
    pub poll_window: Duration,
}

impl CoordinatorConfig {
    const CONFIG_ENV_PREFIX: &str = "MULTISIG";
}
