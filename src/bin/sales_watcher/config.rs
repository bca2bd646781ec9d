//! Configuration for the sales watcher.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): connection details, monitored contracts
//! - CLI arguments: polling and announcement parameters

use std::{path::PathBuf, time::Duration};

use alloy::primitives::Address;
use clap::Parser;
use nft_sales::{Network, error::RegistryError};

use crate::watcher::WatchConfig;

/// Environment configuration (connection details, monitored contracts).
#[derive(Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// RPC URL for the node
    pub node_rpc_url: String,

    /// ERC-721 contract addresses to monitor, comma-separated
    pub contract_addresses: String,

    /// Network the contracts are deployed on: `mainnet` (default) or `goerli`
    pub network: Option<String>,

    /// Optional JSON file with additional currencies and markets
    pub registry_file: Option<PathBuf>,

    /// Name the sold assets are announced with (default: "Token")
    pub collection_name: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Parse the monitored contract addresses.
    pub fn contract_addresses(&self) -> Result<Vec<Address>, ConfigError> {
        let addresses = self
            .contract_addresses
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse()
                    .map_err(|_| ConfigError::InvalidAddress(s.to_string()))
            })
            .collect::<Result<Vec<Address>, _>>()?;

        if addresses.is_empty() {
            return Err(ConfigError::NoContracts);
        }
        Ok(addresses)
    }

    /// Build the network configuration, extended with the registry file if set.
    pub fn network(&self) -> Result<Network, ConfigError> {
        let network = match self.network.as_deref().unwrap_or("mainnet") {
            "mainnet" => Network::mainnet(),
            "goerli" => Network::goerli(),
            other => return Err(ConfigError::UnknownNetwork(other.to_string())),
        };
        match &self.registry_file {
            Some(path) => Ok(network.with_registry_file(path)?),
            None => Ok(network),
        }
    }

    pub fn collection_name(&self) -> &str {
        self.collection_name.as_deref().unwrap_or("Token")
    }
}

/// CLI arguments for the sales watcher.
#[derive(Debug, Parser)]
#[command(name = "sales-watcher")]
#[command(about = "Announces marketplace sales of ERC-721 collections")]
pub struct CliConfig {
    /// Block to start watching from, defaults to the next block
    #[arg(long)]
    pub from_block: Option<u64>,

    /// Interval between polls for new blocks, in milliseconds
    #[arg(long, default_value = "2000")]
    pub poll_interval_ms: u64,

    /// Attempts to fetch a transaction receipt before giving up
    #[arg(long, default_value = "5")]
    pub receipt_attempts: usize,

    /// Delay between receipt fetch attempts, in milliseconds
    #[arg(long, default_value = "1000")]
    pub receipt_retry_delay_ms: u64,

    /// Do not announce sales below the currency's dust threshold
    #[arg(long)]
    pub respect_thresholds: bool,
}

impl CliConfig {
    /// Convert CLI config to the watcher parameters.
    pub fn to_watch_config(&self) -> Result<WatchConfig, ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.receipt_attempts == 0 {
            return Err(ConfigError::ZeroReceiptAttempts);
        }

        Ok(WatchConfig {
            from_block: self.from_block,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            receipt_attempts: self.receipt_attempts,
            receipt_retry_delay: Duration::from_millis(self.receipt_retry_delay_ms),
            respect_thresholds: self.respect_thresholds,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid contract address: {0}")]
    InvalidAddress(String),

    #[error("No contract addresses to monitor")]
    NoContracts,

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Registry file error: {0}")]
    Registry(#[from] RegistryError),

    #[error("poll_interval_ms cannot be zero")]
    ZeroPollInterval,

    #[error("receipt_attempts cannot be zero")]
    ZeroReceiptAttempts,
}
