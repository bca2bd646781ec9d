//! Error types for the sales watcher.

use nft_sales::error::WatchError;

use crate::config::ConfigError;

/// Main error type for the sales watcher.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment configuration error: {0}")]
    EnvConfig(#[from] envy::Error),

    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(#[from] url::ParseError),

    #[error("Node error: {0}")]
    Watch(#[from] WatchError),
}

pub type Result<T> = std::result::Result<T, Error>;
