//! Marketplace sales watcher.
//!
//! This binary follows ERC-721 transfers of the configured collections and
//! announces the ones settled through a known marketplace.

mod config;
mod error;
mod watcher;

use std::process::exit;

use clap::Parser;
use nft_sales::notify::LogNotifier;
use tracing::error;
use url::Url;

use config::{CliConfig, EnvConfig};
use error::Result;
use watcher::SalesWatcher;

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    // Parse CLI arguments
    let cli_config = CliConfig::parse();

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let watcher = match setup(&cli_config) {
        Ok(watcher) => watcher,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };

    if let Err(e) = watcher.run().await {
        error!(%e, "Sales watcher encountered an error, shutting down");
        exit(1);
    }
}

/// Builds the watcher from the environment and CLI configuration.
fn setup(cli_config: &CliConfig) -> Result<SalesWatcher<LogNotifier>> {
    let env_config = EnvConfig::from_env()?;
    let watch_config = cli_config.to_watch_config()?;
    let assets = env_config.contract_addresses()?;
    let network = env_config.network()?;
    let node_url = Url::parse(&env_config.node_rpc_url)?;

    Ok(SalesWatcher::new(
        node_url,
        network,
        assets,
        env_config.collection_name().to_string(),
        LogNotifier,
        watch_config,
    ))
}
