//! Sales watcher orchestration and event loop.
//!
//! Follows ERC-721 transfers of the monitored contracts, analyzes the
//! transactions they occur in and announces the marketplace sales.

use std::{pin::pin, time::Duration};

use alloy::{
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::client::RpcClient,
    transports::layers::RetryBackoffLayer,
};
use futures::StreamExt;
use itertools::Itertools;
use nft_sales::{
    Network,
    analyzer::{Outcome, TransactionAnalyzer},
    error::WatchError,
    notify::{self, Notifier},
    stream::{self, ObservedTransfer},
    types::StateInstant,
};
use tracing::{debug, error, info};
use url::Url;

use crate::error::Result;

/// Polling and announcement parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchConfig {
    pub from_block: Option<u64>,
    pub poll_interval: Duration,
    pub receipt_attempts: usize,
    pub receipt_retry_delay: Duration,
    pub respect_thresholds: bool,
}

/// Marketplace sales watcher.
#[derive(Debug)]
pub struct SalesWatcher<N> {
    provider: DynProvider,
    analyzer: TransactionAnalyzer,
    assets: Vec<Address>,
    collection_name: String,
    notifier: N,
    config: WatchConfig,
}

impl<N: Notifier> SalesWatcher<N> {
    /// Create a new sales watcher.
    pub fn new(
        node_url: Url,
        network: Network,
        assets: Vec<Address>,
        collection_name: String,
        notifier: N,
        config: WatchConfig,
    ) -> Self {
        info!(
            chain_id = network.chain_id(),
            markets = network.markets().len(),
            assets = ?assets,
            %collection_name,
            respect_thresholds = config.respect_thresholds,
            "Initializing Sales Watcher"
        );

        let client = RpcClient::builder()
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .http(node_url);
        client.set_poll_interval(config.poll_interval);
        let provider = DynProvider::new(ProviderBuilder::new().connect_client(client));

        Self {
            provider,
            analyzer: TransactionAnalyzer::new(network),
            assets,
            collection_name,
            notifier,
            config,
        }
    }

    /// Run the watcher's main event loop.
    pub async fn run(&self) -> Result<()> {
        let mut from_block = match self.config.from_block {
            Some(block) => block,
            None => {
                self.provider
                    .get_block_number()
                    .await
                    .map_err(WatchError::from)?
                    + 1
            }
        };

        loop {
            info!(from_block, "Starting transfer stream");

            let mut transfers = pin!(stream::transfers(
                self.assets.clone(),
                self.provider.clone(),
                StateInstant::new(from_block, 0),
                tokio::time::sleep,
            ));

            loop {
                let Some(block) = transfers.next().await else {
                    error!("Transfer stream closed unexpectedly, restarting...");
                    break;
                };

                let block = match block {
                    Ok(block) => block,
                    Err(err) => {
                        error!(%err, "Error in transfer stream, will auto-restart");
                        break;
                    }
                };

                // One transaction per token transferred in it
                for transfer in block.transfers().iter().unique_by(|t| t.tx_hash()) {
                    self.process(transfer).await;
                }
                from_block = block.instant().block_number() + 1;
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Analyze the transaction of the transfer and announce the sale, if any.
    async fn process(&self, transfer: &ObservedTransfer) {
        let tx_hash = transfer.tx_hash();
        let receipt = match stream::fetch_receipt(
            &self.provider,
            tx_hash,
            self.config.receipt_attempts,
            self.config.receipt_retry_delay,
            tokio::time::sleep,
        )
        .await
        {
            Ok(receipt) => receipt,
            Err(err) => {
                error!(%tx_hash, %err, "Failed to fetch receipt");
                return;
            }
        };

        let summary = match self.analyzer.analyze(&receipt, transfer.asset()) {
            Outcome::Summarized(summary) => summary,
            Outcome::Skipped(reason) => {
                debug!(%tx_hash, ?reason, "Transaction skipped");
                return;
            }
            // Reported by the analyzer
            Outcome::Failed(_) => return,
        };

        if self.config.respect_thresholds && summary.is_below_threshold() {
            info!(
                %tx_hash,
                price = %summary.price().exact(),
                threshold = %summary.price().currency().dust_threshold(),
                currency = summary.price().currency().name(),
                "Sale below currency threshold, not announced"
            );
            return;
        }

        let message = notify::format_sale(
            &summary,
            &self.collection_name,
            self.analyzer.network().explorer_url(),
        );
        if let Err(err) = self.notifier.notify(&summary, &message).await {
            error!(%tx_hash, %err, "Failed to announce sale");
        }
    }
}
