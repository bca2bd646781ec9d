//! Chain polling plumbing feeding the analyzer.

use std::time::Duration;

use alloy::{
    primitives::{Address, TxHash},
    providers::Provider,
    rpc::types::Filter,
    sol_types::SolEvent,
};
use futures::{Stream, stream};
use tracing::{debug, warn};

use crate::{
    abi::erc721,
    error::WatchError,
    types::{SaleReceipt, StateInstant, TokenId},
};

/// ERC-721 transfer of one of the monitored assets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObservedTransfer {
    tx_hash: TxHash,
    log_index: u64,
    asset: Address,
    token_id: TokenId,
}

impl ObservedTransfer {
    pub fn new(tx_hash: TxHash, log_index: u64, asset: Address, token_id: TokenId) -> Self {
        Self {
            tx_hash,
            log_index,
            asset,
            token_id,
        }
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn log_index(&self) -> u64 {
        self.log_index
    }

    /// ERC-721 contract that emitted the transfer.
    pub fn asset(&self) -> Address {
        self.asset
    }

    pub fn token_id(&self) -> TokenId {
        self.token_id
    }
}

/// Transfers observed in a single block, in log order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTransfers {
    instant: StateInstant,
    transfers: Vec<ObservedTransfer>,
}

impl BlockTransfers {
    pub fn new(instant: StateInstant, transfers: Vec<ObservedTransfer>) -> Self {
        Self { instant, transfers }
    }

    pub fn instant(&self) -> StateInstant {
        self.instant
    }

    pub fn transfers(&self) -> &[ObservedTransfer] {
        &self.transfers
    }
}

/// Returns stream of ERC-721 transfers of the given assets, batched per
/// block, starting from the specified block.
///
/// Polls logs via the given [`Provider`] to produce strictly continuous
/// block sequence, with [`Provider`]-configured interval.
///
/// It is recommended to setup provider with
/// [`alloy::transports::layers::RetryBackoffLayer`].
///
/// Every transferred token produces its own transfer, so a transaction
/// selling several tokens appears multiple times.
pub fn transfers<P, S, SFut>(
    assets: Vec<Address>,
    provider: P,
    from: StateInstant,
    sleep: S,
) -> impl Stream<Item = Result<BlockTransfers, WatchError>>
where
    P: Provider,
    S: Fn(Duration) -> SFut + Copy,
    SFut: Future<Output = ()>,
{
    let filter = Filter::new()
        .address(assets)
        .event_signature(erc721::Transfer::SIGNATURE_HASH);

    stream::unfold(
        (provider, filter, from.block_number()),
        move |(provider, filter, mut block_num)| async move {
            loop {
                let block_filter = filter.clone().from_block(block_num).to_block(block_num);
                // Some RPC providers produce empty response instead of error in case
                // the block in the filter does not exist yet, so checking against
                // the tip of the chain
                let result = futures::try_join!(
                    provider.get_block_number(),
                    provider.get_logs(&block_filter)
                )
                .map_err(WatchError::from)
                .and_then(|(head_block_num, logs)| {
                    if head_block_num < block_num {
                        return Err(WatchError::InvalidRequest(
                            "block is not available yet".to_string(),
                        ));
                    }
                    let block_ts = logs.first().and_then(|l| l.block_timestamp);
                    let transfers = logs
                        .iter()
                        .filter_map(|log| match erc721::Transfer::decode_log(&log.inner) {
                            Ok(transfer) => Some(ObservedTransfer::new(
                                log.transaction_hash.unwrap_or_default(),
                                log.log_index.unwrap_or_default(),
                                transfer.address,
                                transfer.data.tokenId,
                            )),
                            Err(err) => {
                                // ERC-20 transfers share the topic
                                warn!(address = %log.inner.address, %err, "Skipping non ERC-721 transfer");
                                None
                            }
                        })
                        .collect();
                    Ok(BlockTransfers::new(
                        StateInstant::new(block_num, block_ts.unwrap_or_default()),
                        transfers,
                    ))
                });
                if result.is_ok() {
                    block_num += 1;
                    return Some((result, (provider, filter, block_num)));
                }
                if matches!(result, Err(WatchError::InvalidRequest(_))) {
                    // Block is not available yet
                    sleep(provider.client().poll_interval()).await;
                    continue;
                }
                return Some((result, (provider, filter, block_num)));
            }
        },
    )
}

/// Fetches the receipt of the transaction, retrying while the node does not
/// have it yet.
///
/// Gives up with [`WatchError::ReceiptUnavailable`] after `attempts` tries,
/// transport errors are returned immediately.
pub async fn fetch_receipt<P, S, SFut>(
    provider: &P,
    tx_hash: TxHash,
    attempts: usize,
    delay: Duration,
    sleep: S,
) -> Result<SaleReceipt, WatchError>
where
    P: Provider,
    S: Fn(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    for attempt in 1..=attempts {
        if let Some(receipt) = provider.get_transaction_receipt(tx_hash).await? {
            return Ok(SaleReceipt::from(&receipt));
        }
        debug!(%tx_hash, attempt, "Receipt not available yet");
        if attempt < attempts {
            sleep(delay).await;
        }
    }
    Err(WatchError::ReceiptUnavailable(tx_hash, attempts))
}
