//! Transaction analysis.
//!
//! [`TransactionAnalyzer`] drives a receipt through classification, decoding
//! and price aggregation:
//!
//! ```text
//! Idle -> Classifying -> Skipped
//!                     -> Decoding -> Failed
//!                                 -> Summarized
//! ```
//!
//! The only state kept between receipts is the [`IdempotencyGuard`]
//! suppressing duplicate deliveries of the same transaction.

use std::sync::{Mutex, PoisonError};

use alloy::primitives::{Address, TxHash};
use tracing::{debug, error, info, warn};

use crate::{
    Network,
    aggregate::{AggregatedPrice, PriceAggregator},
    classify::LogClassifier,
    decode,
    error::DecodeError,
    types::{SaleReceipt, SaleSummary},
};

/// Suppresses repeated processing of the same transaction.
pub trait IdempotencyGuard {
    /// Marks the transaction as processed.
    ///
    /// Returns `false` if it was already marked and must be skipped.
    /// Check and mark happen atomically.
    fn check_and_mark(&self, tx_hash: TxHash) -> bool;
}

/// Remembers the most recently processed transaction only, so consecutive
/// deliveries of one transaction (one per transferred token) are processed
/// once.
#[derive(Debug, Default)]
pub struct LastTransactionGuard {
    last: Mutex<Option<TxHash>>,
}

impl IdempotencyGuard for LastTransactionGuard {
    fn check_and_mark(&self, tx_hash: TxHash) -> bool {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if *last == Some(tx_hash) {
            return false;
        }
        *last = Some(tx_hash);
        true
    }
}

/// Reason a receipt did not produce a summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Transaction was processed already.
    Duplicate,

    /// Transaction recipient is not a known marketplace.
    NotMarketplace { recipient: Option<Address> },

    /// Marketplace transaction without ERC-721 transfers.
    NoTokens,

    /// Marketplace transaction without a recognised sale event.
    NoSaleEvent,
}

/// Result of analyzing a single receipt.
#[derive(Debug)]
pub enum Outcome {
    Skipped(SkipReason),

    /// Marketplace transaction whose sale event could not be decoded.
    Failed(DecodeError),

    Summarized(SaleSummary),
}

impl Outcome {
    pub fn summary(&self) -> Option<&SaleSummary> {
        match self {
            Self::Summarized(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn into_summary(self) -> Option<SaleSummary> {
        match self {
            Self::Summarized(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Skipped(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Turns receipts of marketplace settlements into [`SaleSummary`]s.
///
/// Analysis itself performs no I/O; receipts are supplied by the caller and
/// the outcome is handed back to it.
#[derive(Debug)]
pub struct TransactionAnalyzer<G = LastTransactionGuard> {
    network: Network,
    guard: G,
}

impl TransactionAnalyzer {
    pub fn new(network: Network) -> Self {
        Self::with_guard(network, LastTransactionGuard::default())
    }
}

impl<G: IdempotencyGuard> TransactionAnalyzer<G> {
    pub fn with_guard(network: Network, guard: G) -> Self {
        Self { network, guard }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Analyzes the receipt of a transaction transferring tokens of `asset`,
    /// skipping transactions already marked by the guard.
    ///
    /// The transaction is marked before it is analyzed, so a failed analysis
    /// is not retried on redelivery.
    pub fn analyze(&self, receipt: &SaleReceipt, asset: Address) -> Outcome {
        let tx_hash = receipt.transaction_hash();
        if !self.guard.check_and_mark(tx_hash) {
            debug!(%tx_hash, "Transaction already processed, skipping");
            return Outcome::Skipped(SkipReason::Duplicate);
        }
        self.evaluate(receipt, asset)
    }

    /// Analyzes the receipt without consulting the guard.
    pub fn evaluate(&self, receipt: &SaleReceipt, asset: Address) -> Outcome {
        let tx_hash = receipt.transaction_hash();
        let Some(market) = receipt
            .to()
            .and_then(|recipient| self.network.markets().lookup(&recipient))
        else {
            debug!(%tx_hash, recipient = ?receipt.to(), "Not a marketplace transaction");
            return Outcome::Skipped(SkipReason::NotMarketplace {
                recipient: receipt.to(),
            });
        };

        debug!(%tx_hash, market = market.name(), "Classifying receipt logs");
        let classification =
            LogClassifier::new(self.network.currencies(), market).classify_all(receipt.logs());

        if classification.token_ids().is_empty() {
            info!(%tx_hash, market = market.name(), "No ERC-721 transfers, skipping");
            return Outcome::Skipped(SkipReason::NoTokens);
        }
        if classification.sale_logs().is_empty() {
            info!(%tx_hash, market = market.name(), "No sale event, skipping");
            return Outcome::Skipped(SkipReason::NoSaleEvent);
        }

        debug!(
            %tx_hash,
            sale_events = classification.sale_logs().len(),
            "Decoding sale events"
        );
        let records = match classification
            .sale_logs()
            .iter()
            .map(|sale| decode::decode_sale(market, sale.schema, sale.log))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(records) => records,
            Err(err) => {
                error!(%tx_hash, log = ?err.log, %err, "Failed to decode sale event");
                return Outcome::Failed(err);
            }
        };

        let AggregatedPrice {
            price,
            warnings,
            determined,
        } = PriceAggregator::new(self.network.currencies())
            .aggregate(asset, &records, classification.last_currency());

        let summary = SaleSummary {
            tx_hash,
            market: market.clone(),
            asset,
            token_ids: classification.token_ids().to_vec(),
            price,
            warnings,
            price_determined: determined,
        };

        if summary.price_determined() {
            info!(
                %tx_hash,
                market = summary.market().name(),
                tokens = summary.token_ids().len(),
                price = %summary.price().display(),
                currency = summary.price().currency().name(),
                "Sale summarized"
            );
        } else {
            warn!(
                %tx_hash,
                market = summary.market().name(),
                tokens = summary.token_ids().len(),
                "Sale summarized without a price"
            );
        }
        Outcome::Summarized(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy::primitives::U256;
    use fastnum::udec256;

    use super::*;
    use crate::{testing, types::SaleWarning};

    #[test]
    fn test_guard_rejects_consecutive_duplicate() {
        let guard = LastTransactionGuard::default();
        assert!(guard.check_and_mark(testing::tx_hash(1)));
        assert!(!guard.check_and_mark(testing::tx_hash(1)));
        assert!(guard.check_and_mark(testing::tx_hash(2)));
        // Only the last transaction is remembered
        assert!(guard.check_and_mark(testing::tx_hash(1)));
    }

    #[test]
    fn test_guard_is_shared_across_threads() {
        let guard = Arc::new(LastTransactionGuard::default());
        let handles = (0..8)
            .map(|_| {
                let guard = guard.clone();
                std::thread::spawn(move || guard.check_and_mark(testing::tx_hash(7)))
            })
            .collect::<Vec<_>>();

        let marked = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|marked| *marked)
            .count();
        assert_eq!(marked, 1);
    }

    #[test]
    fn test_looksrare_sale() {
        let analyzer = TransactionAnalyzer::new(Network::mainnet());
        let outcome = analyzer.analyze(&testing::looksrare_sale_receipt(), testing::ASSET);

        let summary = outcome.into_summary().unwrap();
        assert_eq!(summary.market().name(), "LooksRare 👀💎");
        assert_eq!(summary.token_ids(), &[U256::from(42)]);
        assert!(summary.price().currency().is_native());
        assert_eq!(summary.price().display(), udec256!(2.50));
        assert!(summary.warnings().is_empty());
    }

    #[test]
    fn test_duplicate_delivery_skipped() {
        let analyzer = TransactionAnalyzer::new(Network::mainnet());
        let receipt = testing::seaport_sale_receipt();

        assert!(analyzer.analyze(&receipt, testing::ASSET).summary().is_some());
        assert_eq!(
            analyzer.analyze(&receipt, testing::ASSET).skip_reason(),
            Some(SkipReason::Duplicate)
        );
        // Evaluation ignores the guard
        assert!(analyzer.evaluate(&receipt, testing::ASSET).summary().is_some());
    }

    #[test]
    fn test_skip_reasons() {
        let analyzer = TransactionAnalyzer::new(Network::mainnet());

        let receipt = testing::ReceiptBuilder::new(testing::ASSET)
            .log(testing::nft_transfer(testing::ASSET, 1))
            .build();
        assert_eq!(
            analyzer.evaluate(&receipt, testing::ASSET).skip_reason(),
            Some(SkipReason::NotMarketplace {
                recipient: Some(testing::ASSET)
            })
        );

        let receipt = testing::ReceiptBuilder::new(testing::LOOKSRARE)
            .log(testing::looksrare_taker_bid(
                testing::LOOKSRARE,
                Address::ZERO,
                1,
                U256::from(1),
            ))
            .build();
        assert_eq!(
            analyzer.evaluate(&receipt, testing::ASSET).skip_reason(),
            Some(SkipReason::NoTokens)
        );

        let receipt = testing::ReceiptBuilder::new(testing::LOOKSRARE)
            .log(testing::nft_transfer(testing::ASSET, 1))
            .build();
        assert_eq!(
            analyzer.evaluate(&receipt, testing::ASSET).skip_reason(),
            Some(SkipReason::NoSaleEvent)
        );
    }

    #[test]
    fn test_ambiguous_sale_has_no_price() {
        let analyzer = TransactionAnalyzer::new(Network::mainnet());
        let receipt = testing::ReceiptBuilder::new(testing::SEAPORT)
            .log(testing::nft_transfer(testing::ASSET, 3))
            .log(testing::seaport_order_fulfilled(
                testing::SEAPORT,
                vec![testing::spent_nft(testing::OTHER_ASSET, 3)],
                vec![testing::received_currency(
                    Address::ZERO,
                    testing::ether(1),
                    testing::SELLER,
                )],
            ))
            .build();

        let summary = analyzer
            .evaluate(&receipt, testing::ASSET)
            .into_summary()
            .unwrap();
        assert!(!summary.price_determined());
        assert!(summary.price().is_zero());
        assert_eq!(summary.warnings(), &[SaleWarning::AmbiguousOrderSide]);
    }

    #[test]
    fn test_sweep_with_unrelated_order_keeps_price() {
        let analyzer = TransactionAnalyzer::new(Network::mainnet());
        let receipt = testing::ReceiptBuilder::new(testing::SEAPORT)
            .log(testing::nft_transfer(testing::ASSET, 1))
            .log(testing::seaport_order_fulfilled(
                testing::SEAPORT,
                vec![testing::spent_nft(testing::ASSET, 1)],
                vec![testing::received_currency(
                    Address::ZERO,
                    testing::ether(3),
                    testing::SELLER,
                )],
            ))
            .log(testing::seaport_order_fulfilled(
                testing::SEAPORT,
                vec![testing::spent_nft(testing::OTHER_ASSET, 9)],
                vec![testing::received_currency(
                    Address::ZERO,
                    testing::ether(1),
                    testing::SELLER,
                )],
            ))
            .build();

        let summary = analyzer
            .evaluate(&receipt, testing::ASSET)
            .into_summary()
            .unwrap();
        assert!(summary.price_determined());
        assert_eq!(summary.price().minor_units(), testing::ether(3));
        assert_eq!(summary.warnings(), &[SaleWarning::AmbiguousOrderSide]);
    }

    #[test]
    fn test_unknown_fixed_price_currency_has_no_price() {
        let analyzer = TransactionAnalyzer::new(Network::mainnet());
        let unknown = Address::repeat_byte(0x11);
        let receipt = testing::ReceiptBuilder::new(testing::LOOKSRARE)
            .log(testing::nft_transfer(testing::ASSET, 4))
            .log(testing::looksrare_taker_bid(
                testing::LOOKSRARE,
                unknown,
                4,
                U256::from(5_000_000),
            ))
            .build();

        let summary = analyzer
            .evaluate(&receipt, testing::ASSET)
            .into_summary()
            .unwrap();
        assert!(!summary.price_determined());
        assert!(summary.price().is_zero());
        assert_eq!(
            summary.warnings(),
            &[SaleWarning::UnknownCurrency { token: unknown }]
        );
    }
}
