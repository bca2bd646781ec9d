//! Receipt log classification.
//!
//! Buckets every log of a settlement receipt into NFT transfers, currency
//! transfers and marketplace sale events. Classification is a pure function of
//! the logs, the settlement recipient and the registries.

use alloy::{
    primitives::{Address, Log},
    sol_types::SolEvent,
};
use itertools::Itertools;

use crate::{
    abi,
    registry::{CurrencyDefinition, CurrencyRegistry, MarketDefinition, SaleEventSchema},
    types::TokenId,
};

/// Role of a single receipt log.
#[derive(Clone, Debug, PartialEq)]
pub enum ClassifiedLog<'a> {
    /// ERC-721 transfer of the given token.
    NftTransfer { token_id: TokenId },

    /// Transfer emitted by a known currency contract.
    CurrencyTransfer { currency: &'a CurrencyDefinition },

    /// Marketplace sale event emitted by the settlement recipient.
    SaleEvent { schema: &'a SaleEventSchema },

    Ignored,
}

/// Sale event log along with the schema it matched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SaleLog<'a> {
    pub log: &'a Log,
    pub schema: &'a SaleEventSchema,
}

/// Result of classifying all logs of one receipt.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification<'a> {
    logs: Vec<ClassifiedLog<'a>>,
    token_ids: Vec<TokenId>,
    sale_logs: Vec<SaleLog<'a>>,
    currencies: Vec<&'a CurrencyDefinition>,
}

impl<'a> Classification<'a> {
    /// Per-log classification, in receipt order.
    pub fn logs(&self) -> &[ClassifiedLog<'a>] {
        &self.logs
    }

    /// Transferred tokens, deduplicated in order of first appearance.
    pub fn token_ids(&self) -> &[TokenId] {
        &self.token_ids
    }

    pub fn sale_logs(&self) -> &[SaleLog<'a>] {
        &self.sale_logs
    }

    /// Currencies transferred in the receipt, in order of appearance.
    pub fn currencies(&self) -> &[&'a CurrencyDefinition] {
        &self.currencies
    }

    /// Currency of the last observed currency transfer.
    pub fn last_currency(&self) -> Option<&'a CurrencyDefinition> {
        self.currencies.last().copied()
    }
}

/// Classifies receipt logs of a transaction sent to the given market.
#[derive(Clone, Copy, Debug)]
pub struct LogClassifier<'a> {
    currencies: &'a CurrencyRegistry,
    market: &'a MarketDefinition,
}

impl<'a> LogClassifier<'a> {
    pub fn new(currencies: &'a CurrencyRegistry, market: &'a MarketDefinition) -> Self {
        Self { currencies, market }
    }

    /// Classifies a single log, first matching rule wins:
    ///
    /// 1. no data and ERC-721 `Transfer` topic with the token ID in the fourth topic,
    /// 2. emitted by a known currency contract,
    /// 3. emitted by the settlement recipient with one of the market's sale event topics.
    pub fn classify(&self, log: &Log) -> ClassifiedLog<'a> {
        let topics = log.topics();
        let Some(topic0) = topics.first() else {
            return ClassifiedLog::Ignored;
        };

        if log.data.data.is_empty() && *topic0 == abi::erc721::Transfer::SIGNATURE_HASH {
            return match topics.get(3) {
                Some(token_id) => ClassifiedLog::NftTransfer {
                    token_id: TokenId::from_be_bytes(token_id.0),
                },
                None => ClassifiedLog::Ignored,
            };
        }

        if let Some(currency) = self.token_currency(&log.address) {
            return ClassifiedLog::CurrencyTransfer { currency };
        }

        if log.address == self.market.recipient() {
            if let Some(schema) = self.market.sale_event(topic0) {
                return ClassifiedLog::SaleEvent { schema };
            }
        }

        ClassifiedLog::Ignored
    }

    /// Classifies all logs of a receipt in order.
    pub fn classify_all(&self, logs: &'a [Log]) -> Classification<'a> {
        let classified = logs.iter().map(|log| self.classify(log)).collect_vec();

        let token_ids = classified
            .iter()
            .filter_map(|c| match c {
                ClassifiedLog::NftTransfer { token_id } => Some(*token_id),
                _ => None,
            })
            .unique()
            .collect();

        let sale_logs = logs
            .iter()
            .zip(&classified)
            .filter_map(|(log, c)| match c {
                ClassifiedLog::SaleEvent { schema } => Some(SaleLog { log, schema }),
                _ => None,
            })
            .collect();

        let currencies = classified
            .iter()
            .filter_map(|c| match c {
                ClassifiedLog::CurrencyTransfer { currency } => Some(*currency),
                _ => None,
            })
            .collect();

        Classification {
            logs: classified,
            token_ids,
            sale_logs,
            currencies,
        }
    }

    fn token_currency(&self, emitter: &Address) -> Option<&'a CurrencyDefinition> {
        if self.currencies.is_token(emitter) {
            self.currencies.lookup(emitter)
        } else {
            None
        }
    }
}
