//! NFT marketplace sale decoding SDK.
//!
//! # Overview
//!
//! Turns a finalized transaction receipt into a normalized sale summary:
//! which ERC-721 assets changed hands, on which marketplace, and for how much.
//!
//! Use [`analyzer::TransactionAnalyzer`] to process receipts. It classifies
//! receipt logs ([`classify`]), decodes the marketplace sale event against the
//! market's ABI schema ([`decode`]) and sums the settlement into a single price
//! in exact minor units ([`aggregate`]).
//!
//! [`stream::transfers`] and [`stream::fetch_receipt`] provide the polling
//! plumbing to feed the analyzer from a node, [`notify`] formats summaries into
//! human-readable messages.
//!
//! See `./tests` for examples.
//!
//! # Limitations/follow-ups
//!
//! * Orders settled in more than one currency are summed in the currency of the
//!   first payment leg only, the remaining currencies are reported via
//!   [`types::SaleWarning::MixedCurrencies`].
//!
//! * Only ERC-721 transfers are recognised as sold assets.
//!
//! # Testing
//!
//! [`testing`] module provides receipt and log builders encoding real
//! marketplace events.

pub mod abi;
pub mod aggregate;
pub mod analyzer;
pub mod classify;
pub mod decode;
pub mod error;
pub mod notify;
pub mod num;
pub mod registry;
pub mod stream;
pub mod testing;
pub mod types;

use std::{path::Path, sync::Arc};

use crate::{
    error::RegistryError,
    registry::{CurrencyRegistry, MarketRegistry},
};

#[derive(Clone, Debug)]
/// Network the monitored assets are traded on, along with the
/// currencies and marketplaces known on it.
pub struct Network {
    chain_id: u64,
    explorer_url: String,
    currencies: Arc<CurrencyRegistry>,
    markets: Arc<MarketRegistry>,
}

impl Network {
    pub fn mainnet() -> Self {
        Self {
            chain_id: 1,
            explorer_url: "https://etherscan.io".to_string(),
            currencies: Arc::new(CurrencyRegistry::mainnet()),
            markets: Arc::new(MarketRegistry::mainnet()),
        }
    }

    pub fn goerli() -> Self {
        Self {
            chain_id: 5,
            explorer_url: "https://goerli.etherscan.io".to_string(),
            currencies: Arc::new(CurrencyRegistry::goerli()),
            markets: Arc::new(MarketRegistry::goerli()),
        }
    }

    pub fn custom(
        chain_id: u64,
        explorer_url: impl Into<String>,
        currencies: CurrencyRegistry,
        markets: MarketRegistry,
    ) -> Self {
        Self {
            chain_id,
            explorer_url: explorer_url.into(),
            currencies: Arc::new(currencies),
            markets: Arc::new(markets),
        }
    }

    /// Extends built-in registries with currencies and markets from the
    /// JSON registry file, entries from the file take precedence.
    pub fn with_registry_file(self, path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let file = registry::RegistryFile::load(path)?;
        let mut currencies = (*self.currencies).clone();
        let mut markets = (*self.markets).clone();
        file.merge_into(&mut currencies, &mut markets)?;
        Ok(Self {
            currencies: Arc::new(currencies),
            markets: Arc::new(markets),
            ..self
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn explorer_url(&self) -> &str {
        &self.explorer_url
    }

    pub fn currencies(&self) -> &CurrencyRegistry {
        &self.currencies
    }

    pub fn markets(&self) -> &MarketRegistry {
        &self.markets
    }
}
