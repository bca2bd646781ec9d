use std::{collections::HashSet, fs, path::Path};

use alloy::{
    json_abi::{Event, EventParam},
    primitives::Address,
};
use fastnum::{UD256, decimal::Context};

use super::{
    CurrencyDefinition, CurrencyRegistry, DecoderVariant, MarketDefinition, MarketRegistry,
    SaleEventSchema,
};
use crate::error::RegistryError;

/// Currency and market entries loaded from a JSON registry file.
///
/// ```json
/// {
///   "currencies": [
///     { "address": "0x...", "name": "WETH", "decimals": 18, "threshold": "0.5" }
///   ],
///   "markets": [
///     {
///       "address": "0x...",
///       "name": "LooksRare",
///       "item_url_template": "https://looksrare.org/collections/{contract}/{token_id}",
///       "sale_events": [
///         {
///           "name": "TakerBid",
///           "inputs": [ { "name": "price", "type": "uint256", "indexed": false } ],
///           "decoder": { "variant": "FixedPriceField", "price": "price" }
///         }
///       ]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Default, serde::Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    currencies: Vec<CurrencyEntry>,

    #[serde(default)]
    markets: Vec<MarketEntry>,
}

#[derive(Debug, serde::Deserialize)]
struct CurrencyEntry {
    /// Token contract, omitted for the native currency.
    #[serde(default)]
    address: Option<Address>,
    name: String,
    decimals: u8,
    #[serde(default)]
    threshold: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct MarketEntry {
    address: Address,
    name: String,
    item_url_template: String,
    sale_events: Vec<SaleEventEntry>,
}

#[derive(Debug, serde::Deserialize)]
struct SaleEventEntry {
    name: String,
    inputs: Vec<EventParam>,
    decoder: DecoderVariant,
}

impl RegistryFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| RegistryError::Io(path.to_path_buf(), e))?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Adds file entries to the registries, replacing existing entries
    /// with the same address.
    pub fn merge_into(
        self,
        currencies: &mut CurrencyRegistry,
        markets: &mut MarketRegistry,
    ) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        for entry in self.currencies {
            let key = entry.address.unwrap_or(Address::ZERO);
            if !seen.insert(key) {
                return Err(RegistryError::Duplicate(key));
            }
            currencies.insert(entry.into_definition()?);
        }

        let mut seen = HashSet::new();
        for entry in self.markets {
            if !seen.insert(entry.address) {
                return Err(RegistryError::Duplicate(entry.address));
            }
            if entry.sale_events.is_empty() {
                return Err(RegistryError::NoSaleEvents(entry.address));
            }
            markets.insert(MarketDefinition::new(
                entry.address,
                entry.name,
                entry.item_url_template,
                entry
                    .sale_events
                    .into_iter()
                    .map(|e| {
                        SaleEventSchema::new(
                            Event {
                                name: e.name,
                                inputs: e.inputs,
                                anonymous: false,
                            },
                            e.decoder,
                        )
                    })
                    .collect(),
            ));
        }
        Ok(())
    }
}

impl CurrencyEntry {
    fn into_definition(self) -> Result<CurrencyDefinition, RegistryError> {
        let threshold = match &self.threshold {
            Some(raw) => UD256::from_str(raw, Context::default()).map_err(|_| {
                RegistryError::InvalidThreshold(self.address.unwrap_or(Address::ZERO), raw.clone())
            })?,
            None => UD256::ZERO,
        };
        Ok(match self.address {
            Some(address) => CurrencyDefinition::token(address, self.name, self.decimals, threshold),
            None => CurrencyDefinition::native(self.name, threshold).with_decimals(self.decimals),
        })
    }
}
