use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use fastnum::UD256;

use super::TokenId;
use crate::{
    num,
    registry::{CurrencyDefinition, MarketDefinition},
};

/// Sale total in a single currency.
///
/// Kept in exact minor units, decimal values are derived on access.
#[derive(Clone, Debug, PartialEq)]
pub struct SalePrice {
    minor_units: U256,
    currency: CurrencyDefinition,
}

impl SalePrice {
    pub fn new(minor_units: U256, currency: CurrencyDefinition) -> Self {
        Self {
            minor_units,
            currency,
        }
    }

    pub fn zero(currency: CurrencyDefinition) -> Self {
        Self::new(U256::ZERO, currency)
    }

    /// Total in the smallest currency units (e.g. wei).
    pub fn minor_units(&self) -> U256 {
        self.minor_units
    }

    /// Unrounded decimal total.
    pub fn exact(&self) -> UD256 {
        self.converter().from_unsigned(self.minor_units)
    }

    /// Decimal total rounded for display.
    pub fn display(&self) -> UD256 {
        self.converter().to_display(self.minor_units)
    }

    pub fn currency(&self) -> &CurrencyDefinition {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.minor_units.is_zero()
    }

    /// Whether the exact total is strictly below the given decimal amount.
    pub fn is_below(&self, amount: UD256) -> bool {
        self.minor_units < self.converter().to_unsigned(amount)
    }

    fn converter(&self) -> num::Converter {
        num::Converter::new(self.currency.decimals())
    }
}

/// Non-fatal issue found while pricing a sale.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SaleWarning {
    /// Neither side of the order references the asset contract,
    /// no price could be determined.
    #[error("neither offer nor consideration references the asset contract")]
    AmbiguousOrderSide,

    /// Payment leg in a token absent from the currency registry,
    /// excluded from the total.
    #[error("unknown currency {token}, leg excluded")]
    UnknownCurrency { token: Address },

    /// Payment legs in more than one currency. Only the first currency is
    /// summed, these are left out (zero address is the native currency).
    #[error("mixed currencies, not summed: {ignored:?}")]
    MixedCurrencies { ignored: Vec<Address> },

    /// Payments in the summed currency exceed 256 bits,
    /// no price could be determined.
    #[error("total in {token} overflows")]
    AmountOverflow { token: Address },
}

/// Normalized summary of a marketplace sale transaction.
///
/// Never produced for transactions without ERC-721 transfers,
/// so `token_ids` is never empty.
#[derive(Clone, derive_more::Debug)]
pub struct SaleSummary {
    pub(crate) tx_hash: TxHash,
    #[debug(skip)]
    pub(crate) market: Arc<MarketDefinition>,
    pub(crate) asset: Address,
    pub(crate) token_ids: Vec<TokenId>,
    pub(crate) price: SalePrice,
    pub(crate) warnings: Vec<SaleWarning>,
    pub(crate) price_determined: bool,
}

impl SaleSummary {
    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn market(&self) -> &MarketDefinition {
        &self.market
    }

    /// ERC-721 contract under observation.
    pub fn asset(&self) -> Address {
        self.asset
    }

    /// Transferred tokens, deduplicated in order of first appearance.
    pub fn token_ids(&self) -> &[TokenId] {
        &self.token_ids
    }

    pub fn first_token_id(&self) -> TokenId {
        self.token_ids.first().copied().unwrap_or_default()
    }

    /// Whether more than one asset was sold in the transaction.
    pub fn is_bundle(&self) -> bool {
        self.token_ids.len() > 1
    }

    pub fn price(&self) -> &SalePrice {
        &self.price
    }

    pub fn warnings(&self) -> &[SaleWarning] {
        &self.warnings
    }

    /// `false` if no payment could be attributed to the asset, in which
    /// case the zero price must not be reported as a sale value.
    ///
    /// A sweep stays determined when only some of its orders are ambiguous,
    /// [`Self::warnings`] reports those.
    pub fn price_determined(&self) -> bool {
        self.price_determined
    }

    /// Whether the exact total is below the currency's dust threshold.
    pub fn is_below_threshold(&self) -> bool {
        self.price.is_below(self.price.currency().dust_threshold())
    }
}
