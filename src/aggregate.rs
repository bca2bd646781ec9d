//! Price aggregation.
//!
//! Turns the decoded sale records of one transaction into a single total.
//! Every payment carries its own currency, amounts are summed as exact
//! integers per currency and converted to a decimal only when displayed.

use alloy::primitives::{Address, U256};
use itertools::Itertools;
use tracing::warn;

use crate::{
    decode::{DecodedSaleRecord, Leg},
    registry::{CurrencyDefinition, CurrencyRegistry},
    types::{SalePrice, SaleWarning},
};

/// Total price of a transaction along with the issues found computing it.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatedPrice {
    pub price: SalePrice,
    pub warnings: Vec<SaleWarning>,

    /// `false` if no sale record produced a payment for the asset, or the
    /// total could not be represented. `price` is zero then.
    pub determined: bool,
}

/// Single payment of a sale, in minor units of its currency.
#[derive(Clone, Copy, Debug)]
struct Payment<'a> {
    currency: &'a CurrencyDefinition,
    amount: U256,
}

/// Sums sale payments into a [`SalePrice`].
#[derive(Clone, Copy, Debug)]
pub struct PriceAggregator<'a> {
    currencies: &'a CurrencyRegistry,
}

impl<'a> PriceAggregator<'a> {
    pub fn new(currencies: &'a CurrencyRegistry) -> Self {
        Self { currencies }
    }

    /// Aggregates all sale records of a transaction selling tokens of `asset`.
    ///
    /// `observed_currency` is the currency of the last currency transfer in
    /// the receipt, used for fixed price records whose event does not name
    /// the payment token.
    pub fn aggregate(
        &self,
        asset: Address,
        records: &[DecodedSaleRecord],
        observed_currency: Option<&'a CurrencyDefinition>,
    ) -> AggregatedPrice {
        let mut warnings = Vec::new();
        let payments = records
            .iter()
            .flat_map(|record| self.payments(asset, record, observed_currency, &mut warnings))
            .collect_vec();

        let (price, determined) = self.total(payments, &mut warnings);
        AggregatedPrice {
            price,
            warnings,
            determined,
        }
    }

    fn payments(
        &self,
        asset: Address,
        record: &DecodedSaleRecord,
        observed_currency: Option<&'a CurrencyDefinition>,
        warnings: &mut Vec<SaleWarning>,
    ) -> Vec<Payment<'a>> {
        match record {
            DecodedSaleRecord::FixedPrice {
                price,
                currency: Some(token),
            } => self
                .known_currency(*token, warnings)
                .map(|currency| Payment {
                    currency,
                    amount: *price,
                })
                .into_iter()
                .collect(),
            DecodedSaleRecord::FixedPrice {
                price,
                currency: None,
            } => vec![Payment {
                currency: observed_currency.unwrap_or(self.currencies.native()),
                amount: *price,
            }],
            DecodedSaleRecord::OrderLegs {
                offer,
                consideration,
            } => {
                let payment_legs = if references(offer, asset) {
                    consideration
                } else if references(consideration, asset) {
                    offer
                } else {
                    warn!(%asset, "Neither order side references the asset");
                    push_unique(warnings, SaleWarning::AmbiguousOrderSide);
                    return Vec::new();
                };

                payment_legs
                    .iter()
                    .filter_map(|leg| {
                        self.known_currency(leg.token, warnings)
                            .map(|currency| Payment {
                                currency,
                                amount: leg.amount,
                            })
                    })
                    .collect()
            }
        }
    }

    fn known_currency(
        &self,
        token: Address,
        warnings: &mut Vec<SaleWarning>,
    ) -> Option<&'a CurrencyDefinition> {
        let currency = self.currencies.lookup(&token);
        if currency.is_none() {
            warn!(%token, "Payment in unknown currency excluded");
            push_unique(warnings, SaleWarning::UnknownCurrency { token });
        }
        currency
    }

    /// Sums the payments in the currency of the first one. Payments in any
    /// other currency are left out and reported.
    ///
    /// Returns whether the total is determined: at least one payment was
    /// attributed to the asset and the sum did not overflow.
    fn total(
        &self,
        payments: Vec<Payment<'a>>,
        warnings: &mut Vec<SaleWarning>,
    ) -> (SalePrice, bool) {
        let mut sums: Vec<(&CurrencyDefinition, Option<U256>)> = Vec::new();
        for payment in payments {
            match sums
                .iter_mut()
                .find(|(currency, _)| currency.contract() == payment.currency.contract())
            {
                Some((_, sum)) => *sum = sum.and_then(|sum| sum.checked_add(payment.amount)),
                None => sums.push((payment.currency, Some(payment.amount))),
            }
        }

        let undetermined = || SalePrice::zero(self.currencies.native().clone());
        let mut sums = sums.into_iter();
        let Some((currency, total)) = sums.next() else {
            return (undetermined(), false);
        };

        let ignored = sums
            .map(|(other, _)| other.contract().unwrap_or(Address::ZERO))
            .collect_vec();
        if !ignored.is_empty() {
            warn!(
                currency = currency.name(),
                ?ignored,
                "Mixed currency payments, summing first currency only"
            );
            warnings.push(SaleWarning::MixedCurrencies { ignored });
        }

        match total {
            Some(total) => (SalePrice::new(total, currency.clone()), true),
            None => {
                let token = currency.contract().unwrap_or(Address::ZERO);
                warn!(currency = currency.name(), "Sale total overflows");
                warnings.push(SaleWarning::AmountOverflow { token });
                (undetermined(), false)
            }
        }
    }
}

fn references(legs: &[Leg], asset: Address) -> bool {
    legs.iter().any(|leg| leg.token == asset)
}

fn push_unique(warnings: &mut Vec<SaleWarning>, warning: SaleWarning) {
    if !warnings.contains(&warning) {
        warnings.push(warning);
    }
}
