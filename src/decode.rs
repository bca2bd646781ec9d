//! Sale event decoding.
//!
//! Sale event payloads are decoded dynamically against the market's ABI schema
//! ([`SaleEventSchema`]) and reduced to a [`DecodedSaleRecord`] as instructed by
//! the schema's [`DecoderVariant`].

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, Specifier},
    json_abi::{EventParam, Param},
    primitives::{Address, Log, U256},
};
use itertools::Itertools;

use crate::{
    error::{DecodeError, DecodeFailure},
    registry::{DecoderVariant, MarketDefinition, SaleEventSchema},
};

/// One side item of a settlement order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Leg {
    /// Token contract, zero address for the native currency.
    pub token: Address,

    /// Raw amount in token minor units.
    pub amount: U256,
}

/// Market-specific sale payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedSaleRecord {
    /// Price of the asset, along with the payment token if the event names one.
    FixedPrice {
        price: U256,
        currency: Option<Address>,
    },

    /// Both sides of a matched order.
    OrderLegs {
        offer: Vec<Leg>,
        consideration: Vec<Leg>,
    },
}

/// Decodes the sale event log against the given schema of the market.
pub fn decode_sale(
    market: &MarketDefinition,
    schema: &SaleEventSchema,
    log: &Log,
) -> Result<DecodedSaleRecord, DecodeError> {
    decode_record(schema, log).map_err(|reason| DecodeError {
        market: market.name().to_string(),
        reason,
        log: Box::new(log.clone()),
    })
}

fn decode_record(schema: &SaleEventSchema, log: &Log) -> Result<DecodedSaleRecord, DecodeFailure> {
    if log.topics().first() != Some(&schema.topic()) {
        return Err(DecodeFailure::SelectorMismatch);
    }

    let fields = DecodedFields::decode(schema, &log.data.data)?;
    match schema.decoder() {
        DecoderVariant::FixedPriceField { price, currency } => {
            Ok(DecodedSaleRecord::FixedPrice {
                price: fields.get(price)?.uint(price)?,
                currency: currency
                    .as_deref()
                    .map(|path| fields.get(path)?.address(path))
                    .transpose()?,
            })
        }
        DecoderVariant::OrderLegSum {
            offer,
            consideration,
        } => Ok(DecodedSaleRecord::OrderLegs {
            offer: fields.get(offer)?.legs(offer)?,
            consideration: fields.get(consideration)?.legs(consideration)?,
        }),
    }
}

/// Decoded data payload, addressable by schema field names.
struct DecodedFields<'s> {
    schema: Vec<&'s EventParam>,
    values: Vec<DynSolValue>,
}

/// Decoded value along with the schema of its struct members, if any.
struct Field<'v> {
    value: &'v DynSolValue,
    components: &'v [Param],
}

impl<'s> DecodedFields<'s> {
    fn decode(schema: &'s SaleEventSchema, data: &[u8]) -> Result<Self, DecodeFailure> {
        let schema = schema.fields().collect_vec();
        let types = schema
            .iter()
            .map(|field| {
                field
                    .resolve()
                    .map_err(|e| DecodeFailure::Schema(format!("{}: {e}", field.name)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let values = match DynSolType::Tuple(types)
            .abi_decode_params(data)
            .map_err(|e| DecodeFailure::Abi(e.to_string()))?
        {
            DynSolValue::Tuple(values) => values,
            other => vec![other],
        };
        if values.len() != schema.len() {
            return Err(DecodeFailure::Abi(format!(
                "expected {} fields, got {}",
                schema.len(),
                values.len()
            )));
        }

        Ok(Self { schema, values })
    }

    /// Resolves a dot-separated field path.
    fn get(&self, path: &str) -> Result<Field<'_>, DecodeFailure> {
        let missing = || DecodeFailure::MissingField(path.to_string());
        let mut segments = path.split('.');

        let first = segments.next().ok_or_else(missing)?;
        let index = self
            .schema
            .iter()
            .position(|p| p.name == first)
            .ok_or_else(missing)?;
        let mut value = &self.values[index];
        let mut components = self.schema[index].components.as_slice();

        for segment in segments {
            let member = components
                .iter()
                .position(|c| c.name == segment)
                .ok_or_else(missing)?;
            value = value
                .as_tuple()
                .and_then(|members| members.get(member))
                .ok_or_else(|| type_mismatch(path, "tuple"))?;
            components = &components[member].components;
        }
        Ok(Field { value, components })
    }
}

impl Field<'_> {
    fn uint(&self, path: &str) -> Result<U256, DecodeFailure> {
        self.value
            .as_uint()
            .map(|(value, _)| value)
            .ok_or_else(|| type_mismatch(path, "uint"))
    }

    fn address(&self, path: &str) -> Result<Address, DecodeFailure> {
        self.value
            .as_address()
            .ok_or_else(|| type_mismatch(path, "address"))
    }

    /// Reads an array of structs with `token` and `amount` members.
    fn legs(&self, path: &str) -> Result<Vec<Leg>, DecodeFailure> {
        let items = self
            .value
            .as_array()
            .or_else(|| self.value.as_fixed_array())
            .ok_or_else(|| type_mismatch(path, "array"))?;

        let member = |name: &str| {
            self.components
                .iter()
                .position(|c| c.name == name)
                .ok_or_else(|| DecodeFailure::MissingField(format!("{path}.{name}")))
        };
        let (token, amount) = (member("token")?, member("amount")?);

        items
            .iter()
            .map(|item| {
                let members = item.as_tuple().ok_or_else(|| type_mismatch(path, "tuple"))?;
                Ok(Leg {
                    token: members
                        .get(token)
                        .and_then(DynSolValue::as_address)
                        .ok_or_else(|| type_mismatch(path, "address token"))?,
                    amount: members
                        .get(amount)
                        .and_then(DynSolValue::as_uint)
                        .map(|(value, _)| value)
                        .ok_or_else(|| type_mismatch(path, "uint amount"))?,
                })
            })
            .collect()
    }
}

fn type_mismatch(path: &str, expected: &'static str) -> DecodeFailure {
    DecodeFailure::FieldType {
        path: path.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Bytes;

    use super::*;
    use crate::{registry::MarketRegistry, testing};

    fn decode_with(recipient: Address, log: &Log) -> Result<DecodedSaleRecord, DecodeError> {
        let markets = MarketRegistry::mainnet();
        let market = markets.lookup(&recipient).unwrap();
        let schema = market.sale_event(&log.topics()[0]).unwrap();
        decode_sale(market, schema, log)
    }

    #[test]
    fn test_decode_looksrare_fixed_price() {
        let log = testing::looksrare_taker_bid(
            testing::LOOKSRARE,
            testing::WETH,
            42,
            testing::ether(3),
        );
        assert_eq!(
            decode_with(testing::LOOKSRARE, &log).unwrap(),
            DecodedSaleRecord::FixedPrice {
                price: testing::ether(3),
                currency: Some(testing::WETH),
            }
        );

        let log = testing::looksrare_taker_ask(
            testing::LOOKSRARE,
            Address::ZERO,
            42,
            U256::from(7),
        );
        assert_eq!(
            decode_with(testing::LOOKSRARE, &log).unwrap(),
            DecodedSaleRecord::FixedPrice {
                price: U256::from(7),
                currency: Some(Address::ZERO),
            }
        );
    }

    #[test]
    fn test_decode_price_without_currency_field() {
        let log = testing::wyvern_orders_matched(testing::WYVERN, testing::ether(2));
        assert_eq!(
            decode_with(testing::WYVERN, &log).unwrap(),
            DecodedSaleRecord::FixedPrice {
                price: testing::ether(2),
                currency: None,
            }
        );
    }

    #[test]
    fn test_decode_nested_struct_fields() {
        let log = testing::blur_orders_matched(testing::BLUR, testing::WETH, 9, testing::ether(5));
        assert_eq!(
            decode_with(testing::BLUR, &log).unwrap(),
            DecodedSaleRecord::FixedPrice {
                price: testing::ether(5),
                currency: Some(testing::WETH),
            }
        );
    }

    #[test]
    fn test_decode_order_legs() {
        let log = testing::seaport_order_fulfilled(
            testing::SEAPORT,
            vec![testing::spent_nft(testing::ASSET, 42)],
            vec![
                testing::received_currency(Address::ZERO, testing::ether(1), testing::SELLER),
                testing::received_currency(testing::WETH, U256::from(25), testing::SELLER),
            ],
        );
        assert_eq!(
            decode_with(testing::SEAPORT, &log).unwrap(),
            DecodedSaleRecord::OrderLegs {
                offer: vec![Leg {
                    token: testing::ASSET,
                    amount: U256::from(1),
                }],
                consideration: vec![
                    Leg {
                        token: Address::ZERO,
                        amount: testing::ether(1),
                    },
                    Leg {
                        token: testing::WETH,
                        amount: U256::from(25),
                    },
                ],
            }
        );
    }

    #[test]
    fn test_decode_selector_mismatch() {
        let markets = MarketRegistry::mainnet();
        let market = markets.lookup(&testing::LOOKSRARE).unwrap();
        let taker_bid = &market.sale_events()[0];

        let log = testing::looksrare_taker_ask(testing::LOOKSRARE, Address::ZERO, 1, U256::from(1));
        let err = decode_sale(market, taker_bid, &log).unwrap_err();
        assert_eq!(err.reason, DecodeFailure::SelectorMismatch);
        assert_eq!(err.market, market.name());
        assert_eq!(*err.log, log);
    }

    #[test]
    fn test_decode_truncated_payload() {
        let log = testing::looksrare_taker_bid(testing::LOOKSRARE, testing::WETH, 1, U256::from(1));
        let truncated = Log::new_unchecked(
            log.address,
            log.topics().to_vec(),
            Bytes::copy_from_slice(&log.data.data[..40]),
        );

        let err = decode_with(testing::LOOKSRARE, &truncated).unwrap_err();
        assert!(matches!(err.reason, DecodeFailure::Abi(_)));
        assert_eq!(*err.log, truncated);
    }

    #[test]
    fn test_decode_field_errors() {
        let markets = MarketRegistry::mainnet();
        let market = markets.lookup(&testing::LOOKSRARE).unwrap();
        let event = market.sale_events()[0].event().clone();
        let log = testing::looksrare_taker_bid(testing::LOOKSRARE, testing::WETH, 1, U256::from(1));

        let schema = SaleEventSchema::new(
            event.clone(),
            DecoderVariant::FixedPriceField {
                price: "cost".to_string(),
                currency: None,
            },
        );
        assert_eq!(
            decode_sale(market, &schema, &log).unwrap_err().reason,
            DecodeFailure::MissingField("cost".to_string())
        );

        let schema = SaleEventSchema::new(
            event,
            DecoderVariant::FixedPriceField {
                price: "currency".to_string(),
                currency: None,
            },
        );
        assert_eq!(
            decode_sale(market, &schema, &log).unwrap_err().reason,
            DecodeFailure::FieldType {
                path: "currency".to_string(),
                expected: "uint",
            }
        );
    }
}
