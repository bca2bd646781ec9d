use std::{collections::HashMap, sync::Arc};

use alloy::{
    json_abi::{Event, EventParam, Param},
    primitives::{Address, B256, address},
};

use crate::types::TokenId;

/// How the decoded sale event is turned into a price.
///
/// Field paths address event fields by name, nested struct members are
/// separated by dots (`sell.price`).
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(tag = "variant")]
pub enum DecoderVariant {
    /// Single order markets, the event carries the price of the asset directly.
    FixedPriceField {
        /// Path of the `uint256` price field.
        price: String,

        /// Path of the `address` payment token field, if the event has one.
        /// Zero address denotes the native currency.
        #[serde(default)]
        currency: Option<String>,
    },

    /// Order matching markets, the event carries both sides of the order
    /// as lists of `(token, amount)` legs.
    OrderLegSum {
        /// Path of the offer legs array.
        offer: String,

        /// Path of the consideration legs array.
        consideration: String,
    },
}

/// ABI schema of a marketplace sale event along with its decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaleEventSchema {
    event: Event,
    topic: B256,
    decoder: DecoderVariant,
}

impl SaleEventSchema {
    pub fn new(event: Event, decoder: DecoderVariant) -> Self {
        Self {
            topic: event.selector(),
            event,
            decoder,
        }
    }

    /// Event signature hash, the first log topic.
    pub fn topic(&self) -> B256 {
        self.topic
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn decoder(&self) -> &DecoderVariant {
        &self.decoder
    }

    /// Ordered schema of the log data payload (non-indexed event inputs).
    pub fn fields(&self) -> impl Iterator<Item = &EventParam> {
        self.event.inputs.iter().filter(|p| !p.indexed)
    }
}

/// Marketplace settlement contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketDefinition {
    recipient: Address,
    name: String,
    item_url_template: String,
    sale_events: Vec<SaleEventSchema>,
}

impl MarketDefinition {
    /// `item_url_template` may reference `{contract}` and `{token_id}`.
    pub fn new(
        recipient: Address,
        name: impl Into<String>,
        item_url_template: impl Into<String>,
        sale_events: Vec<SaleEventSchema>,
    ) -> Self {
        Self {
            recipient,
            name: name.into(),
            item_url_template: item_url_template.into(),
            sale_events,
        }
    }

    /// Settlement contract address the sale transactions are sent to.
    pub fn recipient(&self) -> Address {
        self.recipient
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn item_url_template(&self) -> &str {
        &self.item_url_template
    }

    pub fn sale_events(&self) -> &[SaleEventSchema] {
        &self.sale_events
    }

    /// Sale event schema matching the given first log topic.
    pub fn sale_event(&self, topic: &B256) -> Option<&SaleEventSchema> {
        self.sale_events.iter().find(|s| s.topic == *topic)
    }

    /// Marketplace page of the given asset.
    pub fn item_url(&self, contract: Address, token_id: TokenId) -> String {
        self.item_url_template
            .replace("{contract}", &contract.to_string())
            .replace("{token_id}", &token_id.to_string())
    }

    fn relocated(&self, recipient: Address) -> Self {
        Self {
            recipient,
            ..self.clone()
        }
    }
}

/// Immutable mapping from settlement contract address to market definition.
#[derive(Clone, Debug, Default)]
pub struct MarketRegistry {
    markets: HashMap<Address, Arc<MarketDefinition>>,
}

impl MarketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_market(mut self, market: MarketDefinition) -> Self {
        self.insert(market);
        self
    }

    pub(crate) fn insert(&mut self, market: MarketDefinition) {
        self.markets.insert(market.recipient, Arc::new(market));
    }

    pub fn mainnet() -> Self {
        let wyvern = wyvern(
            address!("0x7be8076f4ea4a4ad08075c2508e481d6c946d12b"),
            "https://opensea.io/assets/ethereum/{contract}/{token_id}",
        );
        let seaport = seaport(
            address!("0x00000000006c3852cbef3e08e8df289169ede581"),
            "https://opensea.io/assets/ethereum/{contract}/{token_id}",
        );
        Self::new()
            .with_market(wyvern.relocated(address!("0x7f268357a8c2552623316e2562d90e642bb538e5")))
            .with_market(wyvern)
            .with_market(seaport.relocated(address!("0x00000000000001ad428e4906ae43d8f9852d0dd6")))
            .with_market(seaport.relocated(address!("0x00000000000000adc04c56bf30ac9d3c0aaf14dc")))
            .with_market(seaport)
            .with_market(looksrare(
                address!("0x59728544b08ab483533076417fbbb2fd0b17ce3a"),
                "https://looksrare.org/collections/{contract}/{token_id}",
            ))
            .with_market(blur(address!("0x000000000000ad05ccc4f10045630fb830b95127")))
            .with_market(x2y2(address!("0x74312363e45dcaba76c59ec49a7aa8a65a67eed3")))
    }

    pub fn goerli() -> Self {
        Self::new()
            .with_market(seaport(
                address!("0x00000000006c3852cbef3e08e8df289169ede581"),
                "https://testnets.opensea.io/assets/goerli/{contract}/{token_id}",
            ))
            .with_market(looksrare(
                address!("0xd112466471b5438c1ca2d218694200e49d81d047"),
                "https://goerli.looksrare.org/collections/{contract}/{token_id}",
            ))
    }

    /// Market of the given settlement contract, if known.
    pub fn lookup(&self, recipient: &Address) -> Option<&Arc<MarketDefinition>> {
        self.markets.get(recipient)
    }

    pub fn contains(&self, recipient: &Address) -> bool {
        self.markets.contains_key(recipient)
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

fn wyvern(recipient: Address, item_url_template: &str) -> MarketDefinition {
    MarketDefinition::new(
        recipient,
        "OpenSea 🌊",
        item_url_template,
        vec![SaleEventSchema::new(
            event(
                "OrdersMatched",
                vec![
                    input("buyHash", "bytes32"),
                    input("sellHash", "bytes32"),
                    indexed("maker", "address"),
                    indexed("taker", "address"),
                    input("price", "uint256"),
                    indexed("metadata", "bytes32"),
                ],
            ),
            DecoderVariant::FixedPriceField {
                price: "price".to_string(),
                currency: None,
            },
        )],
    )
}

fn seaport(recipient: Address, item_url_template: &str) -> MarketDefinition {
    MarketDefinition::new(
        recipient,
        "OpenSea ⚓️",
        item_url_template,
        vec![SaleEventSchema::new(
            event(
                "OrderFulfilled",
                vec![
                    input("orderHash", "bytes32"),
                    indexed("offerer", "address"),
                    indexed("zone", "address"),
                    input("recipient", "address"),
                    tuple_input(
                        "offer",
                        "tuple[]",
                        vec![
                            component("itemType", "uint8"),
                            component("token", "address"),
                            component("identifier", "uint256"),
                            component("amount", "uint256"),
                        ],
                    ),
                    tuple_input(
                        "consideration",
                        "tuple[]",
                        vec![
                            component("itemType", "uint8"),
                            component("token", "address"),
                            component("identifier", "uint256"),
                            component("amount", "uint256"),
                            component("recipient", "address"),
                        ],
                    ),
                ],
            ),
            DecoderVariant::OrderLegSum {
                offer: "offer".to_string(),
                consideration: "consideration".to_string(),
            },
        )],
    )
}

fn looksrare(recipient: Address, item_url_template: &str) -> MarketDefinition {
    let taker_event = |name| {
        SaleEventSchema::new(
            event(
                name,
                vec![
                    input("orderHash", "bytes32"),
                    input("orderNonce", "uint256"),
                    indexed("taker", "address"),
                    indexed("maker", "address"),
                    indexed("strategy", "address"),
                    input("currency", "address"),
                    input("collection", "address"),
                    input("tokenId", "uint256"),
                    input("amount", "uint256"),
                    input("price", "uint256"),
                ],
            ),
            DecoderVariant::FixedPriceField {
                price: "price".to_string(),
                currency: Some("currency".to_string()),
            },
        )
    };
    MarketDefinition::new(
        recipient,
        "LooksRare 👀💎",
        item_url_template,
        vec![taker_event("TakerBid"), taker_event("TakerAsk")],
    )
}

fn blur(recipient: Address) -> MarketDefinition {
    let order = |name| {
        tuple_input(
            name,
            "tuple",
            vec![
                component("trader", "address"),
                component("side", "uint8"),
                component("matchingPolicy", "address"),
                component("collection", "address"),
                component("tokenId", "uint256"),
                component("amount", "uint256"),
                component("paymentToken", "address"),
                component("price", "uint256"),
                component("listingTime", "uint256"),
                component("expirationTime", "uint256"),
                tuple_component(
                    "fees",
                    "tuple[]",
                    vec![component("rate", "uint16"), component("recipient", "address")],
                ),
                component("salt", "uint256"),
                component("extraParams", "bytes"),
            ],
        )
    };
    MarketDefinition::new(
        recipient,
        "Blur 🟠",
        "https://blur.io/asset/{contract}/{token_id}",
        vec![SaleEventSchema::new(
            event(
                "OrdersMatched",
                vec![
                    indexed("maker", "address"),
                    indexed("taker", "address"),
                    order("sell"),
                    input("sellHash", "bytes32"),
                    order("buy"),
                    input("buyHash", "bytes32"),
                ],
            ),
            DecoderVariant::FixedPriceField {
                price: "sell.price".to_string(),
                currency: Some("sell.paymentToken".to_string()),
            },
        )],
    )
}

fn x2y2(recipient: Address) -> MarketDefinition {
    MarketDefinition::new(
        recipient,
        "X2Y2 ⭕️",
        "https://x2y2.io/eth/{contract}/{token_id}",
        vec![SaleEventSchema::new(
            event(
                "EvProfit",
                vec![
                    input("itemHash", "bytes32"),
                    input("currency", "address"),
                    input("to", "address"),
                    input("amount", "uint256"),
                ],
            ),
            DecoderVariant::FixedPriceField {
                price: "amount".to_string(),
                currency: Some("currency".to_string()),
            },
        )],
    )
}

fn event(name: &str, inputs: Vec<EventParam>) -> Event {
    Event {
        name: name.to_string(),
        inputs,
        anonymous: false,
    }
}

fn input(name: &str, ty: &str) -> EventParam {
    EventParam {
        ty: ty.to_string(),
        name: name.to_string(),
        indexed: false,
        components: vec![],
        internal_type: None,
    }
}

fn indexed(name: &str, ty: &str) -> EventParam {
    EventParam {
        indexed: true,
        ..input(name, ty)
    }
}

fn tuple_input(name: &str, ty: &str, components: Vec<Param>) -> EventParam {
    EventParam {
        components,
        ..input(name, ty)
    }
}

fn component(name: &str, ty: &str) -> Param {
    Param {
        ty: ty.to_string(),
        name: name.to_string(),
        components: vec![],
        internal_type: None,
    }
}

fn tuple_component(name: &str, ty: &str, components: Vec<Param>) -> Param {
    Param {
        components,
        ..component(name, ty)
    }
}

#[cfg(test)]
mod tests {
    use alloy::{primitives::b256, sol_types::SolEvent};

    use super::*;
    use crate::abi;

    fn topic_of(registry: &MarketRegistry, recipient: Address, index: usize) -> B256 {
        registry.lookup(&recipient).unwrap().sale_events()[index].topic()
    }

    #[test]
    fn test_sale_event_topics_match_solidity_definitions() {
        let registry = MarketRegistry::mainnet();

        let seaport = address!("0x00000000006c3852cbef3e08e8df289169ede581");
        assert_eq!(
            topic_of(&registry, seaport, 0),
            abi::seaport::OrderFulfilled::SIGNATURE_HASH
        );
        assert_eq!(
            topic_of(&registry, seaport, 0),
            b256!("0x9d9af8e38d66c62e2c12f0225249fd9d721c54b83f48d9352c97c6cacdcb6f31")
        );

        let looksrare = address!("0x59728544b08ab483533076417fbbb2fd0b17ce3a");
        assert_eq!(
            topic_of(&registry, looksrare, 0),
            abi::looksrare::TakerBid::SIGNATURE_HASH
        );
        assert_eq!(
            topic_of(&registry, looksrare, 1),
            abi::looksrare::TakerAsk::SIGNATURE_HASH
        );

        assert_eq!(
            topic_of(
                &registry,
                address!("0x7f268357a8c2552623316e2562d90e642bb538e5"),
                0
            ),
            abi::wyvern::OrdersMatched::SIGNATURE_HASH
        );
        assert_eq!(
            topic_of(
                &registry,
                address!("0x000000000000ad05ccc4f10045630fb830b95127"),
                0
            ),
            abi::blur::OrdersMatched::SIGNATURE_HASH
        );
        assert_eq!(
            topic_of(
                &registry,
                address!("0x74312363e45dcaba76c59ec49a7aa8a65a67eed3"),
                0
            ),
            abi::x2y2::EvProfit::SIGNATURE_HASH
        );
    }

    #[test]
    fn test_seaport_deployments_share_definition() {
        let registry = MarketRegistry::mainnet();
        let v1_1 = registry
            .lookup(&address!("0x00000000006c3852cbef3e08e8df289169ede581"))
            .unwrap();
        let v1_5 = registry
            .lookup(&address!("0x00000000000000adc04c56bf30ac9d3c0aaf14dc"))
            .unwrap();
        assert_eq!(v1_1.name(), v1_5.name());
        assert_eq!(v1_1.sale_events(), v1_5.sale_events());
        assert_eq!(
            v1_5.recipient(),
            address!("0x00000000000000adc04c56bf30ac9d3c0aaf14dc")
        );
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn test_fields_exclude_indexed_inputs() {
        let registry = MarketRegistry::mainnet();
        let wyvern = registry
            .lookup(&address!("0x7be8076f4ea4a4ad08075c2508e481d6c946d12b"))
            .unwrap();
        let fields: Vec<_> = wyvern.sale_events()[0]
            .fields()
            .map(|p| (p.name.as_str(), p.ty.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("buyHash", "bytes32"),
                ("sellHash", "bytes32"),
                ("price", "uint256")
            ]
        );
    }

    #[test]
    fn test_item_url() {
        let registry = MarketRegistry::mainnet();
        let looksrare = registry
            .lookup(&address!("0x59728544b08ab483533076417fbbb2fd0b17ce3a"))
            .unwrap();
        let contract = address!("0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d");
        assert_eq!(
            looksrare.item_url(contract, TokenId::from(42)),
            format!("https://looksrare.org/collections/{contract}/42")
        );
    }

    #[test]
    fn test_unknown_recipient() {
        let registry = MarketRegistry::mainnet();
        assert!(
            registry
                .lookup(&address!("0x1111111111111111111111111111111111111111"))
                .is_none()
        );
    }
}
