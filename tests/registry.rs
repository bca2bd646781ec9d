use std::io::Write;

use alloy::primitives::{Address, U256, address};
use fastnum::udec256;
use nft_sales::{
    Network,
    analyzer::TransactionAnalyzer,
    error::RegistryError,
    testing::{self, ReceiptBuilder},
};

const MARKET: Address = address!("0x2222222222222222222222222222222222222222");
const TOKEN: Address = address!("0x3333333333333333333333333333333333333333");

const REGISTRY: &str = r#"{
    "currencies": [
        { "address": "0x3333333333333333333333333333333333333333", "name": "TKN", "decimals": 6, "threshold": "25" }
    ],
    "markets": [
        {
            "address": "0x2222222222222222222222222222222222222222",
            "name": "Bazaar",
            "item_url_template": "https://bazaar.test/{contract}/{token_id}",
            "sale_events": [
                {
                    "name": "TakerBid",
                    "inputs": [
                        { "name": "orderHash", "type": "bytes32", "indexed": false },
                        { "name": "orderNonce", "type": "uint256", "indexed": false },
                        { "name": "taker", "type": "address", "indexed": true },
                        { "name": "maker", "type": "address", "indexed": true },
                        { "name": "strategy", "type": "address", "indexed": true },
                        { "name": "currency", "type": "address", "indexed": false },
                        { "name": "collection", "type": "address", "indexed": false },
                        { "name": "tokenId", "type": "uint256", "indexed": false },
                        { "name": "amount", "type": "uint256", "indexed": false },
                        { "name": "price", "type": "uint256", "indexed": false }
                    ],
                    "decoder": { "variant": "FixedPriceField", "price": "price", "currency": "currency" }
                }
            ]
        }
    ]
}"#;

fn registry_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

/// Markets added through the registry file are analyzed like built-in ones.
#[test]
fn test_market_from_registry_file() {
    let file = registry_file(REGISTRY);
    let network = Network::mainnet().with_registry_file(file.path()).unwrap();
    assert!(network.markets().contains(&MARKET));
    assert!(network.markets().contains(&testing::SEAPORT));

    let receipt = ReceiptBuilder::new(MARKET)
        .log(testing::nft_transfer(testing::ASSET, 5))
        .log(testing::looksrare_taker_bid(
            MARKET,
            TOKEN,
            5,
            U256::from(12_345_678),
        ))
        .build();

    let summary = TransactionAnalyzer::new(network)
        .analyze(&receipt, testing::ASSET)
        .into_summary()
        .unwrap();
    assert_eq!(summary.market().name(), "Bazaar");
    assert_eq!(summary.price().currency().name(), "TKN");
    assert_eq!(summary.price().exact(), udec256!(12.345678));
    assert_eq!(summary.price().display(), udec256!(12.35));
    assert!(summary.is_below_threshold());
    assert_eq!(
        summary.market().item_url(testing::ASSET, U256::from(5)),
        format!("https://bazaar.test/{}/5", testing::ASSET)
    );
}

#[test]
fn test_missing_registry_file() {
    let result = Network::mainnet().with_registry_file("/nonexistent/registry.json");
    assert!(matches!(result, Err(RegistryError::Io(..))));
}

#[test]
fn test_duplicate_registry_entries() {
    let file = registry_file(
        r#"{"currencies": [
            { "address": "0x3333333333333333333333333333333333333333", "name": "A", "decimals": 6 },
            { "address": "0x3333333333333333333333333333333333333333", "name": "B", "decimals": 6 }
        ]}"#,
    );
    let result = Network::mainnet().with_registry_file(file.path());
    assert!(matches!(result, Err(RegistryError::Duplicate(a)) if a == TOKEN));
}
