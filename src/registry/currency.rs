use std::collections::HashMap;

use alloy::primitives::{Address, address};
use fastnum::{UD256, udec256};

/// Decimals of the native chain currency.
pub const NATIVE_DECIMALS: u8 = 18;

/// Currency a sale can be settled in.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrencyDefinition {
    contract: Option<Address>,
    name: String,
    decimals: u8,
    dust_threshold: UD256,
}

impl CurrencyDefinition {
    /// Native chain currency.
    pub fn native(name: impl Into<String>, dust_threshold: UD256) -> Self {
        Self {
            contract: None,
            name: name.into(),
            decimals: NATIVE_DECIMALS,
            dust_threshold,
        }
    }

    /// ERC-20 token currency.
    pub fn token(
        contract: Address,
        name: impl Into<String>,
        decimals: u8,
        dust_threshold: UD256,
    ) -> Self {
        Self {
            contract: Some(contract),
            name: name.into(),
            decimals,
            dust_threshold,
        }
    }

    pub(super) fn with_decimals(self, decimals: u8) -> Self {
        Self { decimals, ..self }
    }

    /// Token contract, `None` for the native currency.
    pub fn contract(&self) -> Option<Address> {
        self.contract
    }

    pub fn is_native(&self) -> bool {
        self.contract.is_none()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Sales below this amount are considered not worth announcing.
    pub fn dust_threshold(&self) -> UD256 {
        self.dust_threshold
    }
}

/// Immutable mapping from ERC-20 contract address to currency definition.
///
/// The zero address resolves to the native currency, as order-matching
/// markets encode native payment legs with it.
#[derive(Clone, Debug)]
pub struct CurrencyRegistry {
    native: CurrencyDefinition,
    tokens: HashMap<Address, CurrencyDefinition>,
}

impl CurrencyRegistry {
    pub fn new(native: CurrencyDefinition) -> Self {
        Self {
            native,
            tokens: HashMap::new(),
        }
    }

    pub fn with_currency(mut self, currency: CurrencyDefinition) -> Self {
        self.insert(currency);
        self
    }

    pub(crate) fn insert(&mut self, currency: CurrencyDefinition) {
        match currency.contract {
            Some(contract) => {
                self.tokens.insert(contract, currency);
            }
            None => self.native = currency,
        }
    }

    pub fn mainnet() -> Self {
        Self::new(CurrencyDefinition::native("ETH", udec256!(1)))
            .with_currency(CurrencyDefinition::token(
                address!("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
                "WETH",
                18,
                udec256!(1),
            ))
            .with_currency(CurrencyDefinition::token(
                address!("0x0000000000a39bb272e79075ade125fd351887ac"),
                "BETH",
                18,
                udec256!(1),
            ))
            .with_currency(CurrencyDefinition::token(
                address!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
                "USDC",
                6,
                udec256!(1000),
            ))
            .with_currency(CurrencyDefinition::token(
                address!("0x6b175474e89094c44da98b954eedeac495271d0f"),
                "DAI",
                18,
                udec256!(1000),
            ))
            .with_currency(CurrencyDefinition::token(
                address!("0x4d224452801aced8b2f0aebe155379bb5d594381"),
                "APE",
                18,
                udec256!(100),
            ))
    }

    pub fn goerli() -> Self {
        Self::new(CurrencyDefinition::native("ETH", udec256!(0))).with_currency(
            CurrencyDefinition::token(
                address!("0xb4fbf271143f4fbf7b91a5ded31805e42b2208d6"),
                "WETH",
                18,
                udec256!(0),
            ),
        )
    }

    pub fn native(&self) -> &CurrencyDefinition {
        &self.native
    }

    /// Currency of the given token contract, if known.
    pub fn lookup(&self, contract: &Address) -> Option<&CurrencyDefinition> {
        if contract.is_zero() {
            return Some(&self.native);
        }
        self.tokens.get(contract)
    }

    /// Currency of the given token contract, defaults to the native currency.
    pub fn lookup_or_native(&self, contract: &Address) -> &CurrencyDefinition {
        self.lookup(contract).unwrap_or(&self.native)
    }

    /// Whether the address is a known ERC-20 currency contract.
    pub fn is_token(&self, contract: &Address) -> bool {
        self.tokens.contains_key(contract)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &CurrencyDefinition> {
        self.tokens.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_token() {
        let registry = CurrencyRegistry::mainnet();
        let weth = registry
            .lookup(&address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"))
            .unwrap();
        assert_eq!(weth.name(), "WETH");
        assert_eq!(weth.decimals(), 18);
        assert!(!weth.is_native());

        let usdc = registry
            .lookup(&address!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"))
            .unwrap();
        assert_eq!(usdc.decimals(), 6);
    }

    #[test]
    fn test_lookup_zero_address_is_native() {
        let registry = CurrencyRegistry::mainnet();
        let eth = registry.lookup(&Address::ZERO).unwrap();
        assert!(eth.is_native());
        assert_eq!(eth.name(), "ETH");
        assert_eq!(eth.decimals(), NATIVE_DECIMALS);
        assert!(!registry.is_token(&Address::ZERO));
    }

    #[test]
    fn test_lookup_unknown_token() {
        let registry = CurrencyRegistry::mainnet();
        let unknown = address!("0x1111111111111111111111111111111111111111");
        assert!(registry.lookup(&unknown).is_none());
        assert!(registry.lookup_or_native(&unknown).is_native());
    }

    #[test]
    fn test_insert_native_replaces_default() {
        let registry =
            CurrencyRegistry::mainnet().with_currency(CurrencyDefinition::native("MATIC", udec256!(5)));
        assert_eq!(registry.native().name(), "MATIC");
        assert_eq!(registry.native().dust_threshold(), udec256!(5));
    }
}
