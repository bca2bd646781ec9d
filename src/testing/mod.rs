//! Receipt and log builders for tests.
//!
//! Logs are ABI-encoded through the [`crate::abi`] bindings, so they carry
//! the exact payloads the marketplaces emit on chain.
//!
//! [`ReceiptBuilder`] assembles receipts, `*_sale_receipt` functions provide
//! complete settlement receipts for common scenarios.

use alloy::{
    primitives::{Address, B256, Bytes, Log, TxHash, U256, address},
    sol_types::SolEvent,
};

use crate::{
    abi::{blur, erc20, erc721, looksrare, seaport, wyvern, x2y2},
    types::SaleReceipt,
};

/// Monitored ERC-721 contract.
pub const ASSET: Address = address!("0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d");

/// Another ERC-721 contract.
pub const OTHER_ASSET: Address = address!("0x60e4d786628fea6478f785a6d7e704777c86a7c6");

pub const SEAPORT: Address = address!("0x00000000006c3852cbef3e08e8df289169ede581");
pub const LOOKSRARE: Address = address!("0x59728544b08ab483533076417fbbb2fd0b17ce3a");
pub const WYVERN: Address = address!("0x7f268357a8c2552623316e2562d90e642bb538e5");
pub const BLUR: Address = address!("0x000000000000ad05ccc4f10045630fb830b95127");
pub const X2Y2: Address = address!("0x74312363e45dcaba76c59ec49a7aa8a65a67eed3");

pub const WETH: Address = address!("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
pub const USDC: Address = address!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");

pub const SELLER: Address = address!("0x00000000000000000000000000000000000a11ce");
pub const BUYER: Address = address!("0x0000000000000000000000000000000000000b0b");

/// `n` tokens with 18 decimals, in minor units.
pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10).pow(U256::from(18))
}

/// Transaction hash derived from a number.
pub fn tx_hash(n: u64) -> TxHash {
    B256::left_padding_from(&n.to_be_bytes())
}

/// Log emitted by `emitter` with the given event payload.
pub fn event_log<E: SolEvent>(emitter: Address, event: &E) -> Log {
    Log {
        address: emitter,
        data: event.encode_log_data(),
    }
}

pub fn nft_transfer(asset: Address, token_id: u64) -> Log {
    event_log(
        asset,
        &erc721::Transfer {
            from: SELLER,
            to: BUYER,
            tokenId: U256::from(token_id),
        },
    )
}

pub fn erc20_transfer(token: Address, value: U256) -> Log {
    event_log(
        token,
        &erc20::Transfer {
            from: BUYER,
            to: SELLER,
            value,
        },
    )
}

pub fn looksrare_taker_bid(emitter: Address, currency: Address, token_id: u64, price: U256) -> Log {
    event_log(
        emitter,
        &looksrare::TakerBid {
            orderHash: B256::repeat_byte(0x11),
            orderNonce: U256::from(1),
            taker: BUYER,
            maker: SELLER,
            strategy: Address::repeat_byte(0x22),
            currency,
            collection: ASSET,
            tokenId: U256::from(token_id),
            amount: U256::from(1),
            price,
        },
    )
}

pub fn looksrare_taker_ask(emitter: Address, currency: Address, token_id: u64, price: U256) -> Log {
    event_log(
        emitter,
        &looksrare::TakerAsk {
            orderHash: B256::repeat_byte(0x12),
            orderNonce: U256::from(2),
            taker: SELLER,
            maker: BUYER,
            strategy: Address::repeat_byte(0x22),
            currency,
            collection: ASSET,
            tokenId: U256::from(token_id),
            amount: U256::from(1),
            price,
        },
    )
}

pub fn wyvern_orders_matched(emitter: Address, price: U256) -> Log {
    event_log(
        emitter,
        &wyvern::OrdersMatched {
            buyHash: B256::repeat_byte(0x01),
            sellHash: B256::repeat_byte(0x02),
            maker: SELLER,
            taker: BUYER,
            price,
            metadata: B256::ZERO,
        },
    )
}

pub fn blur_order(trader: Address, side: u8, payment_token: Address, token_id: u64, price: U256) -> blur::Order {
    blur::Order {
        trader,
        side,
        matchingPolicy: Address::repeat_byte(0x33),
        collection: ASSET,
        tokenId: U256::from(token_id),
        amount: U256::from(1),
        paymentToken: payment_token,
        price,
        listingTime: U256::from(1_670_000_000u64),
        expirationTime: U256::from(1_680_000_000u64),
        fees: vec![blur::Fee {
            rate: 50,
            recipient: Address::repeat_byte(0x44),
        }],
        salt: U256::from(7),
        extraParams: Bytes::new(),
    }
}

pub fn blur_orders_matched(emitter: Address, payment_token: Address, token_id: u64, price: U256) -> Log {
    event_log(
        emitter,
        &blur::OrdersMatched {
            maker: SELLER,
            taker: BUYER,
            sell: blur_order(SELLER, 1, payment_token, token_id, price),
            sellHash: B256::repeat_byte(0x03),
            buy: blur_order(BUYER, 0, payment_token, token_id, price),
            buyHash: B256::repeat_byte(0x04),
        },
    )
}

pub fn x2y2_profit(emitter: Address, currency: Address, amount: U256) -> Log {
    event_log(
        emitter,
        &x2y2::EvProfit {
            itemHash: B256::repeat_byte(0x05),
            currency,
            to: SELLER,
            amount,
        },
    )
}

pub fn spent_nft(asset: Address, token_id: u64) -> seaport::SpentItem {
    seaport::SpentItem {
        itemType: seaport::ITEM_ERC721,
        token: asset,
        identifier: U256::from(token_id),
        amount: U256::from(1),
    }
}

/// Spent currency leg, zero `token` for the native currency.
pub fn spent_currency(token: Address, amount: U256) -> seaport::SpentItem {
    seaport::SpentItem {
        itemType: currency_item_type(token),
        token,
        identifier: U256::ZERO,
        amount,
    }
}

pub fn received_nft(asset: Address, token_id: u64, recipient: Address) -> seaport::ReceivedItem {
    seaport::ReceivedItem {
        itemType: seaport::ITEM_ERC721,
        token: asset,
        identifier: U256::from(token_id),
        amount: U256::from(1),
        recipient,
    }
}

/// Received currency leg, zero `token` for the native currency.
pub fn received_currency(token: Address, amount: U256, recipient: Address) -> seaport::ReceivedItem {
    seaport::ReceivedItem {
        itemType: currency_item_type(token),
        token,
        identifier: U256::ZERO,
        amount,
        recipient,
    }
}

pub fn seaport_order_fulfilled(
    emitter: Address,
    offer: Vec<seaport::SpentItem>,
    consideration: Vec<seaport::ReceivedItem>,
) -> Log {
    event_log(
        emitter,
        &seaport::OrderFulfilled {
            orderHash: B256::repeat_byte(0x06),
            offerer: SELLER,
            zone: Address::ZERO,
            recipient: BUYER,
            offer,
            consideration,
        },
    )
}

fn currency_item_type(token: Address) -> u8 {
    if token.is_zero() {
        seaport::ITEM_NATIVE
    } else {
        seaport::ITEM_ERC20
    }
}

/// Builds [`SaleReceipt`]s.
#[derive(Clone, Debug)]
pub struct ReceiptBuilder {
    hash: TxHash,
    to: Option<Address>,
    logs: Vec<Log>,
}

impl ReceiptBuilder {
    pub fn new(to: Address) -> Self {
        Self {
            hash: tx_hash(1),
            to: Some(to),
            logs: Vec::new(),
        }
    }

    pub fn hash(mut self, hash: TxHash) -> Self {
        self.hash = hash;
        self
    }

    pub fn log(mut self, log: Log) -> Self {
        self.logs.push(log);
        self
    }

    pub fn logs(mut self, logs: impl IntoIterator<Item = Log>) -> Self {
        self.logs.extend(logs);
        self
    }

    pub fn build(self) -> SaleReceipt {
        SaleReceipt::new(self.hash, self.to, self.logs)
    }
}

/// LooksRare sale of [`ASSET`] #42 for 2.5 of the native currency.
pub fn looksrare_sale_receipt() -> SaleReceipt {
    ReceiptBuilder::new(LOOKSRARE)
        .log(nft_transfer(ASSET, 42))
        .log(looksrare_taker_bid(
            LOOKSRARE,
            Address::ZERO,
            42,
            U256::from(2_500_000_000_000_000_000u64),
        ))
        .build()
}

/// Seaport listing fill of [`ASSET`] #42 for 1 WETH to the seller plus
/// 0.05 WETH marketplace fee.
pub fn seaport_sale_receipt() -> SaleReceipt {
    let fee = U256::from(50_000_000_000_000_000u64);
    ReceiptBuilder::new(SEAPORT)
        .log(erc20_transfer(WETH, ether(1)))
        .log(erc20_transfer(WETH, fee))
        .log(nft_transfer(ASSET, 42))
        .log(seaport_order_fulfilled(
            SEAPORT,
            vec![spent_nft(ASSET, 42)],
            vec![
                received_currency(WETH, ether(1), SELLER),
                received_currency(WETH, fee, Address::repeat_byte(0x55)),
            ],
        ))
        .build()
}
