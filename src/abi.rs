//! Solidity definitions of the events observed in settlement receipts.
//!
//! Market registries describe sale events as data (see [`crate::registry`]),
//! these bindings pin their exact wire layout and are used to encode fixtures.

pub mod erc721 {
    alloy::sol! {
        /// ERC-721 transfer, all arguments are indexed so the log carries no data.
        #[derive(Debug)]
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
    }
}

pub mod erc20 {
    alloy::sol! {
        /// ERC-20 transfer, shares the topic with ERC-721 one but carries the value as data.
        #[derive(Debug)]
        event Transfer(address indexed from, address indexed to, uint256 value);
    }
}

pub mod seaport {
    alloy::sol! {
        #[derive(Debug)]
        struct SpentItem {
            uint8 itemType;
            address token;
            uint256 identifier;
            uint256 amount;
        }

        #[derive(Debug)]
        struct ReceivedItem {
            uint8 itemType;
            address token;
            uint256 identifier;
            uint256 amount;
            address recipient;
        }

        #[derive(Debug)]
        event OrderFulfilled(
            bytes32 orderHash,
            address indexed offerer,
            address indexed zone,
            address recipient,
            SpentItem[] offer,
            ReceivedItem[] consideration
        );
    }

    pub const ITEM_NATIVE: u8 = 0;
    pub const ITEM_ERC20: u8 = 1;
    pub const ITEM_ERC721: u8 = 2;
}

pub mod looksrare {
    alloy::sol! {
        #[derive(Debug)]
        event TakerBid(
            bytes32 orderHash,
            uint256 orderNonce,
            address indexed taker,
            address indexed maker,
            address indexed strategy,
            address currency,
            address collection,
            uint256 tokenId,
            uint256 amount,
            uint256 price
        );

        #[derive(Debug)]
        event TakerAsk(
            bytes32 orderHash,
            uint256 orderNonce,
            address indexed taker,
            address indexed maker,
            address indexed strategy,
            address currency,
            address collection,
            uint256 tokenId,
            uint256 amount,
            uint256 price
        );
    }
}

pub mod wyvern {
    alloy::sol! {
        #[derive(Debug)]
        event OrdersMatched(
            bytes32 buyHash,
            bytes32 sellHash,
            address indexed maker,
            address indexed taker,
            uint256 price,
            bytes32 indexed metadata
        );
    }
}

pub mod blur {
    alloy::sol! {
        #[derive(Debug)]
        struct Fee {
            uint16 rate;
            address recipient;
        }

        #[derive(Debug)]
        struct Order {
            address trader;
            uint8 side;
            address matchingPolicy;
            address collection;
            uint256 tokenId;
            uint256 amount;
            address paymentToken;
            uint256 price;
            uint256 listingTime;
            uint256 expirationTime;
            Fee[] fees;
            uint256 salt;
            bytes extraParams;
        }

        #[derive(Debug)]
        event OrdersMatched(
            address indexed maker,
            address indexed taker,
            Order sell,
            bytes32 sellHash,
            Order buy,
            bytes32 buyHash
        );
    }
}

pub mod x2y2 {
    alloy::sol! {
        #[derive(Debug)]
        event EvProfit(bytes32 itemHash, address currency, address to, uint256 amount);
    }
}
