mod receipt;
mod summary;

pub use receipt::SaleReceipt;
pub use summary::{SalePrice, SaleSummary, SaleWarning};

/// ERC-721 token identifier.
pub type TokenId = alloy::primitives::U256;

/// Instant in chain history the observed events are up to date with.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Hash, Default)]
pub struct StateInstant {
    block_number: u64,
    block_timestamp: u64,
}

impl StateInstant {
    pub fn new(block_number: u64, block_timestamp: u64) -> Self {
        Self {
            block_number,
            block_timestamp,
        }
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn block_timestamp(&self) -> u64 {
        self.block_timestamp
    }
}
