use alloy::{
    primitives::{Address, Log, TxHash},
    rpc::types::TransactionReceipt,
};

/// Finalized transaction receipt, reduced to what sale decoding needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaleReceipt {
    transaction_hash: TxHash,
    to: Option<Address>,
    logs: Vec<Log>,
}

impl SaleReceipt {
    pub fn new(transaction_hash: TxHash, to: Option<Address>, logs: Vec<Log>) -> Self {
        Self {
            transaction_hash,
            to,
            logs,
        }
    }

    pub fn transaction_hash(&self) -> TxHash {
        self.transaction_hash
    }

    /// Settlement recipient, `None` for contract creation transactions.
    pub fn to(&self) -> Option<Address> {
        self.to
    }

    /// Logs in emission order.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }
}

impl From<&TransactionReceipt> for SaleReceipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self::new(
            receipt.transaction_hash,
            receipt.to,
            receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        )
    }
}
