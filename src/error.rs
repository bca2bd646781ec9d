use std::{fmt::Display, path::PathBuf};

use alloy::{
    primitives::{Address, Log, TxHash},
    transports,
};

/// Sale event could not be decoded against the market's ABI schema.
///
/// The transaction was correctly classified as a marketplace settlement,
/// but can not be summarized.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode {market} sale event emitted by {}: {reason}", .log.address)]
pub struct DecodeError {
    /// Name of the market the event was matched against.
    pub market: String,

    pub reason: DecodeFailure,

    /// Offending log, for diagnostics.
    pub log: Box<Log>,
}

/// Reason the sale event payload did not match the schema.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeFailure {
    #[error("event topic does not match the schema")]
    SelectorMismatch,

    #[error("unresolvable schema type: {0}")]
    Schema(String),

    #[error("payload mismatch: {0}")]
    Abi(String),

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("field {path} is not {expected}")]
    FieldType { path: String, expected: &'static str },
}

/// Error loading currency/market registries from the configuration.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read registry file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed registry file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid threshold for currency {0}: {1}")]
    InvalidThreshold(Address, String),

    #[error("market {0} has no sale events")]
    NoSaleEvents(Address),

    #[error("duplicate registry entry: {0}")]
    Duplicate(Address),
}

/// Error returned by the RPC provider while following transfers or
/// fetching receipts.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unexpected empty RPC response")]
    NullResp,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("receipt for {0} not available after {1} attempts")]
    ReceiptUnavailable(TxHash, usize),
}

impl<E: Display> From<transports::RpcError<E>> for WatchError {
    fn from(value: transports::RpcError<E>) -> Self {
        match value {
            transports::RpcError::ErrorResp(ref resp) => {
                let msg = resp.message.to_ascii_lowercase();
                if ((resp.code == -32600 || resp.code == -32601 || resp.code == -32602)
                    && (msg.contains("invalid") || msg.contains("not found")))
                    || (resp.code == -32603
                        && (msg.contains("block by number") || msg.contains("getting block")))
                {
                    Self::InvalidRequest(msg)
                } else {
                    Self::Transport(value.to_string())
                }
            }
            transports::RpcError::NullResp => Self::NullResp,
            _ => Self::Transport(value.to_string()),
        }
    }
}
