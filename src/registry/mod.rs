//! Static currency and marketplace tables.
//!
//! Both registries are keyed by contract address and never mutated once the
//! [`crate::Network`] is built. Built-in tables cover mainnet and Goerli,
//! [`RegistryFile`] extends them from the configuration.

mod currency;
mod file;
mod market;

pub use currency::*;
pub use file::RegistryFile;
pub use market::*;
