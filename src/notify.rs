//! Sale announcements.
//!
//! [`format_sale`] renders a [`SaleSummary`] as a human-readable message,
//! [`Notifier`] implementations publish it.

use std::{convert::Infallible, future::Future};

use tracing::info;

use crate::types::SaleSummary;

/// Formats the announcement of a sale.
///
/// Single asset sales link to the marketplace item page:
///
/// `Bored Ape #42 bought for 2.50 ETH on LooksRare 👀💎 https://looksrare.org/...`
///
/// Bundle sales link to the transaction on the block explorer:
///
/// `Bored Ape #7 & other assets bought for 3.00 WETH on OpenSea ⚓️ https://etherscan.io/tx/0x...`
///
/// Sales without a determined price omit it rather than announcing zero.
pub fn format_sale(summary: &SaleSummary, collection_name: &str, explorer_url: &str) -> String {
    let market = summary.market();
    let token_id = summary.first_token_id();

    let (subject, link) = if summary.is_bundle() {
        (
            format!("{collection_name} #{token_id} & other assets"),
            format!(
                "{}/tx/{}",
                explorer_url.trim_end_matches('/'),
                summary.tx_hash()
            ),
        )
    } else {
        (
            format!("{collection_name} #{token_id}"),
            market.item_url(summary.asset(), token_id),
        )
    };

    if summary.price_determined() {
        let price = summary.price();
        format!(
            "{subject} bought for {} {} on {} {link}",
            price.display(),
            price.currency().name(),
            market.name()
        )
    } else {
        format!("{subject} bought on {} {link}", market.name())
    }
}

/// Destination of sale announcements.
pub trait Notifier {
    type Error: std::error::Error + Send + Sync + 'static;

    fn notify(
        &self,
        summary: &SaleSummary,
        message: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Writes announcements to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    type Error = Infallible;

    async fn notify(&self, summary: &SaleSummary, message: &str) -> Result<(), Self::Error> {
        info!(tx_hash = %summary.tx_hash(), "{message}");
        Ok(())
    }
}
