//! Matching feed rows against a marketplace's offer ids.

use log::{debug, info};

use crate::error::Result;
use crate::models::{FeedRow, OfferIdSet, PriceRecord, Reconciliation, StockRecord};
use crate::normalize::{normalize_price, normalize_quantity};

/// Builds the stock and price records to publish for one channel.
///
/// Every offer in `offers` gets exactly one stock record: matched rows in
/// feed order first, then the unmatched offers zero-filled in listing order.
/// Only matched rows get a price record; an offer missing from the feed
/// keeps whatever price the marketplace already has.
///
/// When the feed repeats a code, the first row wins and later rows for the
/// same code are ignored.
///
/// A malformed quantity or price on a matched row aborts the whole pass.
pub fn reconcile(feed: &[FeedRow], offers: &OfferIdSet) -> Result<Reconciliation> {
    let mut remaining = offers.clone();
    let mut stocks = Vec::with_capacity(offers.len());
    let mut prices = Vec::new();

    for row in feed {
        if !remaining.contains(&row.code) {
            continue;
        }

        let count = normalize_quantity(&row.quantity)?;
        let value = normalize_price(&row.price)?;

        stocks.push(StockRecord::new(row.code.clone(), count));
        prices.push(PriceRecord::new(row.code.clone(), value));
        remaining.remove(&row.code);
    }

    let matched = stocks.len();
    debug!(
        "Matched {} feed row(s), zero-filling {} offer(s)",
        matched,
        remaining.len()
    );

    stocks.extend(remaining.into_iter().map(|offer_id| StockRecord::new(offer_id, 0)));

    info!(
        "Reconciled {} offer(s): {} matched, {} zero-filled",
        offers.len(),
        matched,
        stocks.len() - matched
    );

    Ok(Reconciliation { stocks, prices })
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
