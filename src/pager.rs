//! Offer listing pagination.
//!
//! Marketplaces signal the end of their offer listing in one of two ways:
//! Ozon reports a grand total and the client stops once it has received
//! that many items, Yandex Market hands out a next-page token that is empty
//! on the last page. [`collect_offer_ids`] drives either style through the
//! [`OfferPageSource`] seam.

use std::collections::HashSet;

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::error::{Result, SyncError, TransportError};
use crate::models::OfferIdSet;

/// How a page tells the pager whether more pages follow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// Listing is done once the running item count reaches `total`
    Counted { total: usize, next_cursor: String },
    /// Next-page token, empty on the last page
    Token(String),
}

/// One page of an offer listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferPage {
    pub offer_ids: Vec<String>,
    pub continuation: Continuation,
}

/// Anything that can fetch a single page of offer ids for a cursor
///
/// An empty cursor asks for the first page.
#[async_trait]
pub trait OfferPageSource: Send + Sync {
    async fn fetch_page(&self, cursor: &str) -> std::result::Result<OfferPage, TransportError>;
}

/// Walks every page of a listing and returns the de-duplicated offer ids.
///
/// All-or-nothing: the first failing page aborts the walk with
/// [`SyncError::PageFetch`] and nothing collected so far is returned.
pub async fn collect_offer_ids<S>(source: &S) -> Result<OfferIdSet>
where
    S: OfferPageSource + ?Sized,
{
    let mut offer_ids = OfferIdSet::new();
    let mut received = 0usize;
    let mut cursor = String::new();
    let mut pages = 0usize;
    let mut seen_tokens = HashSet::new();

    loop {
        let page = source
            .fetch_page(&cursor)
            .await
            .map_err(SyncError::PageFetch)?;
        pages += 1;

        let page_len = page.offer_ids.len();
        received += page_len;
        for offer_id in page.offer_ids {
            offer_ids.insert(offer_id);
        }
        debug!("Offer page {pages}: {page_len} item(s), {received} received so far");

        match page.continuation {
            Continuation::Counted { total, next_cursor } => {
                if received >= total {
                    break;
                }
                // A short listing would otherwise re-request the same cursor forever
                if page_len == 0 {
                    warn!(
                        "Offer listing stopped at {received} of {total} reported item(s)"
                    );
                    break;
                }
                cursor = next_cursor;
            }
            Continuation::Token(next) => {
                if next.is_empty() {
                    break;
                }
                // A token that was already followed would cycle forever
                if !seen_tokens.insert(next.clone()) {
                    warn!("Offer listing repeated page token {next:?}, stopping");
                    break;
                }
                cursor = next;
            }
        }
    }

    info!(
        "Collected {} offer id(s) from {} page(s)",
        offer_ids.len(),
        pages
    );
    Ok(offer_ids)
}
