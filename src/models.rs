//! Records flowing through the sync pipeline

use indexmap::IndexSet;
use serde::Deserialize;

/// One line of the supplier inventory feed
///
/// Fields are taken verbatim from the export; normalisation happens during
/// reconciliation so a malformed value stops the pass instead of being dropped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedRow {
    /// Supplier item code, matched against marketplace offer ids
    #[serde(rename = "Код", alias = "code")]
    pub code: String,
    /// `">10"`, `"1"` or a literal integer
    #[serde(rename = "Количество", alias = "quantity")]
    pub quantity: String,
    /// Free-text price such as `5'990.00 руб.`
    #[serde(rename = "Цена", alias = "price")]
    pub price: String,
}

impl FeedRow {
    pub fn new(
        code: impl Into<String>,
        quantity: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            quantity: quantity.into(),
            price: price.into(),
        }
    }
}

/// Offer identifiers known to one marketplace channel, in listing order
///
/// Duplicates reported by the marketplace collapse to their first position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferIdSet {
    ids: IndexSet<String>,
}

impl OfferIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an id, returning false if it was already present
    pub fn insert(&mut self, offer_id: impl Into<String>) -> bool {
        self.ids.insert(offer_id.into())
    }

    pub fn contains(&self, offer_id: &str) -> bool {
        self.ids.contains(offer_id)
    }

    /// Remove an id while keeping the order of the remaining ones
    pub fn remove(&mut self, offer_id: &str) -> bool {
        self.ids.shift_remove(offer_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for OfferIdSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl IntoIterator for OfferIdSet {
    type Item = String;
    type IntoIter = indexmap::set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

/// Publishable stock count for one offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRecord {
    pub offer_id: String,
    pub count: u32,
}

impl StockRecord {
    pub fn new(offer_id: impl Into<String>, count: u32) -> Self {
        Self {
            offer_id: offer_id.into(),
            count,
        }
    }
}

/// Publishable price for one offer, in whole roubles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRecord {
    pub offer_id: String,
    pub value: u64,
}

impl PriceRecord {
    pub fn new(offer_id: impl Into<String>, value: u64) -> Self {
        Self {
            offer_id: offer_id.into(),
            value,
        }
    }
}

/// Output of reconciling a feed against an offer set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Matched offers in feed order, then zero-filled leftovers
    pub stocks: Vec<StockRecord>,
    /// Matched offers only, in feed order
    pub prices: Vec<PriceRecord>,
}

impl Reconciliation {
    /// Number of stock records with a non-zero count
    pub fn in_stock(&self) -> usize {
        self.stocks.iter().filter(|s| s.count != 0).count()
    }
}

/// An item the marketplace refused inside an otherwise accepted chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub offer_id: String,
    pub reason: String,
}

/// What a marketplace said about one pushed chunk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub accepted: usize,
    pub rejected: Vec<Rejection>,
}

impl UploadReport {
    /// Every item in the chunk was accepted
    pub fn all_accepted(count: usize) -> Self {
        Self {
            accepted: count,
            rejected: Vec::new(),
        }
    }

    pub fn merge(&mut self, other: UploadReport) {
        self.accepted += other.accepted;
        self.rejected.extend(other.rejected);
    }
}
