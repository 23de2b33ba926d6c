//! Tests for feed/offer reconciliation.

use std::collections::HashSet;

use super::reconcile;
use crate::error::SyncError;
use crate::models::{FeedRow, OfferIdSet, PriceRecord, StockRecord};

fn offers(ids: &[&str]) -> OfferIdSet {
    ids.iter().copied().collect()
}

#[test]
fn matches_rows_and_zero_fills_leftovers() {
    let feed = vec![
        FeedRow::new("A", ">10", "100.00 р."),
        FeedRow::new("B", "1", "50.00 р."),
    ];

    let result = reconcile(&feed, &offers(&["A", "B", "C"])).unwrap();

    assert_eq!(
        result.stocks,
        vec![
            StockRecord::new("A", 100),
            StockRecord::new("B", 0),
            StockRecord::new("C", 0),
        ]
    );
    assert_eq!(
        result.prices,
        vec![PriceRecord::new("A", 100), PriceRecord::new("B", 50)]
    );
}

#[test]
fn stock_records_follow_feed_order_then_listing_order() {
    let feed = vec![
        FeedRow::new("C", "3", "30.00"),
        FeedRow::new("A", "5", "10.00"),
    ];

    let result = reconcile(&feed, &offers(&["A", "B", "C", "D"])).unwrap();
    let order: Vec<&str> = result.stocks.iter().map(|s| s.offer_id.as_str()).collect();
    assert_eq!(order, vec!["C", "A", "B", "D"]);

    let price_order: Vec<&str> = result.prices.iter().map(|p| p.offer_id.as_str()).collect();
    assert_eq!(price_order, vec!["C", "A"]);
}

#[test]
fn rows_unknown_to_marketplace_are_ignored() {
    let feed = vec![
        FeedRow::new("X", "4", "1.00"),
        FeedRow::new("A", "2", "20.00"),
    ];

    let result = reconcile(&feed, &offers(&["A"])).unwrap();
    assert_eq!(result.stocks, vec![StockRecord::new("A", 2)]);
    assert_eq!(result.prices, vec![PriceRecord::new("A", 20)]);
}

#[test]
fn unknown_rows_are_not_validated() {
    // Garbage on a row the marketplace does not list must not stop the pass
    let feed = vec![FeedRow::new("X", "lots", "call us")];
    let result = reconcile(&feed, &offers(&["A"])).unwrap();
    assert_eq!(result.stocks, vec![StockRecord::new("A", 0)]);
    assert!(result.prices.is_empty());
}

#[test]
fn duplicate_codes_first_row_wins() {
    let feed = vec![
        FeedRow::new("A", "5", "10.00"),
        FeedRow::new("A", "9", "99.00"),
    ];

    let result = reconcile(&feed, &offers(&["A", "B"])).unwrap();
    assert_eq!(
        result.stocks,
        vec![StockRecord::new("A", 5), StockRecord::new("B", 0)]
    );
    assert_eq!(result.prices, vec![PriceRecord::new("A", 10)]);
}

#[test]
fn duplicate_row_with_bad_data_after_match_is_skipped() {
    let feed = vec![
        FeedRow::new("A", "5", "10.00"),
        FeedRow::new("A", "???", "???"),
    ];
    assert!(reconcile(&feed, &offers(&["A"])).is_ok());
}

#[test]
fn empty_feed_zero_fills_everything() {
    let result = reconcile(&[], &offers(&["A", "B"])).unwrap();
    assert_eq!(
        result.stocks,
        vec![StockRecord::new("A", 0), StockRecord::new("B", 0)]
    );
    assert!(result.prices.is_empty());
}

#[test]
fn empty_offer_set_produces_nothing() {
    let feed = vec![FeedRow::new("A", "5", "10.00")];
    let result = reconcile(&feed, &OfferIdSet::new()).unwrap();
    assert!(result.stocks.is_empty());
    assert!(result.prices.is_empty());
}

#[test]
fn every_offer_gets_exactly_one_stock_record() {
    let ids: Vec<String> = (0..50).map(|i| format!("SKU-{i}")).collect();
    let set: OfferIdSet = ids.iter().cloned().collect();
    let feed: Vec<FeedRow> = (0..80)
        .step_by(3)
        .map(|i| FeedRow::new(format!("SKU-{i}"), (i % 7).to_string(), "10.00"))
        .chain((0..20).map(|i| FeedRow::new(format!("SKU-{i}"), "2", "1.00")))
        .collect();

    let result = reconcile(&feed, &set).unwrap();

    assert_eq!(result.stocks.len(), set.len());
    let unique: HashSet<&str> = result.stocks.iter().map(|s| s.offer_id.as_str()).collect();
    assert_eq!(unique.len(), set.len());
    for id in &ids {
        assert!(unique.contains(id.as_str()));
    }

    let priced: HashSet<&str> = result.prices.iter().map(|p| p.offer_id.as_str()).collect();
    assert_eq!(priced.len(), result.prices.len());
}

#[test]
fn invalid_quantity_aborts_pass() {
    let feed = vec![
        FeedRow::new("A", "5", "10.00"),
        FeedRow::new("B", "many", "10.00"),
    ];
    let err = reconcile(&feed, &offers(&["A", "B"])).unwrap_err();
    assert!(matches!(err, SyncError::InvalidQuantity(ref q) if q == "many"));
}

#[test]
fn invalid_price_aborts_pass() {
    let feed = vec![FeedRow::new("A", "5", "n/a")];
    let err = reconcile(&feed, &offers(&["A"])).unwrap_err();
    assert!(matches!(err, SyncError::InvalidPrice(_)));
}

#[test]
fn input_offer_set_is_left_untouched() {
    let set = offers(&["A", "B"]);
    let feed = vec![FeedRow::new("A", "5", "10.00")];
    reconcile(&feed, &set).unwrap();
    assert_eq!(set.len(), 2);
    assert!(set.contains("A"));
}
