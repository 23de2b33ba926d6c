//! Tests for the Yandex Market adapter.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::error::{SyncError, TransportError};
use crate::marketplace::{http_client, Marketplace, YandexChannel, YandexMarket};
use crate::models::{PriceRecord, StockRecord};

fn fbs_channel() -> YandexChannel {
    YandexChannel {
        label: "fbs".to_string(),
        campaign_id: "1001".to_string(),
        warehouse_id: "77".to_string(),
    }
}

fn market_with_mock(mock_uri: &str) -> YandexMarket {
    let client = http_client(Duration::from_secs(5)).unwrap();
    YandexMarket::new(client, "market_token".to_string(), fbs_channel())
        .with_base_url(mock_uri)
        .with_updated_at(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap())
}

fn mapping_page(skus: &[&str], next: Option<&str>) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = skus
        .iter()
        .map(|sku| json!({"offer": {"shopSku": sku, "name": "Casio"}, "mapping": {}}))
        .collect();
    let paging = match next {
        Some(token) => json!({"nextPageToken": token}),
        None => json!({}),
    };
    json!({
        "status": "OK",
        "result": {"paging": paging, "offerMappingEntries": entries}
    })
}

// ── fetch_offer_ids ──────────────────────────────────────────────────

#[tokio::test]
async fn follows_page_tokens_until_absent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/campaigns/1001/offer-mapping-entries"))
        .and(query_param("page_token", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mapping_page(&["C", "A"], None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/campaigns/1001/offer-mapping-entries"))
        .and(query_param("limit", "200"))
        .and(header("Authorization", "Bearer market_token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(mapping_page(&["A", "B"], Some("page2"))),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let market = market_with_mock(&mock_server.uri());
    let ids = market.fetch_offer_ids().await.unwrap();
    let ids: Vec<&str> = ids.iter().collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn empty_token_ends_listing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/campaigns/1001/offer-mapping-entries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mapping_page(&["A"], Some(""))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let market = market_with_mock(&mock_server.uri());
    let ids = market.fetch_offer_ids().await.unwrap();
    assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn listing_failure_is_page_fetch_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/campaigns/1001/offer-mapping-entries"))
        .respond_with(ResponseTemplate::new(420).set_body_json(json!({
            "status": "ERROR",
            "errors": [{"code": "LIMIT_EXCEEDED", "message": "too many requests"}]
        })))
        .mount(&mock_server)
        .await;

    let market = market_with_mock(&mock_server.uri());
    let err = market.fetch_offer_ids().await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::PageFetch(TransportError::Status { .. })
    ));
}

// ── push_stocks ──────────────────────────────────────────────────────

#[tokio::test]
async fn pushes_stocks_nested_by_warehouse() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/campaigns/1001/offers/stocks"))
        .and(header("Authorization", "Bearer market_token"))
        .and(body_json(json!({
            "skus": [
                {
                    "sku": "A",
                    "warehouseId": "77",
                    "items": [{"count": 100, "type": "FIT", "updatedAt": "2024-03-01T09:30:00Z"}]
                },
                {
                    "sku": "B",
                    "warehouseId": "77",
                    "items": [{"count": 0, "type": "FIT", "updatedAt": "2024-03-01T09:30:00Z"}]
                }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "OK"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let market = market_with_mock(&mock_server.uri());
    let report = market
        .push_stocks(&[StockRecord::new("A", 100), StockRecord::new("B", 0)])
        .await
        .unwrap();
    assert_eq!(report.accepted, 2);
    assert!(report.rejected.is_empty());
}

#[tokio::test]
async fn non_ok_status_rejects_whole_chunk() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/campaigns/1001/offers/stocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ERROR",
            "errors": [{"code": "BAD_REQUEST", "message": "unknown warehouse"}]
        })))
        .mount(&mock_server)
        .await;

    let market = market_with_mock(&mock_server.uri());
    let report = market
        .push_stocks(&[StockRecord::new("A", 1), StockRecord::new("B", 2)])
        .await
        .unwrap();
    assert_eq!(report.accepted, 0);
    assert_eq!(report.rejected.len(), 2);
    assert_eq!(report.rejected[1].offer_id, "B");
    assert_eq!(report.rejected[1].reason, "BAD_REQUEST: unknown warehouse");
}

// ── push_prices ──────────────────────────────────────────────────────

#[tokio::test]
async fn pushes_prices_in_roubles() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/campaigns/1001/offer-prices/updates"))
        .and(body_json(json!({
            "offers": [
                {"id": "A", "price": {"value": 5990, "currencyId": "RUR"}},
                {"id": "B", "price": {"value": 12, "currencyId": "RUR"}}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "OK"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let market = market_with_mock(&mock_server.uri());
    let report = market
        .push_prices(&[PriceRecord::new("A", 5990), PriceRecord::new("B", 12)])
        .await
        .unwrap();
    assert_eq!(report.accepted, 2);
}

#[tokio::test]
async fn price_push_error_status_propagates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/campaigns/1001/offer-prices/updates"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad price"))
        .mount(&mock_server)
        .await;

    let market = market_with_mock(&mock_server.uri());
    let err = market
        .push_prices(&[PriceRecord::new("A", 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Status { .. }));
}

// ── construction ─────────────────────────────────────────────────────

#[test]
fn channel_name_includes_label() {
    let market = market_with_mock("http://localhost");
    assert_eq!(market.name(), "yandex-fbs");
    assert_eq!(market.channel().warehouse_id, "77");
    assert_eq!(market.batch_limits().stocks, 2000);
    assert_eq!(market.batch_limits().prices, 500);
}
