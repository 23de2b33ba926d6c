//! Yandex Market Partner API adapter.
//!
//! One adapter per campaign: the FBS and DBS channels of the same shop are
//! separate campaigns with their own warehouse, offer listing and uploads.
//! Stock items carry the warehouse id and the run timestamp.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use super::{send_json, BatchLimits, Marketplace, TransportResult};
use crate::error::Result;
use crate::models::{OfferIdSet, PriceRecord, Rejection, StockRecord, UploadReport};
use crate::pager::{collect_offer_ids, Continuation, OfferPage, OfferPageSource};

/// Production Partner API root
pub const YANDEX_API_URL: &str = "https://api.partner.market.yandex.ru";

/// Items requested per offer-mapping page
const LIST_PAGE_LIMIT: u32 = 200;

/// Partner API update endpoint ceilings
pub const YANDEX_BATCH_LIMITS: BatchLimits = BatchLimits {
    stocks: 2000,
    prices: 500,
};

/// A campaign and the warehouse its stock is published for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YandexChannel {
    /// Short label such as "fbs" or "dbs"
    pub label: String,
    pub campaign_id: String,
    pub warehouse_id: String,
}

// ── wire types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MappingResponse {
    result: MappingResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MappingResult {
    #[serde(default)]
    paging: Paging,
    #[serde(default)]
    offer_mapping_entries: Vec<MappingEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Paging {
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MappingEntry {
    offer: MappedOffer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MappedOffer {
    shop_sku: String,
}

#[derive(Debug, Serialize)]
struct StocksRequest<'a> {
    skus: Vec<SkuStock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SkuStock<'a> {
    sku: &'a str,
    warehouse_id: &'a str,
    items: [StockItem<'a>; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StockItem<'a> {
    count: u32,
    #[serde(rename = "type")]
    kind: &'static str,
    updated_at: &'a str,
}

#[derive(Debug, Serialize)]
struct PricesRequest<'a> {
    offers: Vec<OfferPrice<'a>>,
}

#[derive(Debug, Serialize)]
struct OfferPrice<'a> {
    id: &'a str,
    price: PriceValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PriceValue {
    value: u64,
    currency_id: &'static str,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    errors: Vec<ApiIssue>,
}

#[derive(Debug, Deserialize)]
struct ApiIssue {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl StatusResponse {
    /// The Partner API accepts or refuses a chunk as a whole
    fn into_report<'a>(self, offer_ids: impl Iterator<Item = &'a str>) -> UploadReport {
        let mut report = UploadReport::default();
        if self.status == "OK" {
            report.accepted = offer_ids.count();
            return report;
        }

        let reason = if self.errors.is_empty() {
            format!("status {}", self.status)
        } else {
            self.errors
                .iter()
                .map(|e| format!("{}: {}", e.code, e.message))
                .collect::<Vec<_>>()
                .join("; ")
        };
        report.rejected = offer_ids
            .map(|offer_id| Rejection {
                offer_id: offer_id.to_string(),
                reason: reason.clone(),
            })
            .collect();
        report
    }
}

/// Formats a timestamp the way the stocks endpoint expects it
fn format_updated_at(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// ── adapter ──────────────────────────────────────────────────────────

/// Adapter for one Yandex Market campaign
pub struct YandexMarket {
    client: Client,
    access_token: String,
    channel: YandexChannel,
    name: String,
    base_url: String,
    limits: BatchLimits,
    updated_at: String,
}

impl YandexMarket {
    pub fn new(client: Client, access_token: String, channel: YandexChannel) -> Self {
        info!(
            "Creating Yandex Market adapter for {} (campaign {}, warehouse {})",
            channel.label, channel.campaign_id, channel.warehouse_id
        );
        Self {
            client,
            access_token,
            name: format!("yandex-{}", channel.label),
            channel,
            base_url: YANDEX_API_URL.to_string(),
            limits: YANDEX_BATCH_LIMITS,
            updated_at: format_updated_at(&Utc::now()),
        }
    }

    /// Points the adapter at another API root (mock servers, sandboxes)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_batch_limits(mut self, limits: BatchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Overrides the stock timestamp, which defaults to adapter creation time
    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = format_updated_at(&at);
        self
    }

    pub fn channel(&self) -> &YandexChannel {
        &self.channel
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/campaigns/{}/{}",
            self.base_url, self.channel.campaign_id, endpoint
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
    }
}

#[async_trait]
impl OfferPageSource for YandexMarket {
    async fn fetch_page(&self, cursor: &str) -> TransportResult<OfferPage> {
        debug!(
            "Fetching {} offer mapping page (token '{cursor}')",
            self.name
        );
        let mut request = self
            .client
            .get(self.url("offer-mapping-entries"))
            .query(&[("limit", LIST_PAGE_LIMIT.to_string())]);
        if !cursor.is_empty() {
            request = request.query(&[("page_token", cursor)]);
        }

        let response: MappingResponse = send_json(self.authorize(request)).await?;

        Ok(OfferPage {
            offer_ids: response
                .result
                .offer_mapping_entries
                .into_iter()
                .map(|entry| entry.offer.shop_sku)
                .collect(),
            continuation: Continuation::Token(
                response.result.paging.next_page_token.unwrap_or_default(),
            ),
        })
    }
}

#[async_trait]
impl Marketplace for YandexMarket {
    fn name(&self) -> &str {
        &self.name
    }

    fn batch_limits(&self) -> BatchLimits {
        self.limits
    }

    async fn fetch_offer_ids(&self) -> Result<OfferIdSet> {
        collect_offer_ids(self).await
    }

    async fn push_stocks(&self, chunk: &[StockRecord]) -> TransportResult<UploadReport> {
        let body = StocksRequest {
            skus: chunk
                .iter()
                .map(|s| SkuStock {
                    sku: &s.offer_id,
                    warehouse_id: &self.channel.warehouse_id,
                    items: [StockItem {
                        count: s.count,
                        kind: "FIT",
                        updated_at: &self.updated_at,
                    }],
                })
                .collect(),
        };
        let request = self.client.put(self.url("offers/stocks")).json(&body);
        let response: StatusResponse = send_json(self.authorize(request)).await?;
        Ok(response.into_report(chunk.iter().map(|s| s.offer_id.as_str())))
    }

    async fn push_prices(&self, chunk: &[PriceRecord]) -> TransportResult<UploadReport> {
        let body = PricesRequest {
            offers: chunk
                .iter()
                .map(|p| OfferPrice {
                    id: &p.offer_id,
                    price: PriceValue {
                        value: p.value,
                        currency_id: "RUR",
                    },
                })
                .collect(),
        };
        let request = self
            .client
            .post(self.url("offer-prices/updates"))
            .json(&body);
        let response: StatusResponse = send_json(self.authorize(request)).await?;
        Ok(response.into_report(chunk.iter().map(|p| p.offer_id.as_str())))
    }
}
