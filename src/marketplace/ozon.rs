//! Ozon Seller API adapter.
//!
//! Ozon has a single channel per seller account. The product listing is
//! paged with `last_id` and reports a grand `total`; stock and price imports
//! answer with a per-offer `updated` flag.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use super::{send_json, BatchLimits, Marketplace, TransportResult};
use crate::error::Result;
use crate::models::{OfferIdSet, PriceRecord, Rejection, StockRecord, UploadReport};
use crate::pager::{collect_offer_ids, Continuation, OfferPage, OfferPageSource};

/// Production Ozon Seller API root
pub const OZON_API_URL: &str = "https://api-seller.ozon.ru";

/// Items requested per product listing page
const LIST_PAGE_LIMIT: u32 = 1000;

/// Ozon import endpoint ceilings
pub const OZON_BATCH_LIMITS: BatchLimits = BatchLimits {
    stocks: 100,
    prices: 1000,
};

/// Seller credentials sent as `Client-Id` / `Api-Key` headers
#[derive(Debug, Clone)]
pub struct OzonCredentials {
    pub client_id: String,
    pub api_key: String,
}

// ── wire types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    filter: ListFilter,
    last_id: &'a str,
    limit: u32,
}

#[derive(Debug, Serialize)]
struct ListFilter {
    visibility: &'static str,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    result: ListResult,
}

#[derive(Debug, Deserialize)]
struct ListResult {
    #[serde(default)]
    items: Vec<ListItem>,
    total: usize,
    #[serde(default)]
    last_id: String,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    offer_id: String,
}

#[derive(Debug, Serialize)]
struct StocksRequest<'a> {
    stocks: Vec<StockItem<'a>>,
}

#[derive(Debug, Serialize)]
struct StockItem<'a> {
    offer_id: &'a str,
    stock: u32,
}

#[derive(Debug, Serialize)]
struct PricesRequest<'a> {
    prices: Vec<PriceItem<'a>>,
}

#[derive(Debug, Serialize)]
struct PriceItem<'a> {
    auto_action_enabled: &'static str,
    currency_code: &'static str,
    offer_id: &'a str,
    old_price: &'static str,
    price: String,
}

impl<'a> From<&'a PriceRecord> for PriceItem<'a> {
    fn from(record: &'a PriceRecord) -> Self {
        Self {
            auto_action_enabled: "UNKNOWN",
            currency_code: "RUB",
            offer_id: &record.offer_id,
            old_price: "0",
            price: record.value.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImportResponse {
    #[serde(default)]
    result: Vec<ImportResult>,
}

#[derive(Debug, Deserialize)]
struct ImportResult {
    offer_id: String,
    #[serde(default)]
    updated: bool,
    #[serde(default)]
    errors: Vec<ImportIssue>,
}

#[derive(Debug, Deserialize)]
struct ImportIssue {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl ImportResponse {
    /// Folds per-offer results into a report; an empty result list means
    /// Ozon accepted the chunk without itemising it
    fn into_report(self, sent: usize) -> UploadReport {
        if self.result.is_empty() {
            return UploadReport::all_accepted(sent);
        }

        let mut report = UploadReport::default();
        for item in self.result {
            if item.updated {
                report.accepted += 1;
                continue;
            }
            let reason = if item.errors.is_empty() {
                "not updated".to_string()
            } else {
                item.errors
                    .iter()
                    .map(|e| format!("{}: {}", e.code, e.message))
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            report.rejected.push(Rejection {
                offer_id: item.offer_id,
                reason,
            });
        }
        report
    }
}

// ── adapter ──────────────────────────────────────────────────────────

/// Ozon seller account adapter
pub struct OzonSeller {
    client: Client,
    credentials: OzonCredentials,
    base_url: String,
    limits: BatchLimits,
}

impl OzonSeller {
    pub fn new(client: Client, credentials: OzonCredentials) -> Self {
        info!("Creating Ozon adapter for client {}", credentials.client_id);
        Self {
            client,
            credentials,
            base_url: OZON_API_URL.to_string(),
            limits: OZON_BATCH_LIMITS,
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

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("Client-Id", &self.credentials.client_id)
            .header("Api-Key", &self.credentials.api_key)
    }
}

#[async_trait]
impl OfferPageSource for OzonSeller {
    async fn fetch_page(&self, cursor: &str) -> TransportResult<OfferPage> {
        debug!("Fetching Ozon product list page (last_id '{cursor}')");
        let body = ListRequest {
            filter: ListFilter { visibility: "ALL" },
            last_id: cursor,
            limit: LIST_PAGE_LIMIT,
        };
        let response: ListResponse = send_json(self.post("/v2/product/list").json(&body)).await?;

        Ok(OfferPage {
            offer_ids: response
                .result
                .items
                .into_iter()
                .map(|item| item.offer_id)
                .collect(),
            continuation: Continuation::Counted {
                total: response.result.total,
                next_cursor: response.result.last_id,
            },
        })
    }
}

#[async_trait]
impl Marketplace for OzonSeller {
    fn name(&self) -> &str {
        "ozon"
    }

    fn batch_limits(&self) -> BatchLimits {
        self.limits
    }

    async fn fetch_offer_ids(&self) -> Result<OfferIdSet> {
        collect_offer_ids(self).await
    }

    async fn push_stocks(&self, chunk: &[StockRecord]) -> TransportResult<UploadReport> {
        let body = StocksRequest {
            stocks: chunk
                .iter()
                .map(|s| StockItem {
                    offer_id: &s.offer_id,
                    stock: s.count,
                })
                .collect(),
        };
        let response: ImportResponse =
            send_json(self.post("/v1/product/import/stocks").json(&body)).await?;
        Ok(response.into_report(chunk.len()))
    }

    async fn push_prices(&self, chunk: &[PriceRecord]) -> TransportResult<UploadReport> {
        let body = PricesRequest {
            prices: chunk.iter().map(PriceItem::from).collect(),
        };
        let response: ImportResponse =
            send_json(self.post("/v1/product/import/prices").json(&body)).await?;
        Ok(response.into_report(chunk.len()))
    }
}
