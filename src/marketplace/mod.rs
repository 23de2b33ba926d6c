//! Marketplace adapters.
//!
//! Each adapter translates the generic [`StockRecord`] / [`PriceRecord`]
//! streams into one marketplace's wire format and knows how to list the
//! offers of one channel. The pipeline only talks to the [`Marketplace`]
//! trait.

mod ozon;
mod yandex;

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::error::{Result, SyncError, TransportError};
use crate::models::{OfferIdSet, PriceRecord, StockRecord, UploadReport};

pub use ozon::{OzonCredentials, OzonSeller, OZON_API_URL, OZON_BATCH_LIMITS};
pub use yandex::{YandexChannel, YandexMarket, YANDEX_API_URL, YANDEX_BATCH_LIMITS};

/// Result of a single HTTP exchange
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Maximum items per request for each update endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub stocks: usize,
    pub prices: usize,
}

/// One marketplace channel the pipeline can sync
#[async_trait]
pub trait Marketplace: Send + Sync {
    /// Channel name used in logs and reports (e.g. "ozon", "yandex-fbs")
    fn name(&self) -> &str;

    fn batch_limits(&self) -> BatchLimits;

    /// Lists every offer id currently known to the channel
    async fn fetch_offer_ids(&self) -> Result<OfferIdSet>;

    /// Pushes one chunk of stock records, at most `batch_limits().stocks` long
    async fn push_stocks(&self, chunk: &[StockRecord]) -> TransportResult<UploadReport>;

    /// Pushes one chunk of price records, at most `batch_limits().prices` long
    async fn push_prices(&self, chunk: &[PriceRecord]) -> TransportResult<UploadReport>;
}

/// Builds the HTTP client shared by all adapters of a run
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(concat!("stock_sync/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| SyncError::Config(format!("failed to build HTTP client: {e}")))
}

/// Sends a request and decodes a 2xx JSON body.
///
/// Non-2xx answers become [`TransportError::Status`] carrying the body text
/// so marketplace error messages end up in the logs.
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> TransportResult<T> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    debug!("Response status {status}, {} byte(s)", body.len());

    if !status.is_success() {
        return Err(TransportError::Status { status, body });
    }

    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
#[path = "tests/mod.rs"]
mod tests;
