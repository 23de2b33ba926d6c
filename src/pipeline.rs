//! Per-channel sync pipeline and the run orchestrator.
//!
//! A channel run lists the offers, reconciles them with the feed and
//! uploads stock then price chunks strictly one after another. Chunks that
//! were pushed before a failure stay pushed. The orchestrator runs every
//! channel, reports failures and carries on with the next one.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::batch::{batch_count, batches};
use crate::error::{RecordKind, Result, SyncError};
use crate::marketplace::{Marketplace, TransportResult};
use crate::models::{FeedRow, PriceRecord, Rejection, StockRecord, UploadReport};
use crate::reconcile::reconcile;

/// Summary of one channel run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub channel: String,
    /// Offers listed by the marketplace
    pub offers: usize,
    pub stock_records: usize,
    /// Stock records with a non-zero count
    pub in_stock: usize,
    pub price_records: usize,
    pub stock_chunks: usize,
    pub price_chunks: usize,
    /// Items the marketplace refused inside accepted chunks
    pub rejected: Vec<Rejection>,
    pub dry_run: bool,
}

/// Result of one channel within a run
#[derive(Debug)]
pub struct ChannelOutcome {
    pub channel: String,
    pub result: Result<SyncReport>,
}

impl ChannelOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Record types that can be pushed to a marketplace in chunks
#[async_trait]
trait Upload: Sync + Sized {
    const KIND: RecordKind;

    fn limit(marketplace: &dyn Marketplace) -> usize;

    async fn push(marketplace: &dyn Marketplace, chunk: &[Self]) -> TransportResult<UploadReport>;
}

#[async_trait]
impl Upload for StockRecord {
    const KIND: RecordKind = RecordKind::Stock;

    fn limit(marketplace: &dyn Marketplace) -> usize {
        marketplace.batch_limits().stocks
    }

    async fn push(marketplace: &dyn Marketplace, chunk: &[Self]) -> TransportResult<UploadReport> {
        marketplace.push_stocks(chunk).await
    }
}

#[async_trait]
impl Upload for PriceRecord {
    const KIND: RecordKind = RecordKind::Price;

    fn limit(marketplace: &dyn Marketplace) -> usize {
        marketplace.batch_limits().prices
    }

    async fn push(marketplace: &dyn Marketplace, chunk: &[Self]) -> TransportResult<UploadReport> {
        marketplace.push_prices(chunk).await
    }
}

/// Pushes `records` chunk by chunk, returning the number of chunks sent.
///
/// Cancellation is checked before each chunk; a chunk already in flight
/// always completes.
async fn upload_all<T: Upload>(
    marketplace: &dyn Marketplace,
    records: &[T],
    cancel: &CancellationToken,
    totals: &mut UploadReport,
) -> Result<usize> {
    let size = T::limit(marketplace);
    let total = batch_count(records.len(), size);
    let mut pushed = 0;

    for (index, chunk) in batches(records, size).enumerate() {
        if cancel.is_cancelled() {
            warn!(
                "{}: cancelled before {} chunk {}/{}",
                marketplace.name(),
                T::KIND,
                index + 1,
                total
            );
            return Err(SyncError::Cancelled { pushed });
        }

        debug!(
            "{}: pushing {} chunk {}/{} ({} record(s))",
            marketplace.name(),
            T::KIND,
            index + 1,
            total,
            chunk.len()
        );
        let report = T::push(marketplace, chunk)
            .await
            .map_err(|source| SyncError::Upload {
                kind: T::KIND,
                chunk: index + 1,
                source,
            })?;

        for rejection in &report.rejected {
            warn!(
                "{}: {} for {} rejected: {}",
                marketplace.name(),
                T::KIND,
                rejection.offer_id,
                rejection.reason
            );
        }
        totals.merge(report);
        pushed += 1;
    }

    if total > 0 {
        info!(
            "{}: pushed {} {} record(s) in {} chunk(s)",
            marketplace.name(),
            records.len(),
            T::KIND,
            total
        );
    }
    Ok(pushed)
}

/// Runs the full pipeline for one marketplace channel
pub async fn run_channel(
    marketplace: &dyn Marketplace,
    feed: &[FeedRow],
    cancel: &CancellationToken,
    dry_run: bool,
) -> Result<SyncReport> {
    let name = marketplace.name().to_string();
    info!("{name}: fetching offer ids...");
    let offers = marketplace.fetch_offer_ids().await?;
    info!("{name}: {} offer(s) listed", offers.len());

    let reconciliation = reconcile(feed, &offers)?;

    let mut report = SyncReport {
        channel: name.clone(),
        offers: offers.len(),
        stock_records: reconciliation.stocks.len(),
        in_stock: reconciliation.in_stock(),
        price_records: reconciliation.prices.len(),
        dry_run,
        ..SyncReport::default()
    };

    if dry_run {
        info!(
            "{name}: dry run, would push {} stock and {} price record(s)",
            report.stock_records, report.price_records
        );
        return Ok(report);
    }

    let mut totals = UploadReport::default();
    report.stock_chunks = upload_all(marketplace, &reconciliation.stocks, cancel, &mut totals).await?;
    report.price_chunks = upload_all(marketplace, &reconciliation.prices, cancel, &mut totals).await?;
    report.rejected = totals.rejected;

    Ok(report)
}

fn log_outcome(outcome: &ChannelOutcome) {
    match &outcome.result {
        Ok(report) => {
            info!(
                "{}: done - {} offer(s), {} in stock, {} price(s), {} rejected",
                report.channel,
                report.offers,
                report.in_stock,
                report.price_records,
                report.rejected.len()
            );
        }
        Err(e) if e.is_transient() => {
            error!(
                "{}: marketplace unreachable, will retry on next run: {}",
                outcome.channel, e
            );
        }
        Err(e) => error!("{}: sync failed: {}", outcome.channel, e),
    }
}

/// Syncs every channel, one failure never stopping the others.
///
/// With `concurrent` each channel runs as its own task; channels share
/// nothing but the read-only feed.
pub async fn sync_all(
    marketplaces: Vec<Box<dyn Marketplace>>,
    feed: Arc<Vec<FeedRow>>,
    cancel: CancellationToken,
    dry_run: bool,
    concurrent: bool,
) -> Vec<ChannelOutcome> {
    let outcomes = if concurrent {
        sync_concurrently(marketplaces, feed, cancel, dry_run).await
    } else {
        let mut outcomes = Vec::with_capacity(marketplaces.len());
        for marketplace in marketplaces {
            let channel = marketplace.name().to_string();
            let result = if cancel.is_cancelled() {
                Err(SyncError::Cancelled { pushed: 0 })
            } else {
                run_channel(marketplace.as_ref(), &feed, &cancel, dry_run).await
            };
            let outcome = ChannelOutcome { channel, result };
            log_outcome(&outcome);
            outcomes.push(outcome);
        }
        outcomes
    };

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    info!(
        "Sync finished: {} channel(s) ok, {} failed",
        outcomes.len() - failed,
        failed
    );
    outcomes
}

async fn sync_concurrently(
    marketplaces: Vec<Box<dyn Marketplace>>,
    feed: Arc<Vec<FeedRow>>,
    cancel: CancellationToken,
    dry_run: bool,
) -> Vec<ChannelOutcome> {
    let handles: Vec<_> = marketplaces
        .into_iter()
        .map(|marketplace| {
            let channel = marketplace.name().to_string();
            let feed = Arc::clone(&feed);
            let cancel = cancel.clone();
            let handle = tokio::spawn(async move {
                run_channel(marketplace.as_ref(), &feed, &cancel, dry_run).await
            });
            (channel, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (channel, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(SyncError::Aborted(e.to_string())),
        };
        let outcome = ChannelOutcome { channel, result };
        log_outcome(&outcome);
        outcomes.push(outcome);
    }
    outcomes
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
