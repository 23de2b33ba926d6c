//! Command line / environment configuration.
//!
//! Credentials come from the same environment variables the deployment has
//! always used, so an existing `.env` keeps working. Every marketplace is
//! optional, but at least one channel must be fully configured.

use std::time::Duration;

use clap::Parser;
use log::{info, warn};
use reqwest::Client;

use crate::error::{Result, SyncError};
use crate::feed::FeedSource;
use crate::marketplace::{
    BatchLimits, Marketplace, OzonCredentials, OzonSeller, YandexChannel, YandexMarket,
    OZON_BATCH_LIMITS, YANDEX_BATCH_LIMITS,
};

/// Watch stock sync - pushes supplier stock and prices to Ozon and Yandex Market
#[derive(Parser, Debug, Clone)]
#[command(name = "stock_sync")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Supplier feed: CSV file path or http(s) URL
    #[arg(long, env = "FEED_LOCATION")]
    pub feed: String,

    /// Lines to skip before the CSV header row
    #[arg(long, default_value_t = 0)]
    pub skip_rows: usize,

    /// Timeout for every HTTP request, in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Reconcile and report without pushing anything
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Run channels as independent tasks instead of one after another
    #[arg(long, default_value_t = false)]
    pub concurrent: bool,

    /// Ozon seller client id
    #[arg(long, env = "CLIENT_ID")]
    pub ozon_client_id: Option<String>,

    /// Ozon seller API key
    #[arg(long, env = "SELLER_TOKEN", hide_env_values = true)]
    pub ozon_api_key: Option<String>,

    /// Yandex Market OAuth token
    #[arg(long, env = "MARKET_TOKEN", hide_env_values = true)]
    pub market_token: Option<String>,

    /// Yandex Market FBS campaign id
    #[arg(long, env = "FBS_ID")]
    pub fbs_campaign: Option<String>,

    /// Yandex Market FBS warehouse id
    #[arg(long, env = "WAREHOUSE_FBS_ID")]
    pub fbs_warehouse: Option<String>,

    /// Yandex Market DBS campaign id
    #[arg(long, env = "DBS_ID")]
    pub dbs_campaign: Option<String>,

    /// Yandex Market DBS warehouse id
    #[arg(long, env = "WAREHOUSE_DBS_ID")]
    pub dbs_warehouse: Option<String>,

    /// Stock records per Ozon request
    #[arg(long)]
    pub ozon_stock_batch: Option<usize>,

    /// Price records per Ozon request
    #[arg(long)]
    pub ozon_price_batch: Option<usize>,

    /// Stock records per Yandex Market FBS request
    #[arg(long)]
    pub fbs_stock_batch: Option<usize>,

    /// Price records per Yandex Market FBS request
    #[arg(long)]
    pub fbs_price_batch: Option<usize>,

    /// Stock records per Yandex Market DBS request
    #[arg(long)]
    pub dbs_stock_batch: Option<usize>,

    /// Price records per Yandex Market DBS request
    #[arg(long)]
    pub dbs_price_batch: Option<usize>,
}

/// A Yandex Market campaign together with its own request limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YandexTarget {
    pub channel: YandexChannel,
    pub limits: BatchLimits,
}

/// Validated settings for one run
#[derive(Debug, Clone)]
pub struct Config {
    pub feed: FeedSource,
    pub skip_rows: usize,
    pub timeout: Duration,
    pub dry_run: bool,
    pub concurrent: bool,
    pub ozon: Option<OzonCredentials>,
    pub ozon_limits: BatchLimits,
    pub market_token: Option<String>,
    pub yandex_channels: Vec<YandexTarget>,
}

/// Empty environment variables count as unset
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn limits(defaults: BatchLimits, stocks: Option<usize>, prices: Option<usize>) -> Result<BatchLimits> {
    let limits = BatchLimits {
        stocks: stocks.unwrap_or(defaults.stocks),
        prices: prices.unwrap_or(defaults.prices),
    };
    if limits.stocks == 0 || limits.prices == 0 {
        return Err(SyncError::Config("batch sizes must be at least 1".to_string()));
    }
    Ok(limits)
}

fn yandex_channel(
    label: &str,
    campaign: Option<String>,
    warehouse: Option<String>,
    limits: BatchLimits,
) -> Option<YandexTarget> {
    match (campaign, warehouse) {
        (Some(campaign_id), Some(warehouse_id)) => Some(YandexTarget {
            channel: YandexChannel {
                label: label.to_string(),
                campaign_id,
                warehouse_id,
            },
            limits,
        }),
        (None, None) => None,
        _ => {
            warn!(
                "Yandex Market {} needs both a campaign id and a warehouse id, skipping it",
                label.to_uppercase()
            );
            None
        }
    }
}

impl Config {
    /// Validates parsed arguments into a run configuration
    pub fn from_args(args: Args) -> Result<Self> {
        if args.timeout_secs == 0 {
            return Err(SyncError::Config("timeout must be at least 1 second".to_string()));
        }

        let ozon = match (present(args.ozon_client_id), present(args.ozon_api_key)) {
            (Some(client_id), Some(api_key)) => Some(OzonCredentials { client_id, api_key }),
            (None, None) => None,
            _ => {
                warn!("Ozon needs both CLIENT_ID and SELLER_TOKEN, skipping it");
                None
            }
        };

        let ozon_limits = limits(
            OZON_BATCH_LIMITS,
            args.ozon_stock_batch,
            args.ozon_price_batch,
        )?;
        let fbs_limits = limits(
            YANDEX_BATCH_LIMITS,
            args.fbs_stock_batch,
            args.fbs_price_batch,
        )?;
        let dbs_limits = limits(
            YANDEX_BATCH_LIMITS,
            args.dbs_stock_batch,
            args.dbs_price_batch,
        )?;

        let market_token = present(args.market_token);
        let mut yandex_channels: Vec<YandexTarget> = [
            yandex_channel(
                "fbs",
                present(args.fbs_campaign),
                present(args.fbs_warehouse),
                fbs_limits,
            ),
            yandex_channel(
                "dbs",
                present(args.dbs_campaign),
                present(args.dbs_warehouse),
                dbs_limits,
            ),
        ]
        .into_iter()
        .flatten()
        .collect();

        if market_token.is_none() && !yandex_channels.is_empty() {
            warn!("MARKET_TOKEN is not set, skipping Yandex Market");
            yandex_channels.clear();
        }

        if ozon.is_none() && yandex_channels.is_empty() {
            return Err(SyncError::Config(
                "no marketplace channel is fully configured".to_string(),
            ));
        }

        Ok(Self {
            feed: FeedSource::parse(&args.feed),
            skip_rows: args.skip_rows,
            timeout: Duration::from_secs(args.timeout_secs),
            dry_run: args.dry_run,
            concurrent: args.concurrent,
            ozon,
            ozon_limits,
            market_token,
            yandex_channels,
        })
    }

    /// One adapter per configured channel, Ozon first
    pub fn marketplaces(&self, client: &Client) -> Vec<Box<dyn Marketplace>> {
        let mut channels: Vec<Box<dyn Marketplace>> = Vec::new();

        if let Some(credentials) = &self.ozon {
            channels.push(Box::new(
                OzonSeller::new(client.clone(), credentials.clone())
                    .with_batch_limits(self.ozon_limits),
            ));
        }

        if let Some(token) = &self.market_token {
            for target in &self.yandex_channels {
                channels.push(Box::new(
                    YandexMarket::new(client.clone(), token.clone(), target.channel.clone())
                        .with_batch_limits(target.limits),
                ));
            }
        }

        info!("Configured {} marketplace channel(s)", channels.len());
        channels
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
