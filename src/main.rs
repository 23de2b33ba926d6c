//! Stock Sync - supplier feed to Ozon / Yandex Market
//!
//! Loads the supplier stock feed once, then syncs stock and prices to every
//! configured marketplace channel. A failing channel is logged and the run
//! moves on to the next one.

use std::sync::Arc;

use clap::Parser;
use stock_sync::marketplace::http_client;
use stock_sync::{load_feed, sync_all, Args, Config};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    // Pick up credentials from .env before clap reads the environment
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };

    log::info!("Starting stock_sync...");
    if config.dry_run {
        log::info!("Dry run: nothing will be pushed");
    }

    let client = match http_client(config.timeout) {
        Ok(client) => client,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };

    let feed = match load_feed(&client, &config.feed, config.skip_rows).await {
        Ok(feed) => Arc::new(feed),
        Err(e) => {
            log::error!("Failed to load feed: {}", e);
            std::process::exit(1);
        }
    };

    // Ctrl-C lets the chunk in flight finish, then stops issuing new ones
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, finishing the current request...");
            on_signal.cancel();
        }
    });

    let marketplaces = config.marketplaces(&client);
    let outcomes = sync_all(
        marketplaces,
        feed,
        cancel,
        config.dry_run,
        config.concurrent,
    )
    .await;

    if outcomes.iter().any(|o| !o.is_success()) {
        std::process::exit(1);
    }
    log::info!("Sync completed successfully.");
}
