//! Stock Sync - supplier feed to marketplace reconciliation
//!
//! Reads the supplier's watch stock feed, matches it against the offers
//! listed on Ozon and on each Yandex Market campaign, and pushes the
//! resulting stock counts and prices in endpoint-sized chunks.

pub mod batch;
pub mod config;
pub mod error;
pub mod feed;
pub mod marketplace;
pub mod models;
pub mod normalize;
pub mod pager;
pub mod pipeline;
pub mod reconcile;

pub use config::{Args, Config, YandexTarget};
pub use error::{RecordKind, Result, SyncError, TransportError};
pub use feed::{load_feed, FeedSource};
pub use marketplace::{BatchLimits, Marketplace};
pub use models::{FeedRow, OfferIdSet, PriceRecord, Reconciliation, StockRecord, UploadReport};
pub use pipeline::{run_channel, sync_all, ChannelOutcome, SyncReport};
pub use reconcile::reconcile;
