//! Supplier feed loading.
//!
//! The supplier publishes its stock list as a spreadsheet export; this
//! module reads the CSV form of it, either from disk or over HTTP, into
//! [`FeedRow`]s. Exports carry a free-form preamble above the header row,
//! which is skipped with `skip_rows`.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

use log::{debug, info, warn};
use reqwest::Client;

use crate::error::{Result, SyncError};
use crate::models::FeedRow;

/// Where the feed comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Path(PathBuf),
    Url(String),
}

impl FeedSource {
    /// Anything starting with `http://` or `https://` is fetched, the rest is a path
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            FeedSource::Url(location.to_string())
        } else {
            FeedSource::Path(PathBuf::from(location))
        }
    }
}

/// Loads and validates the whole feed
pub async fn load_feed(client: &Client, source: &FeedSource, skip_rows: usize) -> Result<Vec<FeedRow>> {
    let rows = match source {
        FeedSource::Path(path) => {
            info!("Reading feed from {}", path.display());
            let file = std::fs::File::open(path)
                .map_err(|e| SyncError::Feed(format!("cannot open {}: {e}", path.display())))?;
            parse_feed(file, skip_rows)?
        }
        FeedSource::Url(url) => {
            info!("Downloading feed from {url}");
            let bytes = download(client, url).await?;
            parse_feed(bytes.as_slice(), skip_rows)?
        }
    };
    info!("Loaded {} feed row(s)", rows.len());
    Ok(rows)
}

async fn download(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SyncError::Feed(format!("download of {url} failed: {e}")))?;

    if !response.status().is_success() {
        return Err(SyncError::Feed(format!(
            "download of {url} failed: HTTP {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| SyncError::Feed(format!("download of {url} failed: {e}")))?;
    debug!("Downloaded {} byte(s) of feed", bytes.len());
    Ok(bytes.to_vec())
}

/// Parses a CSV feed after skipping `skip_rows` preamble lines.
///
/// Rows with an empty code (blank separators, totals at the bottom of the
/// export) are skipped. Codes are trimmed; everything else is kept as
/// written and normalised later.
pub fn parse_feed<R: Read>(reader: R, skip_rows: usize) -> Result<Vec<FeedRow>> {
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    for skipped in 0..skip_rows {
        line.clear();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| SyncError::Feed(format!("failed to skip preamble: {e}")))?;
        if read == 0 {
            return Err(SyncError::Feed(format!(
                "feed ended after {skipped} of {skip_rows} preamble line(s)"
            )));
        }
    }

    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut blank = 0usize;
    for record in csv_reader.deserialize::<FeedRow>() {
        let mut row = record?;
        row.code = row.code.trim().to_string();
        if row.code.is_empty() {
            blank += 1;
            continue;
        }
        rows.push(row);
    }

    if blank > 0 {
        warn!("Skipped {blank} feed row(s) without an item code");
    }
    Ok(rows)
}

#[cfg(test)]
#[path = "feed_tests.rs"]
mod tests;
