//! Error types for stock_sync

use std::fmt;

use thiserror::Error;

/// Failure of a single HTTP exchange with a marketplace or the feed host
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request did not complete within the client timeout
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    /// The remote host could not be reached
    #[error("connection failed: {0}")]
    Connection(#[source] reqwest::Error),
    /// Non-2xx answer, with whatever body the server sent back
    #[error("HTTP error {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Any other reqwest failure (building the request, reading the body, ...)
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    /// 2xx answer whose body did not have the expected shape
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err)
        } else if err.is_connect() {
            TransportError::Connection(err)
        } else {
            TransportError::Request(err)
        }
    }
}

impl TransportError {
    /// Timeouts and connection failures are expected from time to time
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout(_) | TransportError::Connection(_)
        )
    }
}

/// Which record stream a chunk belonged to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Stock,
    Price,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Stock => write!(f, "stock"),
            RecordKind::Price => write!(f, "price"),
        }
    }
}

/// Unified error type for a sync run
#[derive(Debug, Error)]
pub enum SyncError {
    /// Feed quantity was neither a known sentinel nor an integer
    #[error("invalid quantity '{0}'")]
    InvalidQuantity(String),
    /// Feed price had no digits before the decimal point
    #[error("invalid price '{0}'")]
    InvalidPrice(String),
    /// Listing the marketplace offers failed; nothing is returned
    #[error("failed to fetch offer page: {0}")]
    PageFetch(#[source] TransportError),
    /// A chunk push failed; earlier chunks stay applied
    #[error("failed to upload {kind} chunk #{chunk}: {source}")]
    Upload {
        kind: RecordKind,
        chunk: usize,
        #[source]
        source: TransportError,
    },
    /// Feed could not be loaded or contained an unusable row
    #[error("feed error: {0}")]
    Feed(String),
    /// Missing or inconsistent settings
    #[error("configuration error: {0}")]
    Config(String),
    /// The run was cancelled before all chunks were issued
    #[error("cancelled after {pushed} chunk(s)")]
    Cancelled { pushed: usize },
    /// A channel task panicked or was aborted
    #[error("channel task aborted: {0}")]
    Aborted(String),
}

impl SyncError {
    /// Timeouts and connection failures talking to a marketplace
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::PageFetch(source) | SyncError::Upload { source, .. } => {
                source.is_transient()
            }
            _ => false,
        }
    }
}

impl From<csv::Error> for SyncError {
    fn from(err: csv::Error) -> Self {
        SyncError::Feed(err.to_string())
    }
}

/// Result alias for stock_sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_error_names_kind_and_chunk() {
        let err = SyncError::Upload {
            kind: RecordKind::Price,
            chunk: 3,
            source: TransportError::Status {
                status: reqwest::StatusCode::BAD_REQUEST,
                body: "bad offer".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("price chunk #3"));
        assert!(msg.contains("bad offer"));
    }

    #[test]
    fn status_errors_are_not_transient() {
        let err = TransportError::Status {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn normalization_errors_are_not_transient() {
        assert!(!SyncError::InvalidPrice("n/a".to_string()).is_transient());
        assert!(!SyncError::Cancelled { pushed: 2 }.is_transient());
    }

    #[test]
    fn decode_error_converts_from_serde() {
        let serde_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: TransportError = serde_err.into();
        assert!(matches!(err, TransportError::Decode(_)));
    }
}
