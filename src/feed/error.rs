use thiserror::Error;

/// Errors from retrieving a single feed body.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, transport timeout, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// Errors that fail a whole release aggregation.
///
/// Only two kinds exist: a feed could not be retrieved, or a retrieved feed
/// does not have the expected Atom structure. Per-field extraction misses are
/// not errors; they fall back to sentinel values instead.
///
/// `index` is the position of the offending feed in the input URL list.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Fetching the feed failed (network, non-2xx status, timeout, size limit)
    #[error("Failed to fetch feed at index {index} ({url}): {source}")]
    Transport {
        index: usize,
        url: String,
        #[source]
        source: FetchError,
    },
    /// The feed body is not an Atom `<feed>` containing `<entry>` elements
    #[error("Unexpected XML structure for feed at index {index}: {reason}")]
    Structure { index: usize, reason: String },
}

impl FeedError {
    /// Index of the feed that caused the failure.
    pub fn index(&self) -> usize {
        match self {
            FeedError::Transport { index, .. } | FeedError::Structure { index, .. } => *index,
        }
    }
}
