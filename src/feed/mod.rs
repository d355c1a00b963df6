//! Release feed retrieval and extraction.
//!
//! This module turns a fixed set of Atom release feeds into a sorted list of
//! [`ReleaseEntry`] records:
//!
//! - **Fetching**: Concurrent HTTP retrieval with all-or-nothing semantics
//! - **Parsing**: Atom XML to raw entries, with structural validation
//! - **Extraction**: Pattern-based field recovery from entry content
//! - **Aggregation**: Merge across feeds and sort by release id
//!
//! # Architecture
//!
//! - [`fetcher`] - Parallel GETs joined in input order
//! - [`parser`] - Event-based Atom parsing using `quick-xml`
//! - [`extractor`] - HTML-to-text rendering plus per-field regex lookups
//! - [`aggregator`] - Orchestration and ordering
//!
//! Failure granularity is deliberately asymmetric: a missing field degrades
//! to a sentinel value, but a failed fetch or malformed feed aborts the whole
//! aggregation with a [`FeedError`].
//!
//! # Example
//!
//! ```ignore
//! use release_feed::feed::{collect_releases, FEED_URLS};
//!
//! let client = reqwest::Client::new();
//! let releases = collect_releases(&client, &FEED_URLS).await?;
//! ```

mod aggregator;
mod error;
mod extractor;
mod fetcher;
mod parser;

pub use aggregator::{collect_releases, sort_releases, ReleasesResponse};
pub use error::{FeedError, FetchError};
pub use extractor::{
    extract_entry, extract_from_text, ReleaseEntry, NO_LINK, UNKNOWN, UNKNOWN_ID, WRAP_WIDTH,
};
pub use fetcher::fetch_all;
pub use parser::{parse_feed, RawEntry};

/// Release feeds aggregated by `/get-releases`.
pub const FEED_URLS: [&str; 3] = [
    "https://github.com/secureedumailproject/secureedumail/releases.atom",
    "https://github.com/secureedumailproject/secureedurest/releases.atom",
    "https://github.com/secureedumailproject/secureeducrypt/releases.atom",
];
