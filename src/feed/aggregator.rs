use serde::Serialize;

use crate::feed::error::FeedError;
use crate::feed::extractor::{extract_entry, ReleaseEntry};
use crate::feed::fetcher::fetch_all;
use crate::feed::parser::parse_feed;

/// JSON body of a successful `/get-releases` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleasesResponse {
    pub entries: Vec<ReleaseEntry>,
}

/// Fetches, parses and extracts every feed, returning all releases sorted.
///
/// The result is a pure function of the fetched bodies: the same inputs
/// always produce the same entries in the same order.
///
/// # Errors
///
/// Any transport failure or structurally invalid feed fails the whole call;
/// no partial list is ever returned.
pub async fn collect_releases<S>(
    client: &reqwest::Client,
    urls: &[S],
) -> Result<Vec<ReleaseEntry>, FeedError>
where
    S: AsRef<str>,
{
    let bodies = fetch_all(client, urls).await?;

    let mut releases = Vec::new();
    for (index, body) in bodies.iter().enumerate() {
        let entries = parse_feed(body, index)?;
        releases.extend(entries.iter().map(extract_entry));
    }

    sort_releases(&mut releases);
    Ok(releases)
}

/// Sorts releases by `id`, highest first.
///
/// Entries without an id carry the `-1` sentinel and therefore sort after
/// every real id. The relative order of equal ids is not part of the contract.
pub fn sort_releases(releases: &mut [ReleaseEntry]) {
    releases.sort_by(|a, b| b.id.cmp(&a.id));
}
