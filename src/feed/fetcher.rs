use crate::feed::error::{FeedError, FetchError};
use futures::future::join_all;
use futures::StreamExt;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Fetches every feed concurrently and returns the bodies in input order.
///
/// One GET is issued per URL without waiting for the others; the call then
/// waits until every request has settled (join-all, not race). Requests are
/// never cancelled because a sibling failed.
///
/// # Arguments
///
/// * `client` - HTTP client (caller controls configuration)
/// * `urls` - Feed URLs; the returned bodies are ordered to match
///
/// # Errors
///
/// Fails as a group: if any single fetch fails, every body is discarded and
/// a [`FeedError::Transport`] for the lowest failing index is returned.
/// There are no retries and no timeout beyond the client's own.
pub async fn fetch_all<S>(client: &reqwest::Client, urls: &[S]) -> Result<Vec<Vec<u8>>, FeedError>
where
    S: AsRef<str>,
{
    let requests = urls.iter().enumerate().map(|(index, url)| async move {
        let url = url.as_ref();
        fetch_one(client, url)
            .await
            .map_err(|source| FeedError::Transport {
                index,
                url: url.to_owned(),
                source,
            })
    });

    join_all(requests).await.into_iter().collect()
}

async fn fetch_one(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        tracing::debug!(feed = %url, status = %status, "Feed request returned error status");
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    tracing::debug!(feed = %url, bytes = bytes.len(), "Fetched feed");
    Ok(bytes)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
