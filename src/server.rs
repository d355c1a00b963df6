//! HTTP surface: a single `GET /get-releases` route.
//!
//! Every request runs the full aggregation from scratch; nothing is cached
//! between requests. Failures of any kind are logged server-side and reported
//! to the caller as one fixed 500 body, so callers cannot tell transport and
//! structural failures apart.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::feed::{collect_releases, FeedError, ReleasesResponse};

/// Address the service listens on.
pub const LISTEN_ADDR: &str = "127.0.0.1:3001";

/// Route path served by [`router`].
pub const RELEASES_PATH: &str = "/get-releases";

/// Message returned to callers for every aggregation failure.
pub const FAILURE_MESSAGE: &str = "Failed to fetch or parse one or more Atom feeds";

/// Shared per-process state handed to the handler.
#[derive(Clone)]
pub struct AppState {
    client: reqwest::Client,
    feeds: Arc<[String]>,
}

impl AppState {
    pub fn new<I, S>(client: reqwest::Client, feeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client,
            feeds: feeds.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize)]
struct ApiErrorResponse {
    err: bool,
    msg: &'static str,
}

/// Boundary wrapper that maps any [`FeedError`] to the fixed 500 response.
struct ReleasesError(FeedError);

impl IntoResponse for ReleasesError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, feed_index = self.0.index(), "Failed to build releases response");

        let body = Json(ApiErrorResponse {
            err: true,
            msg: FAILURE_MESSAGE,
        });

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

impl IntoResponse for ReleasesResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(RELEASES_PATH, get(get_releases))
        .with_state(state)
}

/// Serves the router on an already-bound listener until the process exits.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

async fn get_releases(State(state): State<AppState>) -> Result<ReleasesResponse, ReleasesError> {
    let entries = collect_releases(&state.client, &state.feeds[..])
        .await
        .map_err(ReleasesError)?;

    tracing::info!(entries = entries.len(), feeds = state.feeds.len(), "Served releases");
    Ok(ReleasesResponse { entries })
}
