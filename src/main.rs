use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use release_feed::config::Config;
use release_feed::feed::FEED_URLS;
use release_feed::server::{self, AppState, LISTEN_ADDR, RELEASES_PATH};

#[derive(Parser, Debug)]
#[command(
    name = "release-feed",
    about = "Serve release announcements aggregated from GitHub Atom feeds"
)]
struct Args {
    /// Path to a TOML config file (optional; defaults apply when absent)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => Config::default(),
    };

    // No request timeout override: fetches use the transport's defaults
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .build()
        .context("Failed to build HTTP client")?;

    let listener = TcpListener::bind(LISTEN_ADDR)
        .await
        .with_context(|| format!("Failed to bind {LISTEN_ADDR}"))?;
    let port = listener
        .local_addr()
        .context("Failed to read listener address")?
        .port();

    tracing::info!(addr = LISTEN_ADDR, feeds = FEED_URLS.len(), "Listening");
    println!("Server is running on http://localhost:{port}{RELEASES_PATH}");

    server::serve(listener, AppState::new(client, FEED_URLS))
        .await
        .context("HTTP server failed")?;

    Ok(())
}
