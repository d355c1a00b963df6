//! Aggregates release announcements from a fixed set of GitHub Atom feeds
//! and serves them as JSON from `GET /get-releases`.

pub mod config;
pub mod feed;
pub mod server;
pub mod util;
