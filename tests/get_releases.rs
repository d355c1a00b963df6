//! Integration tests for the `/get-releases` endpoint.
//!
//! Each test starts three mock Atom feeds with wiremock and serves the real
//! router on an ephemeral local port, then talks to it over HTTP.

use pretty_assertions::assert_eq;
use release_feed::server::{router, AppState, FAILURE_MESSAGE, RELEASES_PATH};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROUTES: [&str; 3] = ["/mail.atom", "/rest.atom", "/crypt.atom"];

/// A release entry in the shape GitHub publishes, with escaped HTML content.
fn entry_xml(id: &str, version: &str) -> String {
    let html = format!(
        "<p>ID: {id}<br>\nDate: 2024-05-0{id}<br>\nVersion: {version}<br>\nTag: v{id}<br>\n\
         Name: 'Release {id}'<br>\nType: 'Stable'<br>\n\
         Download Link: 'https://downloads.example.com/{id}.zip'</p>\n\
         <p>Full changelog, checksums and source archives for this release are published on the project \
         page at <a href=\"https://github.com/example/project/releases/tag/v{id}\">GitHub</a></p>"
    );
    let escaped = html
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!(
        "<entry><id>tag:github.com,2008:Repository/1/v{id}</id><title>v{id}</title>\
         <content type=\"html\">{escaped}</content></entry>"
    )
}

fn feed_xml(entries: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <feed xmlns=\"http://www.w3.org/2005/Atom\" xml:lang=\"en-US\">\n\
         <title>Release notes</title>\n{}\n</feed>",
        entries.concat()
    )
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

fn atom(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("Content-Type", "application/atom+xml")
}

/// Serves the router against the three mock feeds; returns the endpoint URL.
async fn spawn_app(feeds: &MockServer) -> String {
    let urls: Vec<String> = ROUTES
        .iter()
        .map(|route| format!("{}{}", feeds.uri(), route))
        .collect();
    let state = AppState::new(reqwest::Client::new(), urls);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    format!("http://{addr}{RELEASES_PATH}")
}

async fn get(url: &str) -> (u16, String) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status().as_u16();
    (status, response.text().await.unwrap())
}

fn ids(body: &Value) -> Vec<i64> {
    body["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_releases_merged_and_sorted() {
    let feeds = MockServer::start().await;
    mount(&feeds, ROUTES[0], atom(feed_xml(&[entry_xml("5", "1.0.5")]))).await;
    mount(&feeds, ROUTES[1], atom(feed_xml(&[entry_xml("12", "2.1.0")]))).await;
    mount(&feeds, ROUTES[2], atom(feed_xml(&[entry_xml("3", "0.3.0")]))).await;

    let url = spawn_app(&feeds).await;
    let (status, body) = get(&url).await;

    assert_eq!(status, 200);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ids(&body), vec![12, 5, 3]);
}

#[tokio::test]
async fn test_entry_fields_extracted() {
    let feeds = MockServer::start().await;
    mount(&feeds, ROUTES[0], atom(feed_xml(&[entry_xml("7", "1.7.0")]))).await;
    mount(&feeds, ROUTES[1], atom(feed_xml(&[entry_xml("8", "1.8.0")]))).await;
    mount(&feeds, ROUTES[2], atom(feed_xml(&[entry_xml("9", "1.9.0")]))).await;

    let url = spawn_app(&feeds).await;
    let (_, body) = get(&url).await;
    let body: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(
        body["entries"][0],
        json!({
            "id": 9,
            "date": "2024-05-09",
            "version": "1.9.0",
            "tag": "v9",
            "name": "Release 9",
            "type": "Stable",
            "downloadLink": "https://downloads.example.com/9.zip",
            "githubLink": "https://github.com/example/project/releases/tag/v9",
        })
    );
}

#[tokio::test]
async fn test_missing_markers_use_sentinels_and_sort_last() {
    let bare = "<entry><title>notes only</title>\
                <content type=\"html\">&lt;p&gt;Bug fixes.&lt;/p&gt;</content></entry>"
        .to_string();

    let feeds = MockServer::start().await;
    mount(&feeds, ROUTES[0], atom(feed_xml(&[bare]))).await;
    mount(&feeds, ROUTES[1], atom(feed_xml(&[entry_xml("1", "0.1.0")]))).await;
    mount(&feeds, ROUTES[2], atom(feed_xml(&[entry_xml("2", "0.2.0")]))).await;

    let url = spawn_app(&feeds).await;
    let (status, body) = get(&url).await;
    assert_eq!(status, 200);

    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ids(&body), vec![2, 1, -1]);
    assert_eq!(
        body["entries"][2],
        json!({
            "id": -1,
            "date": "Unknown",
            "version": "Unknown",
            "tag": "Unknown",
            "name": "Unknown",
            "type": "Unknown",
            "downloadLink": "No link found",
            "githubLink": "No link found",
        })
    );
}

#[tokio::test]
async fn test_single_entry_feed_yields_one_entry() {
    let feeds = MockServer::start().await;
    mount(&feeds, ROUTES[0], atom(feed_xml(&[entry_xml("4", "4.0.0")]))).await;
    mount(
        &feeds,
        ROUTES[1],
        atom(feed_xml(&[entry_xml("6", "6.0.0"), entry_xml("5", "5.0.0")])),
    )
    .await;
    mount(&feeds, ROUTES[2], atom(feed_xml(&[entry_xml("1", "1.0.0")]))).await;

    let url = spawn_app(&feeds).await;
    let (_, body) = get(&url).await;
    let body: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(ids(&body), vec![6, 5, 4, 1]);
}

#[tokio::test]
async fn test_html_entities_in_feed_xml_still_served() {
    let noisy = entry_xml("5", "1.0.5")
        .replace("<title>v5</title>", "<title>v5 &hellip; &ldquo;final&rdquo;</title>")
        .replace("Type: 'Stable'", "Type: 'Stable&nbsp;build'");

    let feeds = MockServer::start().await;
    mount(&feeds, ROUTES[0], atom(feed_xml(&[noisy]))).await;
    mount(&feeds, ROUTES[1], atom(feed_xml(&[entry_xml("4", "1.0.4")]))).await;
    mount(&feeds, ROUTES[2], atom(feed_xml(&[entry_xml("3", "0.3.0")]))).await;

    let url = spawn_app(&feeds).await;
    let (status, body) = get(&url).await;

    assert_eq!(status, 200);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ids(&body), vec![5, 4, 3]);
    assert_eq!(body["entries"][0]["type"], "Stable\u{a0}build");
    assert_eq!(body["entries"][0]["version"], "1.0.5");
}

#[tokio::test]
async fn test_non_2xx_feed_returns_fixed_500() {
    let feeds = MockServer::start().await;
    mount(&feeds, ROUTES[0], atom(feed_xml(&[entry_xml("5", "1.0.5")]))).await;
    mount(&feeds, ROUTES[1], ResponseTemplate::new(502)).await;
    mount(&feeds, ROUTES[2], atom(feed_xml(&[entry_xml("3", "0.3.0")]))).await;

    let url = spawn_app(&feeds).await;
    let (status, body) = get(&url).await;

    assert_eq!(status, 500);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({ "err": true, "msg": FAILURE_MESSAGE }));
    assert_eq!(
        body["msg"],
        "Failed to fetch or parse one or more Atom feeds"
    );
}

#[tokio::test]
async fn test_structural_error_returns_same_500() {
    let feeds = MockServer::start().await;
    mount(&feeds, ROUTES[0], atom(feed_xml(&[entry_xml("5", "1.0.5")]))).await;
    mount(&feeds, ROUTES[1], atom(feed_xml(&[]))).await;
    mount(&feeds, ROUTES[2], atom(feed_xml(&[entry_xml("3", "0.3.0")]))).await;

    let url = spawn_app(&feeds).await;
    let (status, body) = get(&url).await;

    assert_eq!(status, 500);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({ "err": true, "msg": FAILURE_MESSAGE }));
}

#[tokio::test]
async fn test_repeated_requests_are_byte_identical() {
    let feeds = MockServer::start().await;
    mount(&feeds, ROUTES[0], atom(feed_xml(&[entry_xml("2", "0.2.0")]))).await;
    mount(&feeds, ROUTES[1], atom(feed_xml(&[entry_xml("8", "0.8.0")]))).await;
    mount(&feeds, ROUTES[2], atom(feed_xml(&[entry_xml("5", "0.5.0")]))).await;

    let url = spawn_app(&feeds).await;
    let (_, first) = get(&url).await;
    let (_, second) = get(&url).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let feeds = MockServer::start().await;
    let url = spawn_app(&feeds).await;
    let other = url.replace(RELEASES_PATH, "/releases");

    let (status, _) = get(&other).await;
    assert_eq!(status, 404);
}
