use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::feed::parser::RawEntry;
use crate::util::html_to_text;

/// Column width used when rendering entry HTML to text.
///
/// The GitHub link pattern relies on the link label and the bracketed URL
/// landing on separate lines, which happens at this width for the release
/// notes these feeds publish.
pub const WRAP_WIDTH: usize = 130;

/// Sentinel for a missing or unparseable `id`.
pub const UNKNOWN_ID: i64 = -1;
/// Sentinel for missing text fields.
pub const UNKNOWN: &str = "Unknown";
/// Sentinel for missing link fields.
pub const NO_LINK: &str = "No link found";

static ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ID:\s*([0-9]+)").unwrap());
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Date:\s*([0-9-]+)").unwrap());
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Version:\s*([A-Za-z0-9_.]+)").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Tag:\s*([A-Za-z0-9_]+)").unwrap());
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Name:\s*'([^']+)'").unwrap());
static TYPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Type:\s*'([^']+)'").unwrap());
static DOWNLOAD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Download Link:\s*'(https://[^']+)'").unwrap());
static GITHUB_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"GitHub\n\[(https://[^\]]+)\]").unwrap());

/// Release metadata recovered from one feed entry.
///
/// Every field is always populated: a field whose pattern did not match
/// carries its sentinel ([`UNKNOWN_ID`], [`UNKNOWN`] or [`NO_LINK`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseEntry {
    pub id: i64,
    pub date: String,
    pub version: String,
    pub tag: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub download_link: String,
    pub github_link: String,
}

/// Extracts release metadata from an entry's content.
///
/// The HTML content is rendered to text wrapped at [`WRAP_WIDTH`] columns,
/// then each field is looked up independently; only the first occurrence of
/// each marker counts. Misses never fail, they fall back to sentinels.
pub fn extract_entry(entry: &RawEntry) -> ReleaseEntry {
    let text = html_to_text(&entry.content, WRAP_WIDTH);
    let release = extract_from_text(&text);

    if release.id == UNKNOWN_ID {
        tracing::debug!(title = %entry.title, "Entry has no parseable ID");
    }

    release
}

/// Applies the field patterns to already-rendered plain text.
pub fn extract_from_text(text: &str) -> ReleaseEntry {
    ReleaseEntry {
        id: first_capture(&ID_RE, text)
            .and_then(|digits| digits.parse().ok())
            .unwrap_or(UNKNOWN_ID),
        date: text_or(&DATE_RE, text, UNKNOWN),
        version: text_or(&VERSION_RE, text, UNKNOWN),
        tag: text_or(&TAG_RE, text, UNKNOWN),
        name: text_or(&NAME_RE, text, UNKNOWN),
        kind: text_or(&TYPE_RE, text, UNKNOWN),
        download_link: text_or(&DOWNLOAD_LINK_RE, text, NO_LINK),
        github_link: text_or(&GITHUB_LINK_RE, text, NO_LINK),
    }
}

fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn text_or(re: &Regex, text: &str, sentinel: &str) -> String {
    first_capture(re, text).unwrap_or(sentinel).to_string()
}
