use crate::feed::error::FeedError;
use crate::util::decode_entities;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// One `<entry>` from an Atom feed, before field extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    /// Entry title text (empty when absent)
    pub title: String,
    /// Entry `<content>` with XML escaping removed; for `type="html"` this is
    /// the HTML markup itself. Empty when the element is absent.
    pub content: String,
}

/// Which entry child element is currently being captured.
#[derive(Debug, Clone, Copy)]
enum Capture {
    Title,
    Content,
}

/// Parses an Atom feed body into its entries.
///
/// The document must have a root `<feed>` element with at least one
/// `<entry>` child; anything else is a structural error that fails the
/// whole aggregation. A feed with a single entry and a feed with many both
/// yield a `Vec`, so callers never special-case the single-entry shape.
///
/// Element names are matched by local name, so namespace prefixes such as
/// `atom:entry` are accepted.
///
/// # Arguments
///
/// * `body` - Raw response bytes
/// * `index` - Position of this feed in the input list, reported in errors
///
/// # Errors
///
/// Returns [`FeedError::Structure`] if the XML is malformed, the root is not
/// `<feed>`, the feed contains no `<entry>` elements, or its only entry is
/// empty (no child elements and no text).
///
/// # Security
///
/// quick-xml (0.37) never parses `<!ENTITY>` declarations; text unescaping
/// only resolves the XML builtins and character references. Text holding any
/// other entity reference (`&hellip;`, `&nbsp;`, ...) falls back to HTML
/// entity decoding, which leaves names it does not know in place.
pub fn parse_feed(body: &[u8], index: usize) -> Result<Vec<RawEntry>, FeedError> {
    let structure = |reason: String| FeedError::Structure { index, reason };

    let mut reader = Reader::from_reader(body);

    let mut buf = Vec::new();
    let mut depth: usize = 0;
    let mut saw_feed = false;
    let mut entries = Vec::new();
    let mut current: Option<RawEntry> = None;
    let mut capture: Option<Capture> = None;
    // Whether each finished entry had any child element or text
    let mut populated: Vec<bool> = Vec::new();
    let mut current_populated = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                match depth {
                    0 => saw_feed = expect_feed_root(&e).map_err(structure)?,
                    1 if e.local_name().as_ref() == b"entry" => {
                        current = Some(RawEntry::default());
                        current_populated = false;
                    }
                    2 if current.is_some() => {
                        current_populated = true;
                        capture = match e.local_name().as_ref() {
                            b"title" => Some(Capture::Title),
                            b"content" => Some(Capture::Content),
                            _ => None,
                        };
                    }
                    _ => {
                        // Markup nested inside content (e.g. type="xhtml") is kept as HTML
                        if let (Some(target), Some(entry)) = (capture, current.as_mut()) {
                            let field = captured_field(entry, target);
                            field.push('<');
                            field.push_str(&String::from_utf8_lossy(&e));
                            field.push('>');
                        }
                    }
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => match depth {
                0 => saw_feed = expect_feed_root(&e).map_err(structure)?,
                1 if e.local_name().as_ref() == b"entry" => {
                    entries.push(RawEntry::default());
                    populated.push(false);
                }
                _ => {
                    if current.is_some() {
                        current_populated = true;
                    }
                    if depth > 2 {
                        if let (Some(target), Some(entry)) = (capture, current.as_mut()) {
                            let field = captured_field(entry, target);
                            field.push('<');
                            field.push_str(&String::from_utf8_lossy(&e));
                            field.push_str("/>");
                        }
                    }
                }
            },
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                match depth {
                    1 if e.local_name().as_ref() == b"entry" => {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                            populated.push(current_populated);
                        }
                    }
                    2 => capture = None,
                    d if d > 2 => {
                        if let (Some(target), Some(entry)) = (capture, current.as_mut()) {
                            let field = captured_field(entry, target);
                            field.push_str("</");
                            field.push_str(&String::from_utf8_lossy(e.name().as_ref()));
                            field.push('>');
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if current.is_some() && e.iter().any(|b| !b.is_ascii_whitespace()) {
                    current_populated = true;
                }
                if let (Some(target), Some(entry)) = (capture, current.as_mut()) {
                    let field = captured_field(entry, target);
                    match e.unescape() {
                        Ok(text) => field.push_str(&text),
                        Err(err) => {
                            tracing::debug!(index = index, error = %err, "Decoding entry text leniently");
                            field.push_str(&decode_entities(&String::from_utf8_lossy(&e)));
                        }
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if current.is_some() && !e.is_empty() {
                    current_populated = true;
                }
                if let (Some(target), Some(entry)) = (capture, current.as_mut()) {
                    captured_field(entry, target).push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(structure(format!(
                    "malformed XML at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_feed {
        return Err(structure("missing <feed> element".to_string()));
    }
    if entries.is_empty() {
        return Err(structure("<feed> contains no <entry> elements".to_string()));
    }
    if populated == [false] {
        return Err(structure("<feed> contains a single empty <entry>".to_string()));
    }

    for entry in &mut entries {
        let trimmed = entry.title.trim();
        if trimmed.len() != entry.title.len() {
            entry.title = trimmed.to_string();
        }
    }

    tracing::debug!(index = index, entries = entries.len(), "Parsed feed");
    Ok(entries)
}

/// Checks the document root is `<feed>`.
fn expect_feed_root(e: &BytesStart<'_>) -> Result<bool, String> {
    if e.local_name().as_ref() == b"feed" {
        Ok(true)
    } else {
        Err(format!(
            "root element is <{}>, expected <feed>",
            String::from_utf8_lossy(e.name().as_ref())
        ))
    }
}

fn captured_field(entry: &mut RawEntry, target: Capture) -> &mut String {
    match target {
        Capture::Title => &mut entry.title,
        Capture::Content => &mut entry.content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TWO_ENTRIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xml:lang="en-US">
  <id>tag:github.com,2008:https://github.com/example/project/releases</id>
  <title>Release notes from project</title>
  <entry>
    <id>tag:github.com,2008:Repository/1/v1.1.0</id>
    <title>v1.1.0</title>
    <content type="html">&lt;p&gt;ID: 2&lt;/p&gt;</content>
  </entry>
  <entry>
    <id>tag:github.com,2008:Repository/1/v1.0.0</id>
    <title>v1.0.0</title>
    <content type="html">&lt;p&gt;ID: 1&lt;/p&gt;</content>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_multiple_entries() {
        let entries = parse_feed(TWO_ENTRIES.as_bytes(), 0).unwrap();
        assert_eq!(
            entries,
            vec![
                RawEntry {
                    title: "v1.1.0".into(),
                    content: "<p>ID: 2</p>".into(),
                },
                RawEntry {
                    title: "v1.0.0".into(),
                    content: "<p>ID: 1</p>".into(),
                },
            ]
        );
    }

    #[test]
    fn test_single_entry_yields_one_element_vec() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry><title>only</title><content type="html">&lt;p&gt;ID: 7&lt;/p&gt;</content></entry>
</feed>"#;
        let entries = parse_feed(xml.as_bytes(), 0).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "<p>ID: 7</p>");
    }

    #[test]
    fn test_entry_without_content_is_empty_string() {
        let xml = "<feed><entry><title>bare</title></entry></feed>";
        let entries = parse_feed(xml.as_bytes(), 0).unwrap();
        assert_eq!(entries[0].content, "");
        assert_eq!(entries[0].title, "bare");
    }

    #[test]
    fn test_single_empty_entry_is_structural_error() {
        for xml in [
            "<feed><entry/></feed>",
            "<feed><entry></entry></feed>",
            "<feed><entry>\n  </entry></feed>",
        ] {
            let err = parse_feed(xml.as_bytes(), 1).unwrap_err();
            match &err {
                FeedError::Structure { index, reason } => {
                    assert_eq!(*index, 1);
                    assert!(reason.contains("empty <entry>"), "{xml}: {reason}");
                }
                e => panic!("Expected Structure error for {xml}, got {:?}", e),
            }
        }
    }

    #[test]
    fn test_empty_entry_among_others_is_kept() {
        let xml = "<feed><entry/><entry><content>ID: 4</content></entry></feed>";
        let entries = parse_feed(xml.as_bytes(), 0).unwrap();
        assert_eq!(
            entries,
            vec![
                RawEntry::default(),
                RawEntry {
                    title: String::new(),
                    content: "ID: 4".into(),
                },
            ]
        );
    }

    #[test]
    fn test_single_entry_with_only_unknown_child_is_kept() {
        let entries = parse_feed(b"<feed><entry><id>x</id></entry></feed>", 0).unwrap();
        assert_eq!(entries, vec![RawEntry::default()]);
    }

    #[test]
    fn test_html_entities_in_text_decoded_leniently() {
        let xml = "<feed><entry><title>A &hellip; B</title>\
                   <content type=\"html\">&lt;p&gt;ID: 1&nbsp;&mdash; Name: &#39;X&#39; &bogus;&lt;/p&gt;</content></entry></feed>";
        let entries = parse_feed(xml.as_bytes(), 0).unwrap();
        assert_eq!(entries[0].title, "A … B");
        assert_eq!(entries[0].content, "<p>ID: 1\u{a0}— Name: 'X' &bogus;</p>");
    }

    #[test]
    fn test_cdata_content() {
        let xml = "<feed><entry><content type=\"html\"><![CDATA[<p>Tag: v1</p>]]></content></entry></feed>";
        let entries = parse_feed(xml.as_bytes(), 0).unwrap();
        assert_eq!(entries[0].content, "<p>Tag: v1</p>");
    }

    #[test]
    fn test_xhtml_content_keeps_markup() {
        let xml = r#"<feed><entry><content type="xhtml"><div><p>ID: 3</p><br/></div></content></entry></feed>"#;
        let entries = parse_feed(xml.as_bytes(), 0).unwrap();
        assert_eq!(entries[0].content, "<div><p>ID: 3</p><br/></div>");
    }

    #[test]
    fn test_prefixed_namespace_accepted() {
        let xml = r#"<atom:feed xmlns:atom="http://www.w3.org/2005/Atom">
  <atom:entry><atom:content>ID: 9</atom:content></atom:entry>
</atom:feed>"#;
        let entries = parse_feed(xml.as_bytes(), 0).unwrap();
        assert_eq!(entries[0].content, "ID: 9");
    }

    #[test]
    fn test_nested_entry_elements_ignored() {
        // Only direct <entry> children of <feed> are entries
        let xml = "<feed><source><entry><content>x</content></entry></source>\
                   <entry><title>outer</title></entry></feed>";
        let entries = parse_feed(xml.as_bytes(), 0).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "outer");
        assert_eq!(entries[0].content, "");
    }

    #[test]
    fn test_feed_without_entries_is_structural_error() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#;
        let err = parse_feed(xml.as_bytes(), 2).unwrap_err();
        match &err {
            FeedError::Structure { index, reason } => {
                assert_eq!(*index, 2);
                assert!(reason.contains("no <entry>"));
            }
            e => panic!("Expected Structure error, got {:?}", e),
        }
        assert!(err.to_string().contains("feed at index 2"));
    }

    #[test]
    fn test_rss_document_is_structural_error() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><item><guid>1</guid></item></channel></rss>"#;
        let err = parse_feed(rss.as_bytes(), 1).unwrap_err();
        assert!(matches!(err, FeedError::Structure { index: 1, .. }));
        assert!(err.to_string().contains("<rss>"));
    }

    #[test]
    fn test_empty_body_is_structural_error() {
        let err = parse_feed(b"", 0).unwrap_err();
        assert!(matches!(err, FeedError::Structure { index: 0, .. }));
    }

    #[test]
    fn test_malformed_xml_is_structural_error() {
        let err = parse_feed(b"<feed><entry></feed>", 0).unwrap_err();
        assert!(matches!(err, FeedError::Structure { index: 0, .. }));
    }

    #[test]
    fn test_custom_entity_not_expanded() {
        let xml = r#"<?xml version="1.0"?>
<!DOCTYPE feed [<!ENTITY xxe "expanded">]>
<feed><entry><content>&xxe;</content></entry></feed>"#;
        let result = parse_feed(xml.as_bytes(), 0);
        // Either rejected outright or left unexpanded, never substituted
        if let Ok(entries) = result {
            assert!(!entries[0].content.contains("expanded"));
        }
    }
}
