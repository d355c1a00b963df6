use std::borrow::Cow;

use unicode_width::UnicodeWidthStr;

/// Longest entity name we attempt to decode (e.g. `#x1F600`).
const MAX_ENTITY_LEN: usize = 10;

/// Prefix rendered before each unordered list item.
const BULLET: &str = " * ";

/// Prefix rendered before every line of a `<blockquote>`.
const QUOTE_PREFIX: &str = "> ";

/// Calculates the display width of a string in terminal columns.
///
/// Wrapping is measured in columns rather than bytes so that CJK text and
/// emoji in release notes wrap at the same visual position as ASCII.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Converts an HTML fragment to plain text, word-wrapped at `width` columns.
///
/// The rendering mirrors what a reader would see in a plain-text mail client:
///
/// - Runs of whitespace collapse to a single space
/// - Paragraphs, headings, lists and blockquotes are separated by a blank
///   line (three before `<h1>`); `<div>`, `<li>` and table rows start a new
///   line; `<br>` is a hard line break; `<hr>` is a full-width row of dashes
/// - Headings are upper-cased, list items get a ` * ` (or `N. `) marker and
///   their wrapped lines are indented to line up after it
/// - Every line inside a `<blockquote>` starts with `> `
/// - Links render as `text [href]`, with the bracketed href wrapping as its
///   own word; a link without text renders its bare href, and fragment-only
///   links (`#...`) render their text only
/// - `<pre>` keeps its whitespace, `<img>` renders as `alt [src]`
/// - `<script>`, `<style>`, `<head>` and `<title>` are dropped
///
/// Prefixes count toward the line, so no line is wider than `width`.
/// Words wider than `width` are never split; they occupy a line of their own.
///
/// # Examples
///
/// ```
/// use release_feed::util::html_to_text;
///
/// let text = html_to_text("<p>Hello <b>world</b></p><p>Bye</p>", 130);
/// assert_eq!(text, "Hello world\n\nBye");
/// ```
pub fn html_to_text(html: &str, width: usize) -> String {
    let mut writer = TextWriter::new(width);
    let mut rest = html;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            writer.text(&decode_entities(rest));
            break;
        };

        if lt > 0 {
            writer.text(&decode_entities(&rest[..lt]));
            rest = &rest[lt..];
        }

        match parse_markup(rest) {
            Some((markup, len)) => {
                writer.markup(&markup);
                rest = &rest[len..];
            }
            None => {
                // A stray '<' that does not open a tag is literal text
                writer.text("<");
                rest = &rest[1..];
            }
        }
    }

    writer.finish()
}

/// Decodes HTML character references.
///
/// Handles the HTML 4 named references (which include the XML builtins) and
/// numeric references in decimal and hex. `&nbsp;` decodes to U+00A0, which
/// is not a word separator. References outside that set, and malformed ones,
/// are left as-is.
///
/// Returns `Cow::Borrowed` when the input contains no `&`.
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest[1..]
            .find(';')
            .filter(|&end| end > 0 && end <= MAX_ENTITY_LEN)
            .and_then(|end| decode_entity(&rest[1..=end]).map(|c| (c, end + 2)));

        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).filter(|&c| c != '\0');
    }
    named_entity(name)
}

/// The HTML 4 named character references.
fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        // XML builtins
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',

        // Latin-1
        "nbsp" => '\u{a0}',
        "iexcl" => '¡',
        "cent" => '¢',
        "pound" => '£',
        "curren" => '¤',
        "yen" => '¥',
        "brvbar" => '¦',
        "sect" => '§',
        "uml" => '¨',
        "copy" => '©',
        "ordf" => 'ª',
        "laquo" => '«',
        "not" => '¬',
        "shy" => '\u{ad}',
        "reg" => '®',
        "macr" => '¯',
        "deg" => '°',
        "plusmn" => '±',
        "sup2" => '²',
        "sup3" => '³',
        "acute" => '´',
        "micro" => 'µ',
        "para" => '¶',
        "middot" => '·',
        "cedil" => '¸',
        "sup1" => '¹',
        "ordm" => 'º',
        "raquo" => '»',
        "frac14" => '¼',
        "frac12" => '½',
        "frac34" => '¾',
        "iquest" => '¿',
        "Agrave" => 'À',
        "Aacute" => 'Á',
        "Acirc" => 'Â',
        "Atilde" => 'Ã',
        "Auml" => 'Ä',
        "Aring" => 'Å',
        "AElig" => 'Æ',
        "Ccedil" => 'Ç',
        "Egrave" => 'È',
        "Eacute" => 'É',
        "Ecirc" => 'Ê',
        "Euml" => 'Ë',
        "Igrave" => 'Ì',
        "Iacute" => 'Í',
        "Icirc" => 'Î',
        "Iuml" => 'Ï',
        "ETH" => 'Ð',
        "Ntilde" => 'Ñ',
        "Ograve" => 'Ò',
        "Oacute" => 'Ó',
        "Ocirc" => 'Ô',
        "Otilde" => 'Õ',
        "Ouml" => 'Ö',
        "times" => '×',
        "Oslash" => 'Ø',
        "Ugrave" => 'Ù',
        "Uacute" => 'Ú',
        "Ucirc" => 'Û',
        "Uuml" => 'Ü',
        "Yacute" => 'Ý',
        "THORN" => 'Þ',
        "szlig" => 'ß',
        "agrave" => 'à',
        "aacute" => 'á',
        "acirc" => 'â',
        "atilde" => 'ã',
        "auml" => 'ä',
        "aring" => 'å',
        "aelig" => 'æ',
        "ccedil" => 'ç',
        "egrave" => 'è',
        "eacute" => 'é',
        "ecirc" => 'ê',
        "euml" => 'ë',
        "igrave" => 'ì',
        "iacute" => 'í',
        "icirc" => 'î',
        "iuml" => 'ï',
        "eth" => 'ð',
        "ntilde" => 'ñ',
        "ograve" => 'ò',
        "oacute" => 'ó',
        "ocirc" => 'ô',
        "otilde" => 'õ',
        "ouml" => 'ö',
        "divide" => '÷',
        "oslash" => 'ø',
        "ugrave" => 'ù',
        "uacute" => 'ú',
        "ucirc" => 'û',
        "uuml" => 'ü',
        "yacute" => 'ý',
        "thorn" => 'þ',
        "yuml" => 'ÿ',

        // Latin Extended and spacing modifiers
        "OElig" => 'Œ',
        "oelig" => 'œ',
        "Scaron" => 'Š',
        "scaron" => 'š',
        "Yuml" => 'Ÿ',
        "fnof" => 'ƒ',
        "circ" => 'ˆ',
        "tilde" => '˜',

        // Greek
        "Alpha" => 'Α',
        "Beta" => 'Β',
        "Gamma" => 'Γ',
        "Delta" => 'Δ',
        "Epsilon" => 'Ε',
        "Zeta" => 'Ζ',
        "Eta" => 'Η',
        "Theta" => 'Θ',
        "Iota" => 'Ι',
        "Kappa" => 'Κ',
        "Lambda" => 'Λ',
        "Mu" => 'Μ',
        "Nu" => 'Ν',
        "Xi" => 'Ξ',
        "Omicron" => 'Ο',
        "Pi" => 'Π',
        "Rho" => 'Ρ',
        "Sigma" => 'Σ',
        "Tau" => 'Τ',
        "Upsilon" => 'Υ',
        "Phi" => 'Φ',
        "Chi" => 'Χ',
        "Psi" => 'Ψ',
        "Omega" => 'Ω',
        "alpha" => 'α',
        "beta" => 'β',
        "gamma" => 'γ',
        "delta" => 'δ',
        "epsilon" => 'ε',
        "zeta" => 'ζ',
        "eta" => 'η',
        "theta" => 'θ',
        "iota" => 'ι',
        "kappa" => 'κ',
        "lambda" => 'λ',
        "mu" => 'μ',
        "nu" => 'ν',
        "xi" => 'ξ',
        "omicron" => 'ο',
        "pi" => 'π',
        "rho" => 'ρ',
        "sigmaf" => 'ς',
        "sigma" => 'σ',
        "tau" => 'τ',
        "upsilon" => 'υ',
        "phi" => 'φ',
        "chi" => 'χ',
        "psi" => 'ψ',
        "omega" => 'ω',
        "thetasym" => 'ϑ',
        "upsih" => 'ϒ',
        "piv" => 'ϖ',

        // Punctuation
        "ensp" => '\u{2002}',
        "emsp" => '\u{2003}',
        "thinsp" => '\u{2009}',
        "zwnj" => '\u{200c}',
        "zwj" => '\u{200d}',
        "lrm" => '\u{200e}',
        "rlm" => '\u{200f}',
        "ndash" => '–',
        "mdash" => '—',
        "lsquo" => '‘',
        "rsquo" => '’',
        "sbquo" => '‚',
        "ldquo" => '“',
        "rdquo" => '”',
        "bdquo" => '„',
        "dagger" => '†',
        "Dagger" => '‡',
        "bull" => '•',
        "hellip" => '…',
        "permil" => '‰',
        "prime" => '′',
        "Prime" => '″',
        "lsaquo" => '‹',
        "rsaquo" => '›',
        "oline" => '‾',
        "frasl" => '⁄',
        "euro" => '€',

        // Letterlike symbols and arrows
        "image" => 'ℑ',
        "weierp" => '℘',
        "real" => 'ℜ',
        "trade" => '™',
        "alefsym" => 'ℵ',
        "larr" => '←',
        "uarr" => '↑',
        "rarr" => '→',
        "darr" => '↓',
        "harr" => '↔',
        "crarr" => '↵',
        "lArr" => '⇐',
        "uArr" => '⇑',
        "rArr" => '⇒',
        "dArr" => '⇓',
        "hArr" => '⇔',

        // Mathematical operators
        "forall" => '∀',
        "part" => '∂',
        "exist" => '∃',
        "empty" => '∅',
        "nabla" => '∇',
        "isin" => '∈',
        "notin" => '∉',
        "ni" => '∋',
        "prod" => '∏',
        "sum" => '∑',
        "minus" => '−',
        "lowast" => '∗',
        "radic" => '√',
        "prop" => '∝',
        "infin" => '∞',
        "ang" => '∠',
        "and" => '∧',
        "or" => '∨',
        "cap" => '∩',
        "cup" => '∪',
        "int" => '∫',
        "there4" => '∴',
        "sim" => '∼',
        "cong" => '≅',
        "asymp" => '≈',
        "ne" => '≠',
        "equiv" => '≡',
        "le" => '≤',
        "ge" => '≥',
        "sub" => '⊂',
        "sup" => '⊃',
        "nsub" => '⊄',
        "sube" => '⊆',
        "supe" => '⊇',
        "oplus" => '⊕',
        "otimes" => '⊗',
        "perp" => '⊥',
        "sdot" => '⋅',

        // Misc technical and shapes
        "lceil" => '⌈',
        "rceil" => '⌉',
        "lfloor" => '⌊',
        "rfloor" => '⌋',
        "lang" => '〈',
        "rang" => '〉',
        "loz" => '◊',
        "spades" => '♠',
        "clubs" => '♣',
        "hearts" => '♥',
        "diams" => '♦',
        _ => return None,
    };
    Some(c)
}

// ============================================================================
// Markup scanning
// ============================================================================

/// A single piece of markup found at a `<`.
#[derive(Debug, PartialEq)]
enum Markup<'a> {
    Open {
        name: String,
        attrs: &'a str,
        self_closing: bool,
    },
    Close {
        name: String,
    },
    /// Comments, doctypes and processing instructions
    Ignored,
}

/// Scans one tag starting at `s[0] == '<'`.
///
/// Returns the markup and the number of bytes it spans, or `None` when the
/// `<` does not start a well-formed tag.
fn parse_markup(s: &str) -> Option<(Markup<'_>, usize)> {
    if s.starts_with("<!--") {
        let len = s.find("-->").map_or(s.len(), |end| end + 3);
        return Some((Markup::Ignored, len));
    }

    if s.starts_with("<!") || s.starts_with("<?") {
        let len = s.find('>').map_or(s.len(), |end| end + 1);
        return Some((Markup::Ignored, len));
    }

    let closing = s.starts_with("</");
    let name_start = if closing { 2 } else { 1 };
    let name_len = s[name_start..]
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if name_len == 0 {
        return None;
    }
    let name_end = name_start + name_len;
    let name = s[name_start..name_end].to_ascii_lowercase();

    let gt = find_tag_end(&s[name_end..])? + name_end;
    let attrs = &s[name_end..gt];

    let markup = if closing {
        Markup::Close { name }
    } else {
        Markup::Open {
            name,
            attrs,
            self_closing: attrs.trim_end().ends_with('/'),
        }
    };

    Some((markup, gt + 1))
}

/// Finds the `>` that ends a tag, skipping over quoted attribute values.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote = None;
    for (idx, b) in s.bytes().enumerate() {
        match (quote, b) {
            (None, b'>') => return Some(idx),
            (None, b'"' | b'\'') => quote = Some(b),
            (Some(q), _) if q == b => quote = None,
            _ => {}
        }
    }
    None
}

/// Extracts the value of an attribute from a tag's attribute section.
///
/// Matching on the name is case-insensitive and requires the name to start
/// at a word boundary, so `href` does not match `data-href`. Quoted and
/// unquoted values are both accepted.
fn attr_value<'a>(attrs: &'a str, attr_name: &str) -> Option<&'a str> {
    let lower = attrs.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(found) = lower[search_from..].find(attr_name) {
        let start = search_from + found;
        let after_name = start + attr_name.len();
        search_from = after_name;

        let at_boundary = lower[..start]
            .chars()
            .next_back()
            .is_none_or(|c| c.is_ascii_whitespace());
        if !at_boundary {
            continue;
        }

        let rest = attrs[after_name..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();

        return match rest.as_bytes().first() {
            Some(&quote @ (b'"' | b'\'')) => {
                let inner = &rest[1..];
                let end = inner.find(quote as char)?;
                Some(&inner[..end])
            }
            Some(_) => {
                let end = rest
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                Some(rest[..end].trim_end_matches('/'))
            }
            None => None,
        };
    }

    None
}

// ============================================================================
// Text layout
// ============================================================================

struct Anchor {
    href: Option<String>,
    /// Word count when the anchor opened; unchanged at close means no link text
    words_at_open: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum IndentKind {
    ListItem,
    Quote,
}

/// A block that prefixes every line it contains.
///
/// List items print their marker on the first line and pad continuation lines
/// to the same width; blockquotes print `> ` on every line.
struct Indent {
    kind: IndentKind,
    /// List nesting level the item belongs to (unused for quotes)
    depth: usize,
    first: Option<String>,
    rest: String,
}

/// Characters that separate words outside `<pre>`. Unlike
/// `char::is_whitespace`, this leaves U+00A0 (`&nbsp;`) inside the word.
fn is_html_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c' | '\u{200b}')
}

/// Accumulates rendered text, handling block spacing and word wrap.
struct TextWriter {
    width: usize,
    out: String,
    line: String,
    line_width: usize,
    pending_space: bool,
    pending_breaks: usize,
    indents: Vec<Indent>,
    words: usize,
    skip_depth: usize,
    pre_depth: usize,
    uppercase_depth: usize,
    /// `None` for `<ul>`, `Some(counter)` for `<ol>`
    lists: Vec<Option<usize>>,
    anchors: Vec<Anchor>,
}

impl TextWriter {
    fn new(width: usize) -> Self {
        Self {
            width,
            out: String::new(),
            line: String::new(),
            line_width: 0,
            pending_space: false,
            pending_breaks: 0,
            indents: Vec::new(),
            words: 0,
            skip_depth: 0,
            pre_depth: 0,
            uppercase_depth: 0,
            lists: Vec::new(),
            anchors: Vec::new(),
        }
    }

    fn has_content(&self) -> bool {
        !self.out.is_empty() || !self.line.is_empty()
    }

    /// Requests at least `n` line breaks before the next word (block spacing).
    fn block(&mut self, n: usize) {
        if self.has_content() {
            self.pending_breaks = self.pending_breaks.max(n);
        }
    }

    /// Adds one line break before the next word; consecutive `<br>`s stack.
    fn hard_break(&mut self) {
        if self.has_content() {
            self.pending_breaks += 1;
        }
    }

    fn flush_line(&mut self) {
        self.out.push_str(self.line.trim_end());
        self.line.clear();
        self.line_width = 0;
    }

    fn apply_pending_breaks(&mut self) {
        if self.pending_breaks == 0 {
            return;
        }
        self.flush_line();
        for _ in 0..self.pending_breaks {
            self.out.push('\n');
        }
        self.pending_breaks = 0;
        self.pending_space = false;
    }

    /// Writes the enclosing list markers and quote prefixes onto an empty line.
    fn start_line(&mut self) {
        for indent in &mut self.indents {
            match indent.first.take() {
                Some(first) => self.line.push_str(&first),
                None => self.line.push_str(&indent.rest),
            }
        }
        self.line_width = display_width(&self.line);
    }

    /// Columns taken by continuation prefixes at the current nesting.
    fn indent_width(&self) -> usize {
        self.indents.iter().map(|i| display_width(&i.rest)).sum()
    }

    fn emit_word(&mut self, word: &str) {
        self.apply_pending_breaks();
        let word_width = display_width(word);

        if !self.line.is_empty() && self.pending_space {
            if self.line_width + 1 + word_width > self.width {
                self.flush_line();
                self.out.push('\n');
            } else {
                self.line.push(' ');
                self.line_width += 1;
            }
        }
        if self.line.is_empty() {
            self.start_line();
        }

        self.line.push_str(word);
        self.line_width += word_width;
        self.pending_space = false;
        self.words += 1;
    }

    fn text(&mut self, s: &str) {
        if self.skip_depth > 0 {
            return;
        }
        if self.pre_depth > 0 {
            self.preformatted(s);
            return;
        }

        if s.starts_with(is_html_space) {
            self.pending_space = true;
        }
        let words = s.split(is_html_space).filter(|w| !w.is_empty());
        for (i, word) in words.enumerate() {
            if i > 0 {
                self.pending_space = true;
            }
            if self.uppercase_depth > 0 {
                self.emit_word(&word.to_uppercase());
            } else {
                self.emit_word(word);
            }
        }
        if s.ends_with(is_html_space) {
            self.pending_space = true;
        }
    }

    fn preformatted(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        self.apply_pending_breaks();
        if self.pending_space && !self.line.is_empty() {
            self.line.push(' ');
            self.line_width += 1;
        }
        self.pending_space = false;

        for (i, segment) in s.split('\n').enumerate() {
            if i > 0 {
                self.flush_line();
                self.out.push('\n');
            }
            if self.line.is_empty() {
                self.start_line();
            }
            self.line_width += display_width(segment);
            self.line.push_str(segment);
        }
        self.words += 1;
    }

    fn markup(&mut self, markup: &Markup<'_>) {
        match markup {
            Markup::Ignored => {}
            Markup::Open {
                name,
                attrs,
                self_closing,
            } => self.open(name, attrs, *self_closing),
            Markup::Close { name } => self.close(name),
        }
    }

    fn open(&mut self, name: &str, attrs: &str, self_closing: bool) {
        if matches!(name, "script" | "style" | "head" | "title") {
            if !self_closing {
                self.skip_depth += 1;
            }
            return;
        }
        if self.skip_depth > 0 {
            return;
        }

        match name {
            "br" => self.hard_break(),
            "p" => self.block(2),
            "hr" => self.rule(),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.block(if name == "h1" { 3 } else { 2 });
                if !self_closing {
                    self.uppercase_depth += 1;
                }
            }
            "ul" | "ol" => {
                self.block(2);
                if !self_closing {
                    self.lists.push((name == "ol").then_some(0));
                }
            }
            "li" => self.open_list_item(),
            "blockquote" => {
                self.block(2);
                if !self_closing {
                    self.indents.push(Indent {
                        kind: IndentKind::Quote,
                        depth: 0,
                        first: None,
                        rest: QUOTE_PREFIX.to_string(),
                    });
                }
            }
            "pre" => {
                self.block(2);
                if !self_closing {
                    self.pre_depth += 1;
                }
            }
            "div" | "table" | "tr" | "section" | "article" | "header" | "footer" | "details"
            | "summary" | "dl" | "dt" | "dd" | "figure" => self.block(1),
            "td" | "th" => self.pending_space = true,
            "a" if !self_closing => {
                let href = attr_value(attrs, "href").map(|h| decode_entities(h).into_owned());
                self.anchors.push(Anchor {
                    href,
                    words_at_open: self.words,
                });
            }
            "img" => {
                if let Some(alt) = attr_value(attrs, "alt").filter(|a| !a.is_empty()) {
                    self.text(&decode_entities(alt));
                }
                if let Some(src) = attr_value(attrs, "src").filter(|s| !s.is_empty()) {
                    self.pending_space = true;
                    self.emit_word(&format!("[{}]", decode_entities(src)));
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &str) {
        if matches!(name, "script" | "style" | "head" | "title") {
            self.skip_depth = self.skip_depth.saturating_sub(1);
            return;
        }
        if self.skip_depth > 0 {
            return;
        }

        match name {
            "p" => self.block(2),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.uppercase_depth = self.uppercase_depth.saturating_sub(1);
                self.block(2);
            }
            "ul" | "ol" => {
                let depth = self.lists.len();
                self.indents
                    .retain(|i| !(i.kind == IndentKind::ListItem && i.depth >= depth));
                self.lists.pop();
                self.block(2);
            }
            "li" => {
                self.pop_indent(IndentKind::ListItem);
                self.block(1);
            }
            "blockquote" => {
                self.pop_indent(IndentKind::Quote);
                self.block(2);
            }
            "pre" => {
                self.pre_depth = self.pre_depth.saturating_sub(1);
                self.block(2);
            }
            "div" | "table" | "tr" | "section" | "article" | "header" | "footer" | "details"
            | "summary" | "dl" | "dt" | "dd" | "figure" => self.block(1),
            "td" | "th" => self.pending_space = true,
            "a" => self.close_anchor(),
            _ => {}
        }
    }

    fn open_list_item(&mut self) {
        self.block(1);

        // `<li>` without a closing tag ends at the next sibling item
        let depth = self.lists.len();
        if self
            .indents
            .last()
            .is_some_and(|i| i.kind == IndentKind::ListItem && i.depth == depth)
        {
            self.indents.pop();
        }

        let marker = match self.lists.last_mut() {
            Some(Some(counter)) => {
                *counter += 1;
                format!("{counter}. ")
            }
            _ => BULLET.to_string(),
        };
        let rest = " ".repeat(display_width(&marker));
        self.indents.push(Indent {
            kind: IndentKind::ListItem,
            depth,
            first: Some(marker),
            rest,
        });
    }

    fn pop_indent(&mut self, kind: IndentKind) {
        if let Some(pos) = self.indents.iter().rposition(|i| i.kind == kind) {
            self.indents.truncate(pos);
        }
    }

    /// Renders `<hr>` as a row of dashes filling the available width.
    fn rule(&mut self) {
        self.block(2);
        let rule = "-".repeat(self.width.saturating_sub(self.indent_width()).max(1));
        self.emit_word(&rule);
        self.pending_breaks = 2;
    }

    fn close_anchor(&mut self) {
        let Some(anchor) = self.anchors.pop() else {
            return;
        };
        let Some(href) = anchor.href else {
            return;
        };
        if href.is_empty() || href.starts_with('#') {
            return;
        }

        if self.words > anchor.words_at_open {
            self.pending_space = true;
            self.emit_word(&format!("[{href}]"));
        } else {
            self.emit_word(&href);
        }
    }

    fn finish(mut self) -> String {
        self.flush_line();
        self.out.trim_start_matches('\n').trim_end().to_string()
    }
}
