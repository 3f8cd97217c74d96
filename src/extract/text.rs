//! Shared text normalization for extracted fields

use regex::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

static BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|</p>|</div>|</li>").expect("valid regex"));

/// Collapse runs of whitespace (including non-breaking spaces) and trim
pub fn collapse_whitespace(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode the entities the portal emits
pub fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Turn an HTML fragment into plain text
///
/// Strips tags, decodes entities, collapses whitespace and trims.
/// `&amp;` is decoded last so `&amp;lt;` stays literal text.
pub fn clean_html(fragment: &str) -> String {
    let without_tags = TAG.replace_all(fragment, " ");
    collapse_whitespace(&decode_entities(&without_tags))
}

/// Like [`clean_html`] but keeps paragraph and line breaks as newlines
pub fn html_to_lines(fragment: &str) -> String {
    let marked = BREAK.replace_all(fragment, "\n");
    marked
        .lines()
        .map(clean_html)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Normalized text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}
