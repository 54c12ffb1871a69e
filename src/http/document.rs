//! HTML document helpers
//!
//! This module works on parsed documents to extract:
//! - Links to follow (from `<a>` tags and canonical links)
//! - Page title
//!
//! and on raw bodies to pick the character encoding used for decoding.

use encoding_rs::{Encoding, UTF_8};
use scraper::{Html, Selector};
use url::Url;

/// How many leading body bytes are scanned for a `<meta charset>` declaration
const SNIFF_WINDOW: usize = 1024;

/// Extracts the page title from the HTML document
pub fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts all followable links from the HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
/// - Anything that is not http(s) after resolution
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL, or `None` if it should be skipped
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url)
        }
        _ => None,
    }
}

/// Picks the encoding for a body
///
/// Order: `charset=` in the Content-Type header, then a `charset=` found in
/// the first bytes of the body, then UTF-8. A byte-order mark still wins at
/// decode time.
pub fn sniff_encoding(content_type: Option<&str>, body: &[u8]) -> &'static Encoding {
    content_type
        .and_then(charset_label)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| {
            let head = &body[..body.len().min(SNIFF_WINDOW)];
            let head = String::from_utf8_lossy(head).to_ascii_lowercase();
            charset_label(&head).and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or(UTF_8)
}

/// Returns the value following the first `charset=` in `text`
fn charset_label(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let start = lower.find("charset=")? + "charset=".len();
    let label: String = lower[start..]
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        .collect();

    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}
