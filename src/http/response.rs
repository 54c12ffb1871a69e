use crate::http::document::{extract_links, extract_title, sniff_encoding};
use crate::SpiderError;
use bytes::Bytes;
use encoding_rs::Encoding;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use scraper::{ElementRef, Html, Selector};
use std::cell::OnceCell;
use std::collections::HashMap;
use url::Url;

/// Broad classification of a response body, decided once per fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Html,
    Xml,
    Text,
    Binary,
}

impl ResponseKind {
    /// Classifies a response from its Content-Type header
    ///
    /// A missing header is treated as HTML, the common case for crawled pages.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return Self::Html;
        };
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if mime == "text/html" || mime == "application/xhtml+xml" {
            Self::Html
        } else if mime.ends_with("/xml") || mime.ends_with("+xml") {
            Self::Xml
        } else if mime.starts_with("text/") || mime == "application/json" {
            Self::Text
        } else {
            Self::Binary
        }
    }

    /// Whether the body is expected to decode as text
    pub fn is_textual(&self) -> bool {
        !matches!(self, Self::Binary)
    }
}

/// A completed fetch
///
/// The body is captured in full before the response is built. Decoded text
/// and the parsed document are computed on first access and cached for the
/// lifetime of the response.
#[derive(Debug)]
pub struct Response {
    url: Url,
    status: u16,
    headers: HeaderMap,
    body: Bytes,
    kind: ResponseKind,
    meta: HashMap<String, String>,
    text: OnceCell<String>,
    document: OnceCell<Html>,
}

impl Response {
    pub fn new(url: Url, status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let kind = ResponseKind::from_content_type(
            headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        );

        Self {
            url,
            status,
            headers,
            body: body.into(),
            kind,
            meta: HashMap::new(),
            text: OnceCell::new(),
            document: OnceCell::new(),
        }
    }

    /// Carries the originating request's metadata onto the response
    pub fn with_meta(mut self, meta: HashMap<String, String>) -> Self {
        self.meta = meta;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    pub fn meta(&self) -> &HashMap<String, String> {
        &self.meta
    }

    /// Returns a header value if present and valid ASCII
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    /// The encoding used to decode the body: declared, sniffed, or UTF-8
    pub fn encoding(&self) -> &'static Encoding {
        sniff_encoding(self.content_type(), &self.body)
    }

    /// The body decoded to text, computed once
    pub fn text(&self) -> &str {
        self.text.get_or_init(|| {
            let (text, _, had_errors) = self.encoding().decode(&self.body);
            if had_errors {
                tracing::debug!("Replaced malformed bytes while decoding {}", self.url);
            }
            text.into_owned()
        })
    }

    /// The parsed document, computed once from `text()`
    pub fn document(&self) -> &Html {
        self.document
            .get_or_init(|| Html::parse_document(self.text()))
    }

    /// Runs a CSS query against the document
    pub fn css(&self, query: &str) -> Result<Vec<ElementRef<'_>>, SpiderError> {
        let selector = Selector::parse(query).map_err(|e| SpiderError::Selector {
            selector: query.to_string(),
            message: format!("{:?}", e),
        })?;
        Ok(self.document().select(&selector).collect())
    }

    /// Resolves a possibly relative URL against this response's URL
    pub fn urljoin(&self, href: &str) -> Result<Url, SpiderError> {
        Ok(self.url.join(href)?)
    }

    /// Absolute http(s) links found in the document
    ///
    /// Binary bodies have none.
    pub fn links(&self) -> Vec<Url> {
        if !self.kind.is_textual() {
            return Vec::new();
        }
        extract_links(self.document(), &self.url)
    }

    /// The trimmed `<title>` text, if any
    pub fn title(&self) -> Option<String> {
        if !self.kind.is_textual() {
            return None;
        }
        extract_title(self.document())
    }
}
