//! Sumi-Harvest: an asynchronous crawl-and-extract engine
//!
//! This crate fetches pages in waves, hands each response to an extraction
//! callback, follows the requests that callback emits and threads every
//! emitted item through an ordered pipeline of stages before yielding it to
//! the caller as a lazy stream.
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use sumi_harvest::crawler::{Callback, Emit, SpiderBuilder};
//! use sumi_harvest::http::Request;
//!
//! # async fn example() -> sumi_harvest::Result<()> {
//! let spider = SpiderBuilder::<String>::new()
//!     .parse(Callback::single(|response| async move {
//!         Ok(response.title().map(Emit::Item))
//!     }))
//!     .build()?;
//!
//! let items = spider.crawl(vec![Request::parse("https://example.com/")?]);
//! futures::pin_mut!(items);
//! while let Some(title) = items.next().await {
//!     println!("{}", title?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crawler;
pub mod http;
pub mod pipeline;

use thiserror::Error;

/// Main error type for Sumi-Harvest operations
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Callback failed for {url}: {source}")]
    Callback {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
///
/// These are always fatal: they surface when the spider is built or, for a
/// missing callback, when the first response that needs one is dispatched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown pipeline stage: '{0}'")]
    UnknownStage(String),

    #[error("No callback to handle response from {0}: set a per-request callback or a default parse callback")]
    MissingCallback(String),
}

/// Per-URL fetch failures
///
/// A fetch failure abandons that URL only; the crawl carries on with the
/// rest of the frontier.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}")]
    Connect { url: String },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

/// Result type alias for Sumi-Harvest operations
pub type Result<T> = std::result::Result<T, SpiderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Callback, Context, Emit, Spider, SpiderBuilder};
pub use http::{Request, Response};
pub use pipeline::{Pipeline, Stage, StageError, StageRegistry};
