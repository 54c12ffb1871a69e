//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - The `Fetch` capability the scheduler dispatches through
//! - Running each fetch of a wave as its own task
//! - Reading the full body before the connection is released
//! - Error classification
//!
//! Each call makes exactly one attempt; there is no retry.

use crate::config::UserAgentConfig;
use crate::http::{Request, Response};
use crate::FetchError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use url::Url;

/// A successfully fetched page, body already read
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects
    pub url: Url,
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Page body content
    pub body: Bytes,
}

/// The capability of fetching one URL
///
/// A non-success status must be reported as an error, not as a page.
/// Fetches run on their own tasks, so implementations must be shareable
/// across them.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError>;
}

#[async_trait]
impl Fetch for Client {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        fetch_url(self, url).await
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration; the crate name and version
///   are used when absent
/// * `timeout` - Per-request timeout, surfaced as a fetch failure
pub fn build_http_client(
    user_agent: Option<&UserAgentConfig>,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let user_agent = user_agent.map(UserAgentConfig::header_value).unwrap_or_else(|| {
        format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    });

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL, reading the whole body
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx | `Page` |
/// | Any other status | `FetchError::Status` |
/// | Timeout | `FetchError::Timeout` |
/// | Connection refused / TLS | `FetchError::Connect` |
/// | Anything else | `FetchError::Transport` |
pub async fn fetch_url(client: &Client, url: &Url) -> Result<Page, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let final_url = response.url().clone();
    let headers = response.headers().clone();

    // Consumes the response, so the connection goes back to the pool only
    // after the body is fully in memory.
    let body = response.bytes().await.map_err(|e| classify_error(url, e))?;

    Ok(Page {
        url: final_url,
        status: status.as_u16(),
        headers,
        body,
    })
}

/// Starts fetching a request on its own task
///
/// Dropping the handle detaches the task: the fetch still runs to the end.
pub fn dispatch_fetch<F, I>(
    fetcher: &Arc<F>,
    request: &Request<I>,
) -> JoinHandle<Result<Page, FetchError>>
where
    F: Fetch + ?Sized + 'static,
{
    let fetcher = Arc::clone(fetcher);
    let url = request.url().clone();
    tokio::spawn(async move { fetcher.fetch(&url).await })
}

/// Wraps a finished fetch in a `Response`
///
/// Failures are logged with the URL and cause and turned into `None`: the
/// URL is abandoned and no callback will see it.
pub fn complete_fetch<I>(
    request: &Request<I>,
    outcome: Result<Result<Page, FetchError>, JoinError>,
) -> Option<Response> {
    match outcome {
        Ok(Ok(page)) => {
            tracing::debug!("Fetched {} ({} bytes)", page.url, page.body.len());
            Some(
                Response::new(page.url, page.status, page.headers, page.body)
                    .with_meta(request.meta().clone()),
            )
        }
        Ok(Err(e)) => {
            tracing::error!("url: {}: error: {}", request.url(), e);
            None
        }
        Err(e) => {
            tracing::error!("url: {}: fetch task failed: {}", request.url(), e);
            None
        }
    }
}

fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_connect() {
        FetchError::Connect { url }
    } else {
        FetchError::Transport {
            url,
            message: error.to_string(),
        }
    }
}
