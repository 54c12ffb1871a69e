use crate::crawler::Callback;
use crate::SpiderError;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// A pending fetch
///
/// Requests are built once and never change afterwards; the scheduler
/// consumes each one exactly once when it is dispatched.
pub struct Request<I> {
    url: Url,
    callback: Option<Callback<I>>,
    meta: HashMap<String, String>,
}

impl<I> Request<I> {
    /// Creates a request for `url` handled by the spider's default callback
    pub fn new(url: Url) -> Self {
        Self {
            url,
            callback: None,
            meta: HashMap::new(),
        }
    }

    /// Parses `url` and creates a request for it
    pub fn parse(url: &str) -> Result<Self, SpiderError> {
        Ok(Self::new(Url::parse(url)?))
    }

    /// Routes this request's response to `callback` instead of the default
    pub fn with_callback(mut self, callback: Callback<I>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Attaches a metadata entry, readable later from the response
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn callback(&self) -> Option<&Callback<I>> {
        self.callback.as_ref()
    }

    pub fn meta(&self) -> &HashMap<String, String> {
        &self.meta
    }
}

impl<I> Clone for Request<I> {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            callback: self.callback.clone(),
            meta: self.meta.clone(),
        }
    }
}

impl<I> fmt::Debug for Request<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("url", &self.url.as_str())
            .field("callback", &self.callback.is_some())
            .field("meta", &self.meta)
            .finish()
    }
}

impl<I> From<Url> for Request<I> {
    fn from(url: Url) -> Self {
        Self::new(url)
    }
}

impl<I> FromStr for Request<I> {
    type Err = SpiderError;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        Self::parse(url)
    }
}
