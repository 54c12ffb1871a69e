//! The crawl loop
//!
//! A crawl runs in waves:
//! 1. Take every request currently in the frontier (up to the wave cap)
//! 2. Start one fetch task per request and wait for the slowest one
//! 3. In the order the requests were queued, hand each fetched response to
//!    its callback
//! 4. Queue emitted requests for a later wave; send emitted items through
//!    the pipeline and yield the survivors immediately
//!
//! until the frontier is empty. Frontier, callbacks and stages all run on
//! the task that polls the returned stream. Dropping the stream stops the
//! crawl before the next wave; fetches already started finish on their own
//! tasks and their results are discarded.

use crate::config::UserAgentConfig;
use crate::crawler::fetcher::{build_http_client, complete_fetch, dispatch_fetch, Fetch};
use crate::crawler::{Callback, Context, CrawlStats, Emit, Frontier, SpiderBuilder};
use crate::http::Request;
use crate::pipeline::Pipeline;
use crate::{ConfigError, SpiderError};
use async_stream::try_stream;
use futures::future::join_all;
use futures::{Stream, StreamExt};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

/// A configured crawler producing items of type `I`
///
/// A spider can run any number of crawls; each crawl gets its own frontier
/// and seen-URL set. Pipeline stage instances are shared by all of them.
pub struct Spider<I> {
    pub(crate) pipeline: Pipeline<I>,
    pub(crate) parse: Option<Callback<I>>,
    pub(crate) context: Rc<Context>,
    pub(crate) max_wave_size: Option<usize>,
    pub(crate) request_timeout: Duration,
    pub(crate) user_agent: Option<UserAgentConfig>,
}

impl<I: 'static> Spider<I> {
    pub fn builder() -> SpiderBuilder<I> {
        SpiderBuilder::new()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn pipeline(&self) -> &Pipeline<I> {
        &self.pipeline
    }

    pub fn track_urls(&self) -> bool {
        self.context.track_urls()
    }

    /// Crawls from `seeds` with an HTTP client owned by this crawl
    ///
    /// The client is released once the stream is gone and no fetch it
    /// started is still running.
    pub fn crawl<'a, S>(&'a self, seeds: S) -> impl Stream<Item = Result<I, SpiderError>> + 'a
    where
        S: IntoIterator<Item = Request<I>> + 'a,
    {
        try_stream! {
            let client = build_http_client(self.user_agent.as_ref(), self.request_timeout)
                .map_err(SpiderError::from)?;
            let mut items = Box::pin(self.crawl_with(seeds, Arc::new(client)));

            while let Some(item) = items.next().await {
                yield item?;
            }
            tracing::debug!("Crawl finished, releasing its HTTP client");
        }
    }

    /// Crawls from bare URL strings
    ///
    /// # Errors
    ///
    /// Fails before anything is fetched if any URL does not parse.
    pub fn crawl_urls<U>(
        &self,
        urls: U,
    ) -> Result<impl Stream<Item = Result<I, SpiderError>> + '_, SpiderError>
    where
        U: IntoIterator,
        U::Item: AsRef<str>,
    {
        let seeds = urls
            .into_iter()
            .map(|url| Request::parse(url.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.crawl(seeds))
    }

    /// Crawls from `seeds` through a caller-supplied fetcher
    ///
    /// The crawl holds a clone of `fetcher` and never closes it.
    ///
    /// # Errors
    ///
    /// The stream yields an error and ends when a callback fails or when a
    /// response has no callback to go to. Fetch failures and stage failures
    /// are logged and never end the crawl.
    pub fn crawl_with<'a, S, F>(
        &'a self,
        seeds: S,
        fetcher: Arc<F>,
    ) -> impl Stream<Item = Result<I, SpiderError>> + 'a
    where
        S: IntoIterator<Item = Request<I>> + 'a,
        F: Fetch + ?Sized + 'static,
    {
        try_stream! {
            let mut frontier = Frontier::new(self.track_urls());
            let mut stats = CrawlStats::new();

            for seed in seeds {
                frontier.enqueue(seed);
            }
            tracing::info!("Starting crawl with {} seed URLs", frontier.len());
            tracing::debug!(
                "Crawl context: {} extra values, track_urls={}",
                self.context.extra().len(),
                self.context.track_urls()
            );

            while !frontier.is_empty() {
                let wave = frontier.drain_wave(self.max_wave_size);
                stats.waves += 1;
                tracing::debug!(
                    "Wave {}: fetching {} URLs, {} left in frontier",
                    stats.waves,
                    wave.len(),
                    frontier.len()
                );

                let fetches: Vec<_> = wave
                    .iter()
                    .map(|request| dispatch_fetch(&fetcher, request))
                    .collect();
                let outcomes = join_all(fetches).await;

                for (request, outcome) in wave.into_iter().zip(outcomes) {
                    let response = match complete_fetch(&request, outcome) {
                        Some(response) => Rc::new(response),
                        None => {
                            stats.failed += 1;
                            tracing::error!("Can not proceed with: {}", request.url());
                            continue;
                        }
                    };
                    stats.fetched += 1;

                    let callback = self.callback_for(&request).map_err(SpiderError::from)?;
                    let mut emitted = callback.invoke(Rc::clone(&response));

                    while let Some(value) = emitted.next().await {
                        let value = value.map_err(|source| SpiderError::Callback {
                            url: response.url().to_string(),
                            source,
                        })?;

                        match value {
                            Emit::Request(next) => {
                                frontier.enqueue(next);
                            }
                            Emit::Url(href) => match response.urljoin(&href) {
                                Ok(url) => {
                                    frontier.enqueue(Request::new(url));
                                }
                                Err(e) => {
                                    tracing::warn!(
                                        "Skipping URL '{}' emitted from {}: {}",
                                        href,
                                        response.url(),
                                        e
                                    );
                                }
                            },
                            Emit::Item(item) => {
                                match self.pipeline.process(&self.context, &response, Some(item)).await {
                                    Some(item) => {
                                        stats.items_yielded += 1;
                                        yield item;
                                    }
                                    None => stats.items_dropped += 1,
                                }
                            }
                        }
                    }
                }
            }

            tracing::info!("Crawl complete: {}", stats);
        }
    }

    /// Runs a crawl to the end, discarding its items
    ///
    /// Useful when the pipeline stages do the real work.
    pub async fn exhaust<S>(&self, seeds: S) -> Result<(), SpiderError>
    where
        S: IntoIterator<Item = Request<I>>,
    {
        let seeds: Vec<Request<I>> = seeds.into_iter().collect();
        let mut items = Box::pin(self.crawl(seeds));
        while let Some(item) = items.next().await {
            item?;
        }
        Ok(())
    }

    /// Like `exhaust`, through a caller-supplied fetcher
    pub async fn exhaust_with<S, F>(&self, seeds: S, fetcher: Arc<F>) -> Result<(), SpiderError>
    where
        S: IntoIterator<Item = Request<I>>,
        F: Fetch + ?Sized + 'static,
    {
        let seeds: Vec<Request<I>> = seeds.into_iter().collect();
        let mut items = Box::pin(self.crawl_with(seeds, fetcher));
        while let Some(item) = items.next().await {
            item?;
        }
        Ok(())
    }

    /// The request's own callback, else the spider's default
    fn callback_for(&self, request: &Request<I>) -> Result<Callback<I>, ConfigError> {
        request
            .callback()
            .or(self.parse.as_ref())
            .cloned()
            .ok_or_else(|| ConfigError::MissingCallback(request.url().to_string()))
    }
}
