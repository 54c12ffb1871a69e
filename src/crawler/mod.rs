//! Crawler module: the wave scheduler and its collaborators
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `Fetch` capability
//! - The frontier queue and seen-URL set
//! - Normalizing extraction callbacks into one streaming shape
//! - The wave loop that fetches, dispatches and yields items

mod builder;
mod callback;
mod context;
mod fetcher;
mod frontier;
mod spider;
mod stats;

pub use builder::SpiderBuilder;
pub use callback::{Callback, Emit, EmitStream};
pub use context::Context;
pub use fetcher::{build_http_client, complete_fetch, dispatch_fetch, fetch_url, Fetch, Page};
pub use frontier::Frontier;
pub use spider::Spider;
pub use stats::CrawlStats;
