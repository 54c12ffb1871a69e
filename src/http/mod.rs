//! Request and response model
//!
//! - `Request`: a pending fetch, with an optional callback override and metadata
//! - `Response`: a completed fetch with lazily decoded text and a parsed document
//! - `document`: HTML helpers for titles, links and charset sniffing

pub mod document;
mod request;
mod response;

pub use request::Request;
pub use response::{Response, ResponseKind};
pub use scraper::{ElementRef, Html};
