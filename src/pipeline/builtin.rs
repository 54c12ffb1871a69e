//! Built-in stages for text items
//!
//! These are what the `with_builtins` registry hands out, and what the
//! binary's `pipeline` configuration can name.

use crate::crawler::Context;
use crate::http::Response;
use crate::pipeline::stage::{Stage, StageError};
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Drops items that are empty after trimming
#[derive(Debug, Default)]
pub struct DropEmpty;

#[async_trait(?Send)]
impl Stage<String> for DropEmpty {
    async fn process_item(
        &self,
        _ctx: Rc<Context>,
        response: Rc<Response>,
        item: String,
    ) -> Result<String, StageError> {
        if item.trim().is_empty() {
            return Err(StageError::drop(format!("empty item from {}", response.url())));
        }
        Ok(item)
    }
}

/// Trims surrounding whitespace
#[derive(Debug, Default)]
pub struct TrimWhitespace;

#[async_trait(?Send)]
impl Stage<String> for TrimWhitespace {
    async fn process_item(
        &self,
        _ctx: Rc<Context>,
        _response: Rc<Response>,
        item: String,
    ) -> Result<String, StageError> {
        Ok(item.trim().to_string())
    }
}

/// Drops items equal to one this stage already passed
///
/// The memory lives in the stage instance, so it spans every crawl of the
/// spider that owns it.
#[derive(Debug, Default)]
pub struct DedupItems {
    seen: RefCell<HashSet<String>>,
}

#[async_trait(?Send)]
impl Stage<String> for DedupItems {
    async fn process_item(
        &self,
        _ctx: Rc<Context>,
        _response: Rc<Response>,
        item: String,
    ) -> Result<String, StageError> {
        if !self.seen.borrow_mut().insert(item.clone()) {
            return Err(StageError::drop(format!("duplicate item: {}", item)));
        }
        Ok(item)
    }
}
