//! Item pipeline
//!
//! An ordered list of stages that every kept item is threaded through.
//!
//! # Short-circuit rules
//!
//! | Stage outcome | Effect | Log level |
//! |---------------|--------|-----------|
//! | `Ok(item)` | next stage gets `item` | - |
//! | `StageError::Drop` | item discarded | info |
//! | `StageError::DropError` | item discarded | error |
//! | `StageError::Failed` | item discarded | error, with the full error chain |
//!
//! A failing stage never aborts the crawl; only the item is lost.

mod builtin;
mod registry;
mod stage;

pub use builtin::{DedupItems, DropEmpty, TrimWhitespace};
pub use registry::StageRegistry;
pub use stage::{stage_fn, FnStage, Stage, StageError, StageSpec};

use crate::crawler::Context;
use crate::http::Response;
use crate::ConfigError;
use std::rc::Rc;

/// An ordered, fixed list of stages
pub struct Pipeline<I> {
    stages: Vec<Box<dyn Stage<I>>>,
}

impl<I: 'static> Pipeline<I> {
    pub fn new(stages: Vec<Box<dyn Stage<I>>>) -> Self {
        Self { stages }
    }

    /// Resolves every spec, failing on the first unknown registry key
    pub fn build(
        specs: Vec<StageSpec<I>>,
        registry: &StageRegistry<I>,
    ) -> Result<Self, ConfigError> {
        let stages = specs
            .into_iter()
            .map(|spec| match spec {
                StageSpec::Inline(stage) => Ok(stage),
                StageSpec::Named(key) => registry.resolve(&key),
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Built pipeline with {} stages", stages.len());
        Ok(Self::new(stages))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Passes `item` through every stage in order
    ///
    /// Returns `None` straight away for `None`, and whenever a stage stops
    /// the item.
    pub async fn process(
        &self,
        ctx: &Rc<Context>,
        response: &Rc<Response>,
        item: Option<I>,
    ) -> Option<I> {
        let mut item = item?;

        for stage in &self.stages {
            match stage
                .process_item(Rc::clone(ctx), Rc::clone(response), item)
                .await
            {
                Ok(next) => item = next,
                Err(StageError::Drop(reason)) => {
                    tracing::info!("{}: dropping item: {}", stage.name(), reason);
                    return None;
                }
                Err(StageError::DropError(reason)) => {
                    tracing::error!("{}: dropping item: {}", stage.name(), reason);
                    return None;
                }
                Err(StageError::Failed(e)) => {
                    tracing::error!("{}: exception: {:?}", stage.name(), e);
                    return None;
                }
            }
        }

        Some(item)
    }
}

impl<I: 'static> Default for Pipeline<I> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
