//! The stage interface
//!
//! Every stage, whether backed by a struct or by an async closure, implements
//! `Stage`. A stage either returns the (possibly replaced) item or ends the
//! item's journey with one of the `StageError` variants.

use crate::crawler::Context;
use crate::http::Response;
use async_trait::async_trait;
use std::future::Future;
use std::rc::Rc;
use thiserror::Error;

/// Why a stage stopped an item
#[derive(Debug, Error)]
pub enum StageError {
    /// Expected filtering; logged at info level
    #[error("{0}")]
    Drop(String),

    /// The item was bad; logged at error level
    #[error("{0}")]
    DropError(String),

    /// Anything else went wrong; logged at error level with full detail
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl StageError {
    pub fn drop(reason: impl Into<String>) -> Self {
        Self::Drop(reason.into())
    }

    pub fn drop_error(reason: impl Into<String>) -> Self {
        Self::DropError(reason.into())
    }
}

/// One unit of the item pipeline
///
/// Stage instances are reused for every item of every crawl of a spider, so
/// any state a stage keeps is shared across items.
#[async_trait(?Send)]
pub trait Stage<I> {
    /// Name used in diagnostics; the implementing type's name by default
    fn name(&self) -> &str {
        short_type_name::<Self>()
    }

    async fn process_item(
        &self,
        ctx: Rc<Context>,
        response: Rc<Response>,
        item: I,
    ) -> Result<I, StageError>;
}

/// A stage backed by an async function
pub struct FnStage<F> {
    name: String,
    func: F,
}

impl<F> FnStage<F> {
    pub fn new<I, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Rc<Context>, Rc<Response>, I) -> Fut,
        Fut: Future<Output = Result<I, StageError>>,
    {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait(?Send)]
impl<I, F, Fut> Stage<I> for FnStage<F>
where
    I: 'static,
    F: Fn(Rc<Context>, Rc<Response>, I) -> Fut,
    Fut: Future<Output = Result<I, StageError>> + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn process_item(
        &self,
        ctx: Rc<Context>,
        response: Rc<Response>,
        item: I,
    ) -> Result<I, StageError> {
        (self.func)(ctx, response, item).await
    }
}

/// Shorthand for `FnStage::new`
pub fn stage_fn<I, F, Fut>(name: impl Into<String>, func: F) -> FnStage<F>
where
    F: Fn(Rc<Context>, Rc<Response>, I) -> Fut,
    Fut: Future<Output = Result<I, StageError>>,
{
    FnStage::new(name, func)
}

/// How a pipeline stage is specified before the pipeline is built
pub enum StageSpec<I> {
    /// A ready stage instance
    Inline(Box<dyn Stage<I>>),
    /// A key looked up in a `StageRegistry`
    Named(String),
}

impl<I: 'static> StageSpec<I> {
    pub fn inline<S: Stage<I> + 'static>(stage: S) -> Self {
        Self::Inline(Box::new(stage))
    }

    pub fn named(key: impl Into<String>) -> Self {
        Self::Named(key.into())
    }
}

/// `Type` from `crate::path::Type<Params>`
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
