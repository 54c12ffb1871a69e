//! Extraction callbacks
//!
//! A callback is either single-shot (one future, zero or one emitted value)
//! or streaming (a lazy sequence of emitted values). `Callback::invoke`
//! turns both into the same `EmitStream` so the scheduler has a single
//! calling convention.

use crate::http::{Request, Response};
use futures::future::{self, LocalBoxFuture};
use futures::stream::{self, LocalBoxStream};
use futures::{FutureExt, Stream, StreamExt};
use std::future::Future;
use std::rc::Rc;

/// A value emitted by an extraction callback
pub enum Emit<I> {
    /// Follow this request
    Request(Request<I>),
    /// Follow this URL, resolved against the emitting response's URL
    Url(String),
    /// Keep this item; it goes through the pipeline
    Item(I),
}

impl<I> From<Request<I>> for Emit<I> {
    fn from(request: Request<I>) -> Self {
        Self::Request(request)
    }
}

/// The uniform output of an invoked callback
pub type EmitStream<I> = LocalBoxStream<'static, anyhow::Result<Emit<I>>>;

type SingleFn<I> = dyn Fn(Rc<Response>) -> LocalBoxFuture<'static, anyhow::Result<Option<Emit<I>>>>;
type StreamFn<I> = dyn Fn(Rc<Response>) -> EmitStream<I>;

/// A user extraction function
///
/// Errors returned by a callback are not contained: they end the crawl.
pub enum Callback<I> {
    Single(Rc<SingleFn<I>>),
    Stream(Rc<StreamFn<I>>),
}

impl<I: 'static> Callback<I> {
    /// Wraps an async function returning at most one emitted value
    pub fn single<F, Fut>(func: F) -> Self
    where
        F: Fn(Rc<Response>) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<Option<Emit<I>>>> + 'static,
    {
        Self::Single(Rc::new(move |response| func(response).boxed_local()))
    }

    /// Wraps a function producing a lazy sequence of emitted values
    pub fn stream<F, S>(func: F) -> Self
    where
        F: Fn(Rc<Response>) -> S + 'static,
        S: Stream<Item = anyhow::Result<Emit<I>>> + 'static,
    {
        Self::Stream(Rc::new(move |response| func(response).boxed_local()))
    }

    /// Runs the callback, always producing a stream
    ///
    /// A single-shot callback becomes a one-element stream, or an empty one
    /// when it returns `None`.
    pub fn invoke(&self, response: Rc<Response>) -> EmitStream<I> {
        match self {
            Self::Single(func) => stream::once(func(response))
                .filter_map(|result| future::ready(result.transpose()))
                .boxed_local(),
            Self::Stream(func) => func(response),
        }
    }
}

impl<I> Clone for Callback<I> {
    fn clone(&self) -> Self {
        match self {
            Self::Single(func) => Self::Single(Rc::clone(func)),
            Self::Stream(func) => Self::Stream(Rc::clone(func)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use reqwest::header::HeaderMap;
    use url::Url;

    fn response() -> Rc<Response> {
        Rc::new(Response::new(
            Url::parse("https://example.com/").unwrap(),
            200,
            HeaderMap::new(),
            Bytes::from_static(b"<html></html>"),
        ))
    }

    async fn items(callback: &Callback<u32>) -> Vec<u32> {
        callback
            .invoke(response())
            .filter_map(|emitted| async move {
                match emitted {
                    Ok(Emit::Item(item)) => Some(item),
                    _ => None,
                }
            })
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_single_and_stream_are_equivalent() {
        let single = Callback::single(|_response| async { Ok(Some(Emit::Item(7u32))) });
        let streaming = Callback::stream(|_response| stream::iter(vec![Ok(Emit::Item(7u32))]));

        assert_eq!(items(&single).await, vec![7]);
        assert_eq!(items(&streaming).await, vec![7]);
    }

    #[tokio::test]
    async fn test_single_returning_nothing_is_empty() {
        let single = Callback::single(|_response| async { Ok(None::<Emit<u32>>) });
        let emitted: Vec<_> = single.invoke(response()).collect().await;
        assert!(emitted.is_empty());
    }

    #[tokio::test]
    async fn test_single_error_is_passed_through() {
        let single =
            Callback::single(|_response| async { Err::<Option<Emit<u32>>, _>(anyhow::anyhow!("boom")) });
        let emitted: Vec<_> = single.invoke(response()).collect().await;
        assert_eq!(emitted.len(), 1);
        assert!(emitted[0].is_err());
    }

    #[tokio::test]
    async fn test_stream_callback_sees_response() {
        let streaming = Callback::stream(|response: Rc<Response>| {
            let status = response.status() as u32;
            stream::iter(vec![Ok(Emit::Item(status)), Ok(Emit::Item(status + 1))])
        });
        assert_eq!(items(&streaming).await, vec![200, 201]);
    }
}
