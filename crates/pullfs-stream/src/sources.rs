//! Ready-made sources.

use std::error::Error;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use crate::error::StreamError;
use crate::source::{End, Source, Step};

/// Source yielding the items of an iterator, then a normal end.
pub struct Values<I> {
    iter: Option<I>,
    ended: Option<End>,
}

/// Source over the items of `iter`.
pub fn values<I>(iter: I) -> Values<I::IntoIter>
where
    I: IntoIterator,
    I::IntoIter: Send,
    I::Item: Send + 'static,
{
    Values {
        iter: Some(iter.into_iter()),
        ended: None,
    }
}

/// Source that ends immediately.
pub fn empty<T: Send + 'static>() -> Values<std::iter::Empty<T>> {
    values(std::iter::empty())
}

#[async_trait]
impl<I> Source<I::Item> for Values<I>
where
    I: Iterator + Send,
    I::Item: Send + 'static,
{
    async fn pull(&mut self, end: Option<End>) -> Step<I::Item> {
        if let Some(ended) = &self.ended {
            return Step::End(ended.clone());
        }
        if let Some(end) = end {
            self.iter = None;
            self.ended = Some(end.clone());
            return Step::End(end);
        }
        match self.iter.as_mut().and_then(|iter| iter.next()) {
            Some(item) => Step::Data(item),
            None => {
                self.iter = None;
                self.ended = Some(End::Done);
                Step::done()
            }
        }
    }
}

/// Source that fails every pull with the same error.
pub struct ErrorSource {
    err: StreamError,
}

/// Source ending with `err` on the first pull.
pub fn error(err: StreamError) -> ErrorSource {
    ErrorSource { err }
}

#[async_trait]
impl<T: Send + 'static> Source<T> for ErrorSource {
    async fn pull(&mut self, _end: Option<End>) -> Step<T> {
        Step::error(self.err.clone())
    }
}

/// Source driven by a closure.
pub struct FromFn<F> {
    f: F,
}

/// Source that calls `f` with each pull's end argument.
///
/// The closure is responsible for the protocol rules: it should answer
/// `Some(end)` with an end and keep repeating its own end once it has ended.
pub fn from_fn<T, F>(f: F) -> FromFn<F>
where
    T: Send + 'static,
    F: FnMut(Option<End>) -> Step<T> + Send,
{
    FromFn { f }
}

#[async_trait]
impl<T, F> Source<T> for FromFn<F>
where
    T: Send + 'static,
    F: FnMut(Option<End>) -> Step<T> + Send,
{
    async fn pull(&mut self, end: Option<End>) -> Step<T> {
        (self.f)(end)
    }
}

/// Source adapting a fallible `futures` stream.
pub struct FromStream<S> {
    stream: Option<S>,
    ended: Option<End>,
}

/// Source over a `futures::Stream` of results. An `Err` item becomes an
/// error end; an early `pull(Some(_))` drops the stream.
pub fn from_stream<S, T, E>(stream: S) -> FromStream<S>
where
    S: Stream<Item = Result<T, E>> + Send + Unpin,
    T: Send + 'static,
    E: Error + Send + Sync + 'static,
{
    FromStream {
        stream: Some(stream),
        ended: None,
    }
}

#[async_trait]
impl<S, T, E> Source<T> for FromStream<S>
where
    S: Stream<Item = Result<T, E>> + Send + Unpin,
    T: Send + 'static,
    E: Error + Send + Sync + 'static,
{
    async fn pull(&mut self, end: Option<End>) -> Step<T> {
        if let Some(ended) = &self.ended {
            return Step::End(ended.clone());
        }
        if let Some(end) = end {
            self.stream = None;
            self.ended = Some(end.clone());
            return Step::End(end);
        }
        let next = match self.stream.as_mut() {
            Some(stream) => stream.next().await,
            None => None,
        };
        let end = match next {
            Some(Ok(item)) => return Step::Data(item),
            Some(Err(e)) => End::Error(StreamError::new(e)),
            None => End::Done,
        };
        self.stream = None;
        self.ended = Some(end.clone());
        Step::End(end)
    }
}
