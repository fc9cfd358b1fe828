use async_trait::async_trait;

use crate::error::StreamError;

/// How a stream ended.
#[derive(Clone, Debug)]
pub enum End {
    /// Normal end of stream.
    Done,
    /// The stream ended with an error.
    Error(StreamError),
}

impl End {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// The error, for an error end.
    pub fn error(&self) -> Option<&StreamError> {
        match self {
            Self::Done => None,
            Self::Error(e) => Some(e),
        }
    }

    /// `Ok(())` for a normal end, `Err` for an error end.
    pub fn into_result(self) -> Result<(), StreamError> {
        match self {
            Self::Done => Ok(()),
            Self::Error(e) => Err(e),
        }
    }
}

/// One answer from a source.
#[derive(Clone, Debug)]
pub enum Step<T> {
    /// The next value.
    Data(T),
    /// The stream has ended; no more values follow.
    End(End),
}

impl<T> Step<T> {
    /// A normal end.
    pub fn done() -> Self {
        Self::End(End::Done)
    }

    /// An error end.
    pub fn error(err: StreamError) -> Self {
        Self::End(End::Error(err))
    }
}

/// A pull-stream producer.
///
/// `pull(None)` requests the next value. `pull(Some(end))` asks the source to
/// stop; it must release whatever it holds and answer with an end (usually
/// the one it was given). Once a source has ended, every later pull answers
/// with that same end.
#[async_trait]
pub trait Source<T: Send + 'static>: Send {
    async fn pull(&mut self, end: Option<End>) -> Step<T>;
}

/// A boxed, type-erased source.
pub type BoxSource<T> = Box<dyn Source<T>>;

#[async_trait]
impl<T: Send + 'static, S: Source<T> + ?Sized> Source<T> for Box<S> {
    async fn pull(&mut self, end: Option<End>) -> Step<T> {
        (**self).pull(end).await
    }
}
