//! Consumers that drive a source to its end.

use crate::error::StreamError;
use crate::source::{End, Source, Step};

/// Pull every value from `source` into a `Vec`.
///
/// Resolves with the values on a normal end, or with the error of an error
/// end (values read before the error are dropped).
pub async fn collect<T, S>(mut source: S) -> Result<Vec<T>, StreamError>
where
    T: Send + 'static,
    S: Source<T>,
{
    let mut items = Vec::new();
    loop {
        match source.pull(None).await {
            Step::Data(item) => items.push(item),
            Step::End(End::Done) => return Ok(items),
            Step::End(End::Error(e)) => return Err(e),
        }
    }
}

/// Pull and discard every value from `source`, returning how many were read.
pub async fn drain<T, S>(mut source: S) -> Result<u64, StreamError>
where
    T: Send + 'static,
    S: Source<T>,
{
    let mut count = 0u64;
    loop {
        match source.pull(None).await {
            Step::Data(_) => count += 1,
            Step::End(end) => return end.into_result().map(|()| count),
        }
    }
}
