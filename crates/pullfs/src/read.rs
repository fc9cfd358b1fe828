//! Read path: a lazy pull-stream source over a store download.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use pullfs_store::{ChunkStore, DownloadStream};
use pullfs_stream::{End, Source, Step, StreamError};
use pullfs_types::ObjectId;

use crate::error::FsError;

/// Pull-stream source over the bytes of one stored file.
///
/// The store download is opened on the first `pull(None)`, not when the
/// source is built, and at most once: an open failure is remembered and
/// repeated. Every pull relays exactly one chunk or the end. After the end
/// (normal, error, or cancellation) further pulls repeat it without touching
/// the store. A missing file ends with [`FsError::NotFound`], recognizable
/// through [`FsError::is_not_found_end`].
pub struct ReadSource<S> {
    store: S,
    id: ObjectId,
    stream: Option<DownloadStream>,
    ended: Option<End>,
}

impl<S: ChunkStore> ReadSource<S> {
    pub(crate) fn new(store: S, id: ObjectId) -> Self {
        Self {
            store,
            id,
            stream: None,
            ended: None,
        }
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    /// Returns `true` once the source has ended.
    pub fn is_ended(&self) -> bool {
        self.ended.is_some()
    }

    fn end_with(&mut self, end: End) -> Step<Bytes> {
        self.stream = None;
        self.ended = Some(end.clone());
        Step::End(end)
    }
}

fn read_error(err: pullfs_store::StoreError) -> End {
    End::Error(StreamError::new(FsError::from_read(err)))
}

#[async_trait]
impl<S: ChunkStore> Source<Bytes> for ReadSource<S> {
    async fn pull(&mut self, end: Option<End>) -> Step<Bytes> {
        if let Some(ended) = &self.ended {
            return Step::End(ended.clone());
        }

        if let Some(end) = end {
            if let Some(mut stream) = self.stream.take() {
                stream.destroy();
                debug!(id = %self.id, "read cancelled by consumer");
            }
            return self.end_with(end);
        }

        if self.stream.is_none() {
            match self.store.open_download(&self.id).await {
                Ok(stream) => {
                    debug!(id = %self.id, "read opened");
                    self.stream = Some(stream);
                }
                Err(e) => return self.end_with(read_error(e)),
            }
        }

        let next = match self.stream.as_mut() {
            Some(stream) => stream.next_chunk().await,
            None => None,
        };
        match next {
            Some(Ok(chunk)) => Step::Data(chunk),
            Some(Err(e)) => {
                debug!(id = %self.id, error = %e, "read failed");
                self.end_with(read_error(e))
            }
            None => self.end_with(End::Done),
        }
    }
}
