//! Write path: drain a pull-stream source into a store upload.

use bytes::Bytes;
use tracing::{debug, warn};

use pullfs_store::{ChunkStore, StoreError, UploadOptions, UploadSink};
use pullfs_stream::{End, Source, Step, StreamError};
use pullfs_types::{Metadata, ObjectId};

use crate::error::{FsError, FsResult};

/// A pending write of one file, bound to an id and its metadata.
///
/// Nothing touches the store until [`consume`](Self::consume) is given a
/// source.
pub struct WriteSink<S> {
    store: S,
    id: ObjectId,
    metadata: Metadata,
}

impl<S: ChunkStore> WriteSink<S> {
    pub(crate) fn new(store: S, id: ObjectId, metadata: Metadata) -> Self {
        Self {
            store,
            id,
            metadata,
        }
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Drain `source` into a new upload.
    ///
    /// Pulls one chunk at a time and waits for the store to accept it before
    /// pulling the next. Resolves once the source has ended normally and the
    /// store has finalized the file.
    ///
    /// # Errors
    ///
    /// - [`FsError::Aborted`] with the source's own error if the source ends
    ///   with an error. The upload is aborted, never finalized.
    /// - [`FsError::Store`] if the store fails to open, accept, or finalize
    ///   the upload. The source is told to stop and the upload is aborted.
    pub async fn consume<Src>(self, mut source: Src) -> FsResult<()>
    where
        Src: Source<Bytes>,
    {
        let Self {
            store,
            id,
            metadata,
        } = self;
        let filename = metadata.name().map(str::to_string);
        let options = UploadOptions::from_metadata(metadata);

        let mut upload = match store.open_upload(&id, filename.as_deref(), options).await {
            Ok(upload) => upload,
            Err(e) => {
                stop_source(&mut source, &e).await;
                return Err(e.into());
            }
        };
        debug!(id = %id, "write started");

        let mut chunks = 0u64;
        loop {
            match source.pull(None).await {
                Step::Data(chunk) => {
                    if let Err(e) = upload.write(chunk).await {
                        stop_source(&mut source, &e).await;
                        abort_upload(upload, &id).await;
                        return Err(e.into());
                    }
                    chunks += 1;
                }
                Step::End(End::Done) => break,
                Step::End(End::Error(e)) => {
                    debug!(id = %id, chunks, error = %e, "source aborted write");
                    abort_upload(upload, &id).await;
                    return Err(FsError::Aborted(e));
                }
            }
        }

        let record = upload.finish().await?;
        debug!(id = %id, chunks, length = record.length, "write finished");
        Ok(())
    }
}

/// Tell the source no more values will be read.
async fn stop_source<Src: Source<Bytes>>(source: &mut Src, cause: &StoreError) {
    let end = End::Error(StreamError::msg(format!("upload failed: {cause}")));
    // The source's reply carries nothing we need.
    let _ = source.pull(Some(end)).await;
}

/// Abort an upload; a failure here is logged, the original error wins.
async fn abort_upload(upload: Box<dyn UploadSink>, id: &ObjectId) {
    let written = upload.bytes_written();
    if let Err(e) = upload.abort().await {
        warn!(id = %id, written, error = %e, "failed to abort upload");
    }
}
