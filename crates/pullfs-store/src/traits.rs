use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use pullfs_types::ObjectId;

use crate::download::DownloadStream;
use crate::error::StoreResult;
use crate::record::{FileRecord, UploadOptions};

/// Chunked large-object store.
///
/// All implementations must satisfy these invariants:
/// - A file becomes visible to [`find_one`](Self::find_one) and
///   [`open_download`](Self::open_download) only once its upload finished.
///   Unfinished and aborted uploads are never visible.
/// - Identifiers are supplied by the caller and compared for equality only.
/// - The store is safe to share between concurrent uploads, downloads and
///   lookups; none of them takes an exclusive lock on the whole store.
/// - All backend errors are propagated, never silently ignored.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Open an upload for `id`. Nothing is visible until the returned sink
    /// is finished.
    async fn open_upload(
        &self,
        id: &ObjectId,
        filename: Option<&str>,
        options: UploadOptions,
    ) -> StoreResult<Box<dyn UploadSink>>;

    /// Open a download of `id`.
    ///
    /// An unknown id is not an error here: the returned stream yields a
    /// single [`StoreError::FileNotFound`](crate::StoreError::FileNotFound)
    /// item. `Err` is reserved for failures to reach the store at all.
    async fn open_download(&self, id: &ObjectId) -> StoreResult<DownloadStream>;

    /// Look up the catalog entry of `id`, limited to one result.
    ///
    /// Returns `Ok(None)` if no finalized file exists.
    async fn find_one(&self, id: &ObjectId) -> StoreResult<Option<FileRecord>>;
}

/// Write side of a single upload.
#[async_trait]
pub trait UploadSink: Send {
    /// Hand the next chunk of bytes to the store. Resolves once the store has
    /// accepted it; callers must not write again before that.
    async fn write(&mut self, chunk: Bytes) -> StoreResult<()>;

    /// Flush remaining bytes and write the file record. The file is durable
    /// and visible once this resolves.
    async fn finish(self: Box<Self>) -> StoreResult<FileRecord>;

    /// Discard everything written so far. The file never becomes visible.
    async fn abort(self: Box<Self>) -> StoreResult<()>;

    /// Bytes accepted so far.
    fn bytes_written(&self) -> u64;
}

#[async_trait]
impl<S: ChunkStore + ?Sized> ChunkStore for Arc<S> {
    async fn open_upload(
        &self,
        id: &ObjectId,
        filename: Option<&str>,
        options: UploadOptions,
    ) -> StoreResult<Box<dyn UploadSink>> {
        (**self).open_upload(id, filename, options).await
    }

    async fn open_download(&self, id: &ObjectId) -> StoreResult<DownloadStream> {
        (**self).open_download(id).await
    }

    async fn find_one(&self, id: &ObjectId) -> StoreResult<Option<FileRecord>> {
        (**self).find_one(id).await
    }
}
