//! Store double that injects transport failures.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use pullfs_store::{
    ChunkStore, DownloadStream, FileRecord, InMemoryChunkStore, StoreError, StoreResult,
    UploadOptions, UploadSink,
};
use pullfs_types::ObjectId;

fn reset() -> StoreError {
    StoreError::Transport("connection reset by peer".into())
}

/// Wraps an [`InMemoryChunkStore`], failing selected operations.
#[derive(Clone)]
pub(crate) struct FlakyStore {
    inner: InMemoryChunkStore,
    upload_writes_before_failure: Option<usize>,
    fail_open_upload: bool,
    fail_open_download: bool,
    fail_lookup: bool,
    download_attempts: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub(crate) fn new(inner: InMemoryChunkStore) -> Self {
        Self {
            inner,
            upload_writes_before_failure: None,
            fail_open_upload: false,
            fail_open_download: false,
            fail_lookup: false,
            download_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Accept `n` writes per upload, then fail every further write.
    pub(crate) fn fail_upload_after(mut self, n: usize) -> Self {
        self.upload_writes_before_failure = Some(n);
        self
    }

    pub(crate) fn fail_open_upload(mut self) -> Self {
        self.fail_open_upload = true;
        self
    }

    pub(crate) fn fail_open_download(mut self) -> Self {
        self.fail_open_download = true;
        self
    }

    pub(crate) fn fail_lookup(mut self) -> Self {
        self.fail_lookup = true;
        self
    }

    pub(crate) fn download_attempts(&self) -> usize {
        self.download_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChunkStore for FlakyStore {
    async fn open_upload(
        &self,
        id: &ObjectId,
        filename: Option<&str>,
        options: UploadOptions,
    ) -> StoreResult<Box<dyn UploadSink>> {
        if self.fail_open_upload {
            return Err(reset());
        }
        let inner = self.inner.open_upload(id, filename, options).await?;
        Ok(Box::new(FlakyUpload {
            inner,
            remaining: self.upload_writes_before_failure,
        }))
    }

    async fn open_download(&self, id: &ObjectId) -> StoreResult<DownloadStream> {
        self.download_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_open_download {
            return Err(reset());
        }
        self.inner.open_download(id).await
    }

    async fn find_one(&self, id: &ObjectId) -> StoreResult<Option<FileRecord>> {
        if self.fail_lookup {
            return Err(reset());
        }
        self.inner.find_one(id).await
    }
}

struct FlakyUpload {
    inner: Box<dyn UploadSink>,
    remaining: Option<usize>,
}

#[async_trait]
impl UploadSink for FlakyUpload {
    async fn write(&mut self, chunk: Bytes) -> StoreResult<()> {
        match self.remaining.as_mut() {
            Some(0) => return Err(reset()),
            Some(n) => *n -= 1,
            None => {}
        }
        self.inner.write(chunk).await
    }

    async fn finish(self: Box<Self>) -> StoreResult<FileRecord> {
        self.inner.finish().await
    }

    async fn abort(self: Box<Self>) -> StoreResult<()> {
        self.inner.abort().await
    }

    fn bytes_written(&self) -> u64 {
        self.inner.bytes_written()
    }
}
