use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use tracing::debug;

use pullfs_types::ObjectId;

use crate::config::BucketConfig;
use crate::download::{DownloadFeed, DownloadStream};
use crate::error::{StoreError, StoreResult};
use crate::record::{FileRecord, UploadOptions};
use crate::traits::{ChunkStore, UploadSink};

/// Chunks of one upload, keyed by the file id and the upload that wrote them,
/// so concurrent uploads of the same id never mix their chunks.
type ChunkKey = (ObjectId, u64);

/// A finalized file: its catalog record and the upload holding its chunks.
#[derive(Clone)]
struct FileEntry {
    record: FileRecord,
    upload: u64,
}

struct Inner {
    config: BucketConfig,
    files: RwLock<HashMap<ObjectId, FileEntry>>,
    chunks: RwLock<HashMap<ChunkKey, BTreeMap<u64, Bytes>>>,
    next_upload: AtomicU64,
    stats: Counters,
}

#[derive(Default)]
struct Counters {
    uploads_opened: AtomicU64,
    downloads_opened: AtomicU64,
    lookups: AtomicU64,
}

/// Snapshot of how often each store operation was called.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub uploads_opened: u64,
    pub downloads_opened: u64,
    pub lookups: u64,
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Internal(format!("lock poisoned: {e}"))
}

impl Inner {
    fn file(&self, id: &ObjectId) -> StoreResult<Option<FileEntry>> {
        let files = self.files.read().map_err(poisoned)?;
        Ok(files.get(id).cloned())
    }

    fn chunk(&self, key: &ChunkKey, n: u64) -> StoreResult<Option<Bytes>> {
        let chunks = self.chunks.read().map_err(poisoned)?;
        Ok(chunks.get(key).and_then(|parts| parts.get(&n)).cloned())
    }

    fn put_chunk(&self, key: &ChunkKey, n: u64, data: Bytes) -> StoreResult<()> {
        let mut chunks = self.chunks.write().map_err(poisoned)?;
        chunks.entry(key.clone()).or_default().insert(n, data);
        Ok(())
    }

    fn drop_chunks(&self, key: &ChunkKey) -> StoreResult<usize> {
        let mut chunks = self.chunks.write().map_err(poisoned)?;
        Ok(chunks.remove(key).map_or(0, |parts| parts.len()))
    }

    /// Insert the file record, failing if a finalized file already owns `id`.
    fn insert_file(&self, entry: FileEntry) -> StoreResult<()> {
        let mut files = self.files.write().map_err(poisoned)?;
        if files.contains_key(&entry.record.id) {
            return Err(StoreError::DuplicateId(entry.record.id));
        }
        files.insert(entry.record.id.clone(), entry);
        Ok(())
    }
}

/// In-memory chunked file store.
///
/// Modeled on a files-collection + chunks-collection large-object store:
/// uploads are cut into `chunk_size` pieces which are stored first, and the
/// file record is written last. A file is visible only once its record
/// exists, so unfinished or aborted uploads never show up. Aborting (or
/// dropping an unfinished upload) deletes the chunks already stored.
///
/// The handle is cheap to clone; clones share the same data.
#[derive(Clone)]
pub struct InMemoryChunkStore {
    inner: Arc<Inner>,
}

impl InMemoryChunkStore {
    /// Create an empty store with the default bucket configuration.
    pub fn new() -> Self {
        Self::from_valid_config(BucketConfig::default())
    }

    /// Create an empty store with `config`.
    pub fn with_config(config: BucketConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: BucketConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                files: RwLock::new(HashMap::new()),
                chunks: RwLock::new(HashMap::new()),
                next_upload: AtomicU64::new(0),
                stats: Counters::default(),
            }),
        }
    }

    pub fn config(&self) -> &BucketConfig {
        &self.inner.config
    }

    /// Number of finalized files.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.inner.files.read().map_err(poisoned)?.len())
    }

    /// Returns `true` if no file is finalized.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Total chunks held, including those of unfinished uploads.
    pub fn chunk_count(&self) -> StoreResult<usize> {
        let chunks = self.inner.chunks.read().map_err(poisoned)?;
        Ok(chunks.values().map(BTreeMap::len).sum())
    }

    /// Delete a finalized file and its chunks. Returns `true` if it existed.
    pub fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        let removed = self.inner.files.write().map_err(poisoned)?.remove(id);
        match removed {
            Some(entry) => {
                self.inner.drop_chunks(&(id.clone(), entry.upload))?;
                debug!(id = %id, "deleted file");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Call counters for each store operation.
    pub fn stats(&self) -> StoreStats {
        let c = &self.inner.stats;
        StoreStats {
            uploads_opened: c.uploads_opened.load(Ordering::Relaxed),
            downloads_opened: c.downloads_opened.load(Ordering::Relaxed),
            lookups: c.lookups.load(Ordering::Relaxed),
        }
    }
}

impl Default for InMemoryChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().unwrap_or_default();
        f.debug_struct("InMemoryChunkStore")
            .field("bucket", &self.inner.config.bucket_name)
            .field("file_count", &count)
            .finish()
    }
}

#[async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn open_upload(
        &self,
        id: &ObjectId,
        filename: Option<&str>,
        options: UploadOptions,
    ) -> StoreResult<Box<dyn UploadSink>> {
        let chunk_size = options
            .chunk_size
            .unwrap_or(self.inner.config.chunk_size_bytes);
        if chunk_size == 0 {
            return Err(StoreError::InvalidConfig(
                "chunk size must be greater than zero".into(),
            ));
        }
        self.inner.stats.uploads_opened.fetch_add(1, Ordering::Relaxed);
        let upload = self.inner.next_upload.fetch_add(1, Ordering::Relaxed);
        debug!(id = %id, upload, chunk_size, "opened upload");
        Ok(Box::new(InMemoryUpload {
            store: Arc::clone(&self.inner),
            key: (id.clone(), upload),
            filename: filename.map(str::to_string),
            options,
            chunk_size,
            buffer: BytesMut::new(),
            next_chunk: 0,
            length: 0,
            closed: false,
        }))
    }

    async fn open_download(&self, id: &ObjectId) -> StoreResult<DownloadStream> {
        self.inner
            .stats
            .downloads_opened
            .fetch_add(1, Ordering::Relaxed);
        let Some(entry) = self.inner.file(id)? else {
            debug!(id = %id, "download of unknown file");
            return Ok(DownloadStream::failed(StoreError::FileNotFound(id.clone())));
        };
        debug!(id = %id, length = entry.record.length, "opened download");
        let store = Arc::clone(&self.inner);
        Ok(DownloadStream::spawn(move |feed| produce(store, entry, feed)))
    }

    async fn find_one(&self, id: &ObjectId) -> StoreResult<Option<FileRecord>> {
        self.inner.stats.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.inner.file(id)?.map(|entry| entry.record))
    }
}

/// Push the chunks of a finalized file into `feed`, in order.
async fn produce(store: Arc<Inner>, entry: FileEntry, feed: DownloadFeed) {
    let record = entry.record;
    let key = (record.id.clone(), entry.upload);
    let mut total = 0u64;
    for n in 0..record.chunk_count() {
        let chunk = match store.chunk(&key, n) {
            Ok(Some(chunk)) => chunk,
            Ok(None) => {
                feed.fail(StoreError::ChunkMissing { id: record.id, n }).await;
                return;
            }
            Err(e) => {
                feed.fail(e).await;
                return;
            }
        };
        total += chunk.len() as u64;
        if !feed.push(chunk).await {
            debug!(id = %record.id, n, "download destroyed by consumer");
            return;
        }
    }
    if total != record.length {
        feed.fail(StoreError::LengthMismatch {
            id: record.id,
            expected: record.length,
            actual: total,
        })
        .await;
    }
}

/// Upload into an [`InMemoryChunkStore`].
struct InMemoryUpload {
    store: Arc<Inner>,
    key: ChunkKey,
    filename: Option<String>,
    options: UploadOptions,
    chunk_size: usize,
    buffer: BytesMut,
    next_chunk: u64,
    length: u64,
    closed: bool,
}

impl InMemoryUpload {
    fn flush_full_chunks(&mut self) -> StoreResult<()> {
        while self.buffer.len() >= self.chunk_size {
            let piece = self.buffer.split_to(self.chunk_size).freeze();
            self.store.put_chunk(&self.key, self.next_chunk, piece)?;
            self.next_chunk += 1;
        }
        Ok(())
    }

    fn discard(&mut self) -> StoreResult<usize> {
        self.closed = true;
        self.buffer.clear();
        self.store.drop_chunks(&self.key)
    }

    fn finalize(&mut self) -> StoreResult<FileRecord> {
        if !self.buffer.is_empty() {
            let rest = self.buffer.split().freeze();
            self.store.put_chunk(&self.key, self.next_chunk, rest)?;
            self.next_chunk += 1;
        }
        let record = FileRecord {
            id: self.key.0.clone(),
            length: self.length,
            chunk_size: self.chunk_size,
            upload_date: Utc::now(),
            filename: self.filename.clone(),
            content_type: self.options.content_type.clone(),
            metadata: self.options.metadata.clone(),
        };
        self.store.insert_file(FileEntry {
            record: record.clone(),
            upload: self.key.1,
        })?;
        self.closed = true;
        Ok(record)
    }
}

#[async_trait]
impl UploadSink for InMemoryUpload {
    async fn write(&mut self, chunk: Bytes) -> StoreResult<()> {
        self.length += chunk.len() as u64;
        self.buffer.extend_from_slice(&chunk);
        self.flush_full_chunks()
    }

    async fn finish(self: Box<Self>) -> StoreResult<FileRecord> {
        let mut upload = self;
        match upload.finalize() {
            Ok(record) => {
                debug!(id = %record.id, length = record.length, chunks = upload.next_chunk, "finished upload");
                Ok(record)
            }
            Err(e) => {
                // Chunks of a rejected upload are unreachable; drop them now.
                upload.discard()?;
                Err(e)
            }
        }
    }

    async fn abort(self: Box<Self>) -> StoreResult<()> {
        let mut upload = self;
        let dropped = upload.discard()?;
        debug!(id = %upload.key.0, dropped, "aborted upload");
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.length
    }
}

impl Drop for InMemoryUpload {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.discard();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pullfs_types::Metadata;

    fn small_store() -> InMemoryChunkStore {
        InMemoryChunkStore::with_config(BucketConfig::with_chunk_size(4)).unwrap()
    }

    async fn upload(store: &InMemoryChunkStore, id: &ObjectId, parts: &[&[u8]]) -> FileRecord {
        let mut sink = store
            .open_upload(id, None, UploadOptions::default())
            .await
            .unwrap();
        for part in parts {
            sink.write(Bytes::copy_from_slice(part)).await.unwrap();
        }
        sink.finish().await.unwrap()
    }

    async fn download(store: &InMemoryChunkStore, id: &ObjectId) -> StoreResult<Vec<u8>> {
        let mut stream = store.open_download(id).await?;
        let mut out = Vec::new();
        while let Some(chunk) = stream.next_chunk().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Upload / download
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn upload_then_download() {
        let store = small_store();
        let id = ObjectId::text("X1");
        let record = upload(&store, &id, &[b"gar", b"fie", b"ld"]).await;
        assert_eq!(record.length, 8);
        assert_eq!(record.chunk_count(), 2);
        assert_eq!(store.chunk_count().unwrap(), 2);
        assert_eq!(download(&store, &id).await.unwrap(), b"garfield");
    }

    #[tokio::test]
    async fn empty_upload_is_a_zero_length_file() {
        let store = small_store();
        let id = ObjectId::text("empty");
        let record = upload(&store, &id, &[]).await;
        assert_eq!(record.length, 0);
        assert!(download(&store, &id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn record_carries_name_type_and_metadata() {
        let store = InMemoryChunkStore::new();
        let id = ObjectId::random();
        let meta = Metadata::new()
            .with("name", "wallpaper.jpg")
            .with("type", "image/jpeg")
            .with("owner", "jon");
        let sink = store
            .open_upload(&id, meta.name(), UploadOptions::from_metadata(meta.clone()))
            .await
            .unwrap();
        sink.finish().await.unwrap();

        let record = store.find_one(&id).await.unwrap().expect("should exist");
        assert_eq!(record.filename.as_deref(), Some("wallpaper.jpg"));
        assert_eq!(record.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(record.metadata, meta);
    }

    #[tokio::test]
    async fn per_upload_chunk_size() {
        let store = InMemoryChunkStore::new();
        let id = ObjectId::Int(1);
        let options = UploadOptions {
            chunk_size: Some(2),
            ..Default::default()
        };
        let mut sink = store.open_upload(&id, None, options).await.unwrap();
        sink.write(Bytes::from_static(b"abcde")).await.unwrap();
        assert_eq!(sink.bytes_written(), 5);
        let record = sink.finish().await.unwrap();
        assert_eq!(record.chunk_size, 2);
        assert_eq!(record.chunk_count(), 3);
    }

    #[tokio::test]
    async fn zero_chunk_size_is_rejected() {
        let store = InMemoryChunkStore::new();
        let options = UploadOptions {
            chunk_size: Some(0),
            ..Default::default()
        };
        let result = store.open_upload(&ObjectId::Int(1), None, options).await;
        assert!(matches!(result, Err(StoreError::InvalidConfig(_))));
        assert!(InMemoryChunkStore::with_config(BucketConfig::with_chunk_size(0)).is_err());
    }

    // -----------------------------------------------------------------------
    // Visibility
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn unfinished_upload_is_invisible() {
        let store = small_store();
        let id = ObjectId::text("pending");
        let mut sink = store
            .open_upload(&id, None, UploadOptions::default())
            .await
            .unwrap();
        sink.write(Bytes::from_static(b"0123456789")).await.unwrap();
        assert!(store.find_one(&id).await.unwrap().is_none());
        assert!(download(&store, &id).await.unwrap_err().is_not_found());
        sink.finish().await.unwrap();
        assert!(store.find_one(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn abort_discards_chunks() {
        let store = small_store();
        let id = ObjectId::text("aborted");
        let mut sink = store
            .open_upload(&id, None, UploadOptions::default())
            .await
            .unwrap();
        sink.write(Bytes::from_static(b"0123456789")).await.unwrap();
        assert_eq!(store.chunk_count().unwrap(), 2);
        sink.abort().await.unwrap();
        assert_eq!(store.chunk_count().unwrap(), 0);
        assert!(store.find_one(&id).await.unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn dropped_upload_discards_chunks() {
        let store = small_store();
        let id = ObjectId::text("dropped");
        {
            let mut sink = store
                .open_upload(&id, None, UploadOptions::default())
                .await
                .unwrap();
            sink.write(Bytes::from_static(b"01234567")).await.unwrap();
        }
        assert_eq!(store.chunk_count().unwrap(), 0);
        assert!(store.find_one(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_finalize_fails_and_keeps_first() {
        let store = small_store();
        let id = ObjectId::text("dup");
        upload(&store, &id, &[b"first"]).await;

        let mut sink = store
            .open_upload(&id, None, UploadOptions::default())
            .await
            .unwrap();
        sink.write(Bytes::from_static(b"second")).await.unwrap();
        let err = sink.finish().await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(_)));

        assert_eq!(download(&store, &id).await.unwrap(), b"first");
        assert_eq!(store.chunk_count().unwrap(), 2);
    }

    // -----------------------------------------------------------------------
    // Lookup / delete
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn find_one_missing_returns_none() {
        let store = InMemoryChunkStore::new();
        assert!(store.find_one(&ObjectId::random()).await.unwrap().is_none());
        assert_eq!(store.stats().lookups, 1);
    }

    #[tokio::test]
    async fn download_missing_is_not_found() {
        let store = InMemoryChunkStore::new();
        let err = download(&store, &ObjectId::text("nope")).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("FileNotFound"));
    }

    #[tokio::test]
    async fn delete_removes_file_and_chunks() {
        let store = small_store();
        let id = ObjectId::text("gone");
        upload(&store, &id, &[b"0123456789"]).await;
        assert!(store.delete(&id).unwrap());
        assert!(!store.delete(&id).unwrap());
        assert_eq!(store.chunk_count().unwrap(), 0);
        assert!(store.find_one(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_chunk_is_reported() {
        let store = small_store();
        let id = ObjectId::text("holey");
        upload(&store, &id, &[b"0123456789"]).await;
        let upload_id = store.inner.file(&id).unwrap().unwrap().upload;
        store
            .inner
            .chunks
            .write()
            .unwrap()
            .get_mut(&(id.clone(), upload_id))
            .unwrap()
            .remove(&1);
        let err = download(&store, &id).await.unwrap_err();
        assert!(matches!(err, StoreError::ChunkMissing { n: 1, .. }));
    }

    // -----------------------------------------------------------------------
    // Sharing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn clones_share_data() {
        let store = small_store();
        let other = store.clone();
        let id = ObjectId::text("shared");
        upload(&store, &id, &[b"data"]).await;
        assert!(other.find_one(&id).await.unwrap().is_some());
        assert_eq!(other.len().unwrap(), 1);
        assert_eq!(store.stats().uploads_opened, 1);
    }

    #[tokio::test]
    async fn concurrent_uploads_of_distinct_ids() {
        let store = small_store();
        let mut handles = Vec::new();
        for i in 0..8i64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let id = ObjectId::Int(i);
                let body = format!("file-{i}-contents");
                upload(&store, &id, &[body.as_bytes()]).await;
                (id, body)
            }));
        }
        for handle in handles {
            let (id, body) = handle.await.unwrap();
            assert_eq!(download(&store, &id).await.unwrap(), body.as_bytes());
        }
        assert_eq!(store.len().unwrap(), 8);
    }

    #[test]
    fn debug_format() {
        let store = InMemoryChunkStore::new();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryChunkStore"));
        assert!(debug.contains("file_count"));
    }
}
