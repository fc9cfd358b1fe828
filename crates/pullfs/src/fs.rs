use serde::{Deserialize, Serialize};

use pullfs_store::ChunkStore;
use pullfs_types::{Metadata, ObjectId};

use crate::error::FsResult;
use crate::read::ReadSource;
use crate::write::WriteSink;

/// Result of a metadata lookup: the id and the metadata stored with it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileStat {
    pub id: ObjectId,
    pub meta: Metadata,
}

/// Pull-stream file access over a chunked store.
///
/// Holds an explicit store handle; clone the handle (or wrap it in an `Arc`)
/// to share one store between several `PullFs` values and other users.
#[derive(Clone, Debug)]
pub struct PullFs<S> {
    store: S,
}

impl<S: ChunkStore + Clone> PullFs<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store handle.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Prepare a write of `id`. Pass the returned sink a source with
    /// [`WriteSink::consume`].
    ///
    /// `metadata` is stored verbatim; its `name` and `type` keys are also
    /// handed to the store as the file name and content type. `None` stores
    /// empty metadata.
    pub fn write(&self, id: impl Into<ObjectId>, metadata: Option<Metadata>) -> WriteSink<S> {
        WriteSink::new(self.store.clone(), id.into(), metadata.unwrap_or_default())
    }

    /// A source over the bytes of `id`. The store is not contacted until the
    /// first pull.
    pub fn read(&self, id: impl Into<ObjectId>) -> ReadSource<S> {
        ReadSource::new(self.store.clone(), id.into())
    }

    /// Look up `id`. `Ok(None)` means no file exists; only store failures are
    /// errors.
    pub async fn stat(&self, id: &ObjectId) -> FsResult<Option<FileStat>> {
        let record = self.store.find_one(id).await?;
        Ok(record.map(|record| FileStat {
            id: record.id,
            meta: record.metadata,
        }))
    }

    /// Returns `true` if `stat` finds the file.
    pub async fn exists(&self, id: &ObjectId) -> FsResult<bool> {
        Ok(self.stat(id).await?.is_some())
    }
}
