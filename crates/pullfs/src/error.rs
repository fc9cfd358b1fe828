use pullfs_store::StoreError;
use pullfs_stream::StreamError;
use pullfs_types::ObjectId;
use thiserror::Error;

/// Errors surfaced by [`PullFs`](crate::PullFs) operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// No file exists for the id. Raised by reads; `stat` reports a missing
    /// file as `None` instead.
    #[error("FileNotFound: file {0} not found")]
    NotFound(ObjectId),

    /// The write's source ended with an error. Carries that error as is.
    #[error("write aborted by source: {0}")]
    Aborted(#[source] StreamError),

    /// Failure reported by the store, passed through unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FsError {
    /// Map a store failure seen on the read path. Only "file not found" is
    /// translated; everything else passes through.
    pub(crate) fn from_read(err: StoreError) -> Self {
        match err {
            StoreError::FileNotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The `FsError` inside an error end, if it carries one.
    pub fn from_stream(err: &StreamError) -> Option<&FsError> {
        err.downcast_ref::<FsError>()
    }

    /// Returns `true` if an error end reports a missing file.
    pub fn is_not_found_end(err: &StreamError) -> bool {
        Self::from_stream(err).is_some_and(FsError::is_not_found)
    }
}

/// Result alias for pullfs operations.
pub type FsResult<T> = Result<T, FsError>;
