use pullfs_types::ObjectId;

/// Errors from chunk store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No finalized file exists for the id.
    #[error("FileNotFound: file {0} not found")]
    FileNotFound(ObjectId),

    /// A chunk expected by the file record is absent.
    #[error("ChunkIsMissing: chunk {n} of file {id} not found")]
    ChunkMissing { id: ObjectId, n: u64 },

    /// The chunks add up to a different length than the file record states.
    #[error("length mismatch for {id}: record says {expected} bytes, chunks hold {actual}")]
    LengthMismatch {
        id: ObjectId,
        expected: u64,
        actual: u64,
    },

    /// A finalized file already exists for the id.
    #[error("duplicate file id: {0}")]
    DuplicateId(ObjectId),

    /// Rejected configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Connection or backend failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Internal backend failure (e.g. a poisoned lock).
    #[error("internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Returns `true` for [`StoreError::FileNotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
