use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pullfs_types::{Metadata, ObjectId};

/// Catalog entry of a finalized file.
///
/// Written once, after every chunk of the upload has been stored. Its
/// presence is what makes a file visible to lookups and downloads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: ObjectId,
    /// Total length in bytes.
    pub length: u64,
    /// Chunk size the file was split with.
    pub chunk_size: usize,
    pub upload_date: DateTime<Utc>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    /// Metadata exactly as supplied at upload time.
    pub metadata: Metadata,
}

impl FileRecord {
    /// Number of chunks the file is stored in.
    pub fn chunk_count(&self) -> u64 {
        let size = self.chunk_size.max(1) as u64;
        self.length.div_ceil(size)
    }
}

/// Options for opening an upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UploadOptions {
    /// Metadata stored verbatim with the file record.
    pub metadata: Metadata,
    pub content_type: Option<String>,
    /// Overrides the bucket's chunk size for this upload.
    pub chunk_size: Option<usize>,
}

impl UploadOptions {
    /// Options carrying `metadata`, with the content type taken from its
    /// reserved `type` key.
    pub fn from_metadata(metadata: Metadata) -> Self {
        Self {
            content_type: metadata.content_type().map(str::to_string),
            metadata,
            chunk_size: None,
        }
    }
}
