use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Default chunk size: 255 KiB, so a chunk plus its record stays under 256 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

/// Configuration for a bucket of chunked files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Bucket name; prefixes the files and chunks collections.
    pub bucket_name: String,
    /// Size of every chunk but the last, in bytes.
    pub chunk_size_bytes: usize,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            bucket_name: "fs".to_string(),
            chunk_size_bytes: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl BucketConfig {
    /// Default configuration with a different chunk size.
    pub fn with_chunk_size(chunk_size_bytes: usize) -> Self {
        Self {
            chunk_size_bytes,
            ..Default::default()
        }
    }

    /// Reject values the store cannot work with.
    pub fn validate(&self) -> StoreResult<()> {
        if self.chunk_size_bytes == 0 {
            return Err(StoreError::InvalidConfig(
                "chunk_size_bytes must be greater than zero".into(),
            ));
        }
        if self.bucket_name.is_empty() {
            return Err(StoreError::InvalidConfig(
                "bucket_name must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Name of the files collection.
    pub fn files_collection(&self) -> String {
        format!("{}.files", self.bucket_name)
    }

    /// Name of the chunks collection.
    pub fn chunks_collection(&self) -> String {
        format!("{}.chunks", self.bucket_name)
    }
}
