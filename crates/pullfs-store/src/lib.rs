//! Chunked large-object store binding for pullfs.
//!
//! pullfs does not store bytes itself. It talks to a large-object store that
//! splits each file into fixed-size chunks, keeps a catalog of finalized
//! files, and exposes three operations: upload by id, download by id, and a
//! single-record catalog lookup. This crate defines that boundary.
//!
//! # Storage Backends
//!
//! All backends implement the [`ChunkStore`] trait:
//!
//! - [`InMemoryChunkStore`] -- files + chunks collections in memory, for tests
//!   and embedding
//!
//! # Design Rules
//!
//! 1. Identifiers are chosen by the caller; the store never generates them.
//! 2. Chunks first, record last: a file becomes visible only when its upload
//!    is finished. Aborted uploads leave nothing behind.
//! 3. Downloads are push-driven from the store side, paced by a one-chunk
//!    buffer ([`DownloadStream`]).
//! 4. The store handle is shared; uploads and downloads each own their stream.
//! 5. All backend errors are propagated, never silently ignored.

pub mod config;
pub mod download;
pub mod error;
pub mod memory;
pub mod record;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{BucketConfig, DEFAULT_CHUNK_SIZE};
pub use download::{DownloadFeed, DownloadStream};
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryChunkStore, StoreStats};
pub use record::{FileRecord, UploadOptions};
pub use traits::{ChunkStore, UploadSink};
