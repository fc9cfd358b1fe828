//! Pull-stream file access over a chunked large-object store.
//!
//! `pullfs` stores and retrieves whole files keyed by caller-chosen
//! identifiers. Data moves as pull-streams (see [`pullfs_stream`]): the
//! consumer asks for each chunk, and the store is paced by those requests.
//!
//! ```text
//! write(id, meta?) -> WriteSink ; sink.consume(source) -> Future<()>
//! read(id)         -> ReadSource   (a Source<Bytes>)
//! stat(id)         -> Future<Option<{ id, meta }>>
//! exists(id)       -> Future<bool>
//! ```
//!
//! # Failure Modes
//!
//! - Reading a missing file ends the source with [`FsError::NotFound`];
//!   `stat` returns `None` and `exists` returns `false` instead.
//! - A write whose source ends with an error fails with [`FsError::Aborted`]
//!   holding that error, and the partial upload is discarded.
//! - Store failures surface as [`FsError::Store`], unchanged.
//!
//! Whether an aborted upload leaves nothing behind is up to the store; the
//! bundled [`InMemoryChunkStore`](pullfs_store::InMemoryChunkStore)
//! guarantees it.

pub mod error;
pub mod fs;
pub mod read;
pub mod write;

#[cfg(test)]
mod test_support;

pub use error::{FsError, FsResult};
pub use fs::{FileStat, PullFs};
pub use read::ReadSource;
pub use write::WriteSink;
