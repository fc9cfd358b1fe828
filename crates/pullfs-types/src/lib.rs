//! Foundation types for pullfs.
//!
//! Every file kept in a pullfs store is keyed by an identifier the caller
//! chooses, and carries an open metadata mapping attached at write time. This
//! crate defines both; every other pullfs crate depends on `pullfs-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] — Caller-supplied identifier (binary, text, UUID, integer, or compound)
//! - [`Metadata`] — Open key/value mapping with the reserved `name` and `type` keys
//! - [`Value`] — A single metadata value

pub mod error;
pub mod metadata;
pub mod object;

pub use error::TypeError;
pub use metadata::{Metadata, Value, CONTENT_TYPE_KEY, NAME_KEY};
pub use object::ObjectId;
