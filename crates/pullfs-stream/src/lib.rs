//! Pull-stream protocol for pullfs.
//!
//! A pull-stream moves data only when the consumer asks for it. The consumer
//! calls [`Source::pull`] once per value and receives either the next value,
//! a normal end, or an error end. Passing an [`End`] instead of `None` asks
//! the source to terminate early, which is how cancellation travels upstream.
//!
//! # Protocol Rules
//!
//! 1. A source answers every pull with exactly one [`Step`].
//! 2. After a source has answered with [`Step::End`], every later pull repeats
//!    that same end.
//! 3. `pull(Some(end))` must release the source's resources and answer with
//!    an end; it never yields more data.
//! 4. Errors are carried as [`StreamError`], a cheaply clonable handle, so a
//!    repeated end refers to the very same error.
//!
//! # Modules
//!
//! - [`source`] — The [`Source`] trait, [`Step`], [`End`]
//! - [`error`] — [`StreamError`]
//! - [`sources`] — Ready-made sources ([`values`], [`from_fn`], [`from_stream`], ...)
//! - [`sinks`] — Consumers that drive a source to completion ([`collect`], [`drain`])

pub mod error;
pub mod sinks;
pub mod source;
pub mod sources;

pub use error::StreamError;
pub use sinks::{collect, drain};
pub use source::{BoxSource, End, Source, Step};
pub use sources::{empty, error, from_fn, from_stream, values};
