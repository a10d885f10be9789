//! A portable, host-independent implementation of the
//! [WHATWG Streams](https://streams.spec.whatwg.org/) core: readable,
//! writable and transform streams with backpressure, locking and
//! piping/teeing, with no dependency on any particular async runtime or
//! JavaScript host.
//!
//! This crate provides [`ReadableStream`], [`WritableStream`] and
//! [`TransformStream`]. It also supports converting from and into
//! [`Stream`](futures_core::Stream)s and [`Sink`](futures_util::Sink)s.

pub use error::{StreamError, StreamResult};
pub use readable::ReadableStream;
pub use transform::TransformStream;
pub use writable::WritableStream;

pub mod abort_signal;
pub mod error;
pub mod queuing_strategy;
pub mod readable;
pub(crate) mod queue;
pub(crate) mod settlement;
pub(crate) mod util;
pub mod transform;
pub mod writable;
