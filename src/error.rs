//! Error kinds surfaced to callers of the stream surface.
//!
//! See the "Error kinds surfaced to callers" table: every failure a controller,
//! reader or writer can report boils down to one of these four kinds.
use std::fmt;

/// An error raised by the stream core, or a reason propagated from user code.
///
/// `E` is the reason/error type chosen by the application for chunks and
/// cancellation/abort reasons (e.g. `String`, `std::io::Error`, or a custom
/// enum). A `StreamError<E>` is always `Clone`, since a `stored_error` must be
/// reported to every caller that observes a terminal state, not just the
/// first one.
#[derive(thiserror::Error, Debug, Clone)]
pub enum StreamError<E: fmt::Debug + fmt::Display> {
    /// Method invoked on a released reader/writer, on a locked stream from
    /// the wrong path, or otherwise misused.
    #[error("stream misuse: {0}")]
    Misuse(&'static str),
    /// A high-water mark or chunk size was negative, NaN, or otherwise out of range.
    #[error("invalid range: {0}")]
    Range(&'static str),
    /// Close/enqueue attempted while the stream forbids it (already closed,
    /// close-requested, errored, or erroring).
    #[error("invalid state: {0}")]
    State(&'static str),
    /// An exception raised by a user callback (`start`/`pull`/`write`/`close`/
    /// `abort`/`transform`/`flush`/`size`/`cancel`), now the stream's stored error.
    #[error("{0}")]
    Reason(#[from] E),
}

impl<E: fmt::Debug + fmt::Display> StreamError<E> {
    /// Returns the user-supplied reason, if this error wraps one.
    pub fn reason(&self) -> Option<&E> {
        match self {
            StreamError::Reason(e) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn misuse(msg: &'static str) -> Self {
        StreamError::Misuse(msg)
    }

    pub(crate) fn state(msg: &'static str) -> Self {
        StreamError::State(msg)
    }

    pub(crate) fn range(msg: &'static str) -> Self {
        StreamError::Range(msg)
    }
}

/// Convenience alias used throughout the crate.
pub type StreamResult<T, E> = Result<T, StreamError<E>>;
