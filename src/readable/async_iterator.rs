//! A lazy async-iterator adapter over a reader (§4.I "Async iterator").
use std::fmt;

use crate::error::StreamResult;

use super::ReadableStreamDefaultReader;

/// A finite, non-restartable async sequence over a [`ReadableStream`](super::ReadableStream)'s
/// chunks, obtained via [`ReadableStream::values`](super::ReadableStream::values).
///
/// Once [`next`](Self::next) returns `Ok(None)` or an error, or once
/// [`return_`](Self::return_) has been called, the iterator is terminal:
/// every later call to `next` keeps returning `Ok(None)` without touching
/// the stream again.
pub struct StreamAsyncIterator<T, E: fmt::Debug + fmt::Display> {
    reader: Option<ReadableStreamDefaultReader<T, E>>,
    prevent_cancel: bool,
}

impl<T, E> StreamAsyncIterator<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    pub(crate) fn new(reader: ReadableStreamDefaultReader<T, E>, prevent_cancel: bool) -> Self {
        StreamAsyncIterator {
            reader: Some(reader),
            prevent_cancel,
        }
    }

    /// Reads the next chunk.
    pub async fn next(&mut self) -> StreamResult<Option<T>, E> {
        let result = match &self.reader {
            Some(reader) => reader.read().await,
            None => return Ok(None),
        };
        if !matches!(result, Ok(Some(_))) {
            self.reader = None;
        }
        result
    }

    /// Stops iteration early, cancelling the stream with `reason` unless
    /// `prevent_cancel` was set when this iterator was obtained
    /// (§4.I "return"). A no-op if iteration has already finished.
    pub async fn return_(&mut self, reason: Option<E>) -> StreamResult<(), E> {
        match self.reader.take() {
            Some(reader) => {
                if self.prevent_cancel {
                    Ok(())
                } else {
                    reader.cancel(reason).await
                }
            }
            None => Ok(()),
        }
    }
}
