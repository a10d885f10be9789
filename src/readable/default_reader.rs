use std::fmt;

use crate::error::{StreamError, StreamResult};
use crate::settlement::Settlement;

use super::controller::Shared;

/// A [`ReadableStreamDefaultReader`](https://streams.spec.whatwg.org/#default-reader-class),
/// obtained by [`ReadableStream::get_reader`](super::ReadableStream::get_reader).
///
/// Dropping the reader releases the lock (§4.D "Release a read lock"), same
/// as an explicit call to [`release_lock`](Self::release_lock).
pub struct ReadableStreamDefaultReader<T, E: fmt::Debug + fmt::Display> {
    shared: Shared<T, E>,
    closed: Settlement<StreamResult<(), E>>,
    released: bool,
}

impl<T, E> ReadableStreamDefaultReader<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    pub(crate) fn new(shared: &Shared<T, E>) -> StreamResult<Self, E> {
        let closed = shared
            .lock()
            .map_err(|_| StreamError::misuse("cannot get a reader for a locked stream"))?;
        Ok(ReadableStreamDefaultReader {
            shared: shared.clone(),
            closed,
            released: false,
        })
    }

    /// Reads the next chunk. Resolves to `Ok(None)` once the stream closes;
    /// further calls after that keep resolving to `Ok(None)`, but calls made
    /// after [`release_lock`](Self::release_lock) fail with a misuse error.
    pub async fn read(&self) -> StreamResult<Option<T>, E> {
        if self.released {
            return Err(StreamError::misuse("reader has already released its lock"));
        }
        self.shared.read(&self.shared).await
    }

    /// Resolves once the stream closes or errors, without consuming a chunk
    /// (§4.D "closed" promise).
    pub async fn closed(&self) -> StreamResult<(), E> {
        self.closed.clone().await
    }

    /// [Cancels](https://streams.spec.whatwg.org/#cancel-a-readable-stream) the
    /// stream via this reader's lock.
    pub async fn cancel(&self, reason: Option<E>) -> StreamResult<(), E> {
        super::controller::controller_of(&self.shared).cancel(reason).await
    }

    /// Releases the lock, allowing the stream to be locked to another reader.
    ///
    /// Any pending `read()` calls are rejected rather than left hanging,
    /// a relaxed, non-panicking release behavior in place of an assertion
    /// that the reader have no pending reads.
    pub fn release_lock(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.shared.release_lock();
    }

    /// Converts this reader into a [`futures_core::Stream`] of chunks.
    pub fn into_stream(self) -> super::IntoStream<T, E> {
        super::IntoStream::new(self)
    }
}

impl<T, E: fmt::Debug + fmt::Display> Drop for ReadableStreamDefaultReader<T, E> {
    fn drop(&mut self) {
        if !self.released {
            self.shared.release_lock();
        }
    }
}
