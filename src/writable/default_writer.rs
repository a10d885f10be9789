use std::fmt;

use crate::error::StreamResult;

use super::controller::{self, Shared};
use super::into_sink::IntoSink;

/// A [`WritableStreamDefaultWriter`](https://streams.spec.whatwg.org/#default-writer-class),
/// obtained by [`WritableStream::get_writer`](super::WritableStream::get_writer).
///
/// Dropping the writer releases the lock, same as an explicit call to
/// [`release_lock`](Self::release_lock).
pub struct WritableStreamDefaultWriter<T, E: fmt::Debug + fmt::Display> {
    shared: Shared<T, E>,
    released: bool,
}

impl<T, E> WritableStreamDefaultWriter<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    pub(crate) fn new(shared: &Shared<T, E>) -> StreamResult<Self, E> {
        shared
            .lock()
            .map_err(|_| crate::error::StreamError::misuse("cannot get a writer for a locked stream"))?;
        Ok(WritableStreamDefaultWriter {
            shared: shared.clone(),
            released: false,
        })
    }

    /// Waits for the stream to become closed (§4.E "closed" promise).
    pub async fn closed(&self) -> StreamResult<(), E> {
        controller::closed(&self.shared).await
    }

    /// The desired size to fill the stream's internal queue (§4.E "Desired size").
    pub fn desired_size(&self) -> Option<f64> {
        self.shared.desired_size()
    }

    /// Waits until the desired size transitions from non-positive to
    /// positive, signaling that backpressure has been released
    /// (§4.E "Ready").
    pub async fn ready(&self) -> StreamResult<(), E> {
        controller::ready(&self.shared).await
    }

    /// [Aborts](https://streams.spec.whatwg.org/#abort-a-writable-stream) the stream.
    pub async fn abort(&self, reason: Option<E>) -> StreamResult<(), E> {
        controller::abort(&self.shared, reason).await
    }

    /// Writes `chunk`, waiting for any previously queued writes to settle
    /// first (§4.E "Write").
    pub async fn write(&self, chunk: T) -> StreamResult<(), E> {
        controller::write(&self.shared, chunk).await
    }

    /// Closes the stream, letting any previously queued writes finish first
    /// (§4.E "Close").
    pub async fn close(&self) -> StreamResult<(), E> {
        controller::close(&self.shared).await
    }

    /// Releases the lock, allowing the stream to be locked to another writer.
    pub fn release_lock(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.shared.release_lock();
    }

    /// Converts this writer into a [`futures_util::Sink`].
    pub fn into_sink(self) -> IntoSink<T, E> {
        IntoSink::new(self)
    }

    pub(crate) fn shared(&self) -> &Shared<T, E> {
        &self.shared
    }
}

impl<T, E: fmt::Debug + fmt::Display> Drop for WritableStreamDefaultWriter<T, E> {
    fn drop(&mut self) {
        if !self.released {
            self.shared.release_lock();
        }
    }
}
