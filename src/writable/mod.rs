//! A portable, host-independent [writable stream](https://streams.spec.whatwg.org/#ws-model).
use std::fmt;

use futures_util::Sink;

pub use controller::WritableStreamDefaultController;
pub use default_writer::WritableStreamDefaultWriter;
pub use into_sink::IntoSink;
pub use sink::UnderlyingSink;

use crate::error::StreamResult;
use crate::queuing_strategy::QueuingStrategy;

use self::controller::{controller_of, new_shared, Shared};
use self::into_underlying_sink::SinkSink;
use self::sink::NullSink;

pub(crate) mod controller;
mod default_writer;
mod into_sink;
mod into_underlying_sink;
mod sink;

/// A [`WritableStream`](https://streams.spec.whatwg.org/#ws-class).
///
/// `T` is the chunk type; `E` is the reason/error type used for abort and
/// for errors raised by the underlying sink.
pub struct WritableStream<T, E: fmt::Debug + fmt::Display> {
    shared: Shared<T, E>,
}

impl<T, E> WritableStream<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    /// Creates a new `WritableStream` from an [`UnderlyingSink`] and a
    /// [`QueuingStrategy`] (§6 "Writable constructor").
    pub fn new(sink: Box<dyn UnderlyingSink<T, E>>, strategy: QueuingStrategy<T, E>) -> Self {
        WritableStream {
            shared: new_shared(sink, strategy),
        }
    }

    /// Creates a `WritableStream` with the default ("count") strategy and
    /// high-water mark of `1` (§6).
    pub fn from_sink_impl(sink: Box<dyn UnderlyingSink<T, E>>) -> Self {
        Self::new(sink, QueuingStrategy::count(1.0).expect("1.0 is a valid hwm"))
    }

    /// Creates a `WritableStream` from a [`futures_util::Sink`].
    pub fn from_sink<Si>(sink: Si) -> Self
    where
        Si: Sink<T, Error = E> + Send + 'static,
    {
        let sink = Box::new(SinkSink::new(sink));
        Self::from_sink_impl(sink)
    }

    /// Returns `true` if the stream is [locked](https://streams.spec.whatwg.org/#lock) to a writer.
    pub fn is_locked(&self) -> bool {
        self.shared.is_locked()
    }

    /// [Aborts](https://streams.spec.whatwg.org/#abort-a-writable-stream) the
    /// stream, discarding any queued writes.
    ///
    /// Fails with a misuse error if the stream is currently locked to a writer.
    pub async fn abort(&mut self, reason: Option<E>) -> StreamResult<(), E> {
        if self.shared.is_locked() {
            return Err(crate::error::StreamError::misuse(
                "cannot abort a stream that is locked to a writer",
            ));
        }
        controller::abort(&self.shared, reason).await
    }

    /// Creates a [`WritableStreamDefaultWriter`] and locks the stream to it.
    ///
    /// If the stream is already locked, returns a misuse error.
    pub fn get_writer(&mut self) -> StreamResult<WritableStreamDefaultWriter<T, E>, E> {
        WritableStreamDefaultWriter::new(&self.shared)
    }

    /// Converts this stream into a [`futures_util::Sink`].
    ///
    /// Fails with a misuse error if the stream is already locked.
    pub fn into_sink(mut self) -> StreamResult<IntoSink<T, E>, E> {
        let writer = self.get_writer()?;
        Ok(IntoSink::new(writer))
    }

    pub(crate) fn shared(&self) -> &Shared<T, E> {
        &self.shared
    }

    pub(crate) fn from_shared(shared: Shared<T, E>) -> Self {
        WritableStream { shared }
    }

    /// Creates a `WritableStream` with no underlying sink algorithms, driven
    /// entirely through the returned controller.
    pub fn channel(
        strategy: QueuingStrategy<T, E>,
    ) -> (Self, WritableStreamDefaultController<T, E>) {
        let stream = Self::new(Box::new(NullSink), strategy);
        let controller = controller_of(&stream.shared);
        (stream, controller)
    }
}
