//! A portable, host-independent [readable stream](https://streams.spec.whatwg.org/#rs-model).
use std::fmt;

use futures_core::Stream;

pub use async_iterator::StreamAsyncIterator;
pub use controller::ReadableStreamDefaultController;
pub use default_reader::ReadableStreamDefaultReader;
pub use into_stream::IntoStream;
pub use pipe_options::PipeOptions;
pub use source::{ReadableStreamType, UnderlyingSource};

use crate::error::{StreamError, StreamResult};
use crate::queuing_strategy::QueuingStrategy;
use crate::writable::WritableStream;

use self::controller::{controller_of, new_shared, Shared};
use self::into_underlying_source::StreamSource;
use self::source::NullSource;

pub(crate) mod controller;
mod default_reader;
mod into_stream;
mod into_underlying_source;
mod pipe_options;
mod source;

pub mod async_iterator;
pub mod pipe;
pub mod tee;

/// A [`ReadableStream`](https://streams.spec.whatwg.org/#rs-class).
///
/// `T` is the chunk type; `E` is the reason/error type used for cancellation
/// and for errors raised by the underlying source.
pub struct ReadableStream<T, E: fmt::Debug + fmt::Display> {
    shared: Shared<T, E>,
}

impl<T, E> ReadableStream<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    /// Creates a new `ReadableStream` from an [`UnderlyingSource`] and a
    /// [`QueuingStrategy`] (§6 "Readable constructor").
    pub fn new(source: Box<dyn UnderlyingSource<T, E>>, strategy: QueuingStrategy<T, E>) -> Self {
        ReadableStream {
            shared: new_shared(source, strategy),
        }
    }

    /// Creates a `ReadableStream` with the default ("count") strategy and
    /// high-water mark of `1` (§6).
    pub fn from_source(source: Box<dyn UnderlyingSource<T, E>>) -> Self {
        Self::new(source, QueuingStrategy::count(1.0).expect("1.0 is a valid hwm"))
    }

    /// Creates a `ReadableStream` from a Rust [`Stream`], using a
    /// high-water-mark-0 count strategy so that the wrapped `Stream` (which
    /// already buffers however it likes) isn't double-buffered here.
    pub fn from_stream<St>(stream: St) -> Self
    where
        St: Stream<Item = Result<T, E>> + Send + 'static,
    {
        let source = Box::new(StreamSource::new(stream));
        let strategy = QueuingStrategy::count(0.0).expect("0.0 is a valid hwm");
        Self::new(source, strategy)
    }

    /// Returns `true` if the stream is [locked](https://streams.spec.whatwg.org/#lock) to a reader.
    pub fn is_locked(&self) -> bool {
        self.shared.is_locked()
    }

    /// [Cancels](https://streams.spec.whatwg.org/#cancel-a-readable-stream) the stream.
    ///
    /// Fails with a misuse error if the stream is currently locked to a reader.
    pub async fn cancel(&mut self, reason: Option<E>) -> StreamResult<(), E> {
        if self.shared.is_locked() {
            return Err(StreamError::misuse(
                "cannot cancel a stream that is locked to a reader",
            ));
        }
        controller_of(&self.shared).cancel(reason).await
    }

    /// Creates a [`ReadableStreamDefaultReader`] and locks the stream to it.
    ///
    /// If the stream is already locked, returns a misuse error.
    pub fn get_reader(&mut self) -> StreamResult<ReadableStreamDefaultReader<T, E>, E> {
        ReadableStreamDefaultReader::new(&self.shared)
    }

    /// [Pipes](https://streams.spec.whatwg.org/#piping) this readable stream
    /// into `dest`, using the default [`PipeOptions`].
    pub async fn pipe_to(&mut self, dest: &mut WritableStream<T, E>) -> StreamResult<(), E> {
        self.pipe_to_with_options(dest, &PipeOptions::default()).await
    }

    /// [Pipes](https://streams.spec.whatwg.org/#piping) this readable stream
    /// into `dest` (§4.G), locking both for the duration of the pipe.
    pub async fn pipe_to_with_options(
        &mut self,
        dest: &mut WritableStream<T, E>,
        options: &PipeOptions<E>,
    ) -> StreamResult<(), E> {
        pipe::pipe(self, dest, options).await
    }

    /// [Tees](https://streams.spec.whatwg.org/#tee-a-readable-stream) this
    /// readable stream, returning two independent branches (§4.H).
    ///
    /// Chunks are forwarded as a shared [`Arc`] rather than cloned, so `T`
    /// need not implement [`Clone`].
    ///
    /// Fails with a misuse error if the stream is already locked.
    pub fn tee(
        self,
    ) -> Result<(ReadableStream<std::sync::Arc<T>, E>, ReadableStream<std::sync::Arc<T>, E>), StreamError<E>>
    where
        T: Sync,
    {
        tee::tee(self)
    }

    /// Converts this stream into a [`futures_core::Stream`] of chunks.
    ///
    /// Fails with a misuse error if the stream is already locked.
    pub fn into_stream(mut self) -> StreamResult<IntoStream<T, E>, E> {
        let reader = self.get_reader()?;
        Ok(IntoStream::new(reader))
    }

    /// Returns a lazy, non-restartable async iterator over this stream's
    /// chunks (§4.I "Async iterator").
    ///
    /// If `prevent_cancel` is set, [`return_`](StreamAsyncIterator::return_)
    /// leaves the underlying stream running instead of cancelling it.
    ///
    /// Fails with a misuse error if the stream is already locked.
    pub fn values(mut self, prevent_cancel: bool) -> StreamResult<StreamAsyncIterator<T, E>, E> {
        let reader = self.get_reader()?;
        Ok(StreamAsyncIterator::new(reader, prevent_cancel))
    }

    pub(crate) fn shared(&self) -> &Shared<T, E> {
        &self.shared
    }

    pub(crate) fn from_shared(shared: Shared<T, E>) -> Self {
        ReadableStream { shared }
    }

    /// Creates a `ReadableStream` with no underlying source algorithms,
    /// driven entirely through the returned controller. Useful for building
    /// a simple channel-like producer without implementing
    /// [`UnderlyingSource`].
    pub fn channel(
        strategy: QueuingStrategy<T, E>,
    ) -> (Self, ReadableStreamDefaultController<T, E>) {
        let stream = Self::new(Box::new(NullSource), strategy);
        let controller = controller_of(&stream.shared);
        (stream, controller)
    }
}
