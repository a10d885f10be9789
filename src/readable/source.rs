use async_trait::async_trait;

use super::ReadableStreamDefaultController;

/// Whether a readable stream is the default kind or a byte-oriented one.
///
/// Byte streams are recognized at the interface level (§6: a custom `size`
/// function is rejected when `type` is `Bytes`) but the BYOB buffer-splicing
/// algorithm itself is out of scope for this core (§1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadableStreamType {
    Default,
    Bytes,
}

/// The user-supplied algorithms backing a [`ReadableStream`](super::ReadableStream)
/// (§3 "Readable Stream", the `start`/`pull`/`cancel` algorithms).
///
/// All three methods default to doing nothing / succeeding, so an
/// implementation only needs to override what it actually uses (the
/// `start?`/`pull?`/`cancel?` algorithms are all optional in the underlying
/// source dictionary, §6).
#[async_trait]
pub trait UnderlyingSource<T, E>: Send
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Runs once, before any other algorithm, while the controller is bound
    /// but not yet usable by a consumer. May call `controller.enqueue`/`close`/
    /// `error` synchronously (§3 "Controller (Readable Default)").
    async fn start(&mut self, _controller: ReadableStreamDefaultController<T, E>) -> Result<(), E> {
        Ok(())
    }

    /// Called whenever the controller's pull discipline (§4.D) decides more
    /// chunks are wanted. At most one call is in flight at a time.
    async fn pull(&mut self, _controller: ReadableStreamDefaultController<T, E>) -> Result<(), E> {
        Ok(())
    }

    /// Called when the stream's consumer cancels it (§4.D "Cancel step").
    async fn cancel(&mut self, _reason: Option<E>) -> Result<(), E> {
        Ok(())
    }
}

/// A source with no algorithms at all; equivalent to a stream that never
/// enqueues anything on its own and must be driven entirely through its
/// controller.
pub(crate) struct NullSource;

#[async_trait]
impl<T, E> UnderlyingSource<T, E> for NullSource
where
    T: Send + 'static,
    E: Send + 'static,
{
}
