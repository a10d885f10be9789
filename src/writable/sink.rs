use async_trait::async_trait;

use super::WritableStreamDefaultController;

/// The user-supplied algorithms backing a [`WritableStream`](super::WritableStream)
/// (§3 "Writable Stream", the `start`/`write`/`close`/`abort` algorithms).
///
/// All four methods default to doing nothing / succeeding, so an
/// implementation only needs to override what it actually uses.
#[async_trait]
pub trait UnderlyingSink<T, E>: Send
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Runs once, before any chunk is accepted, while the controller is
    /// bound (§3 "Controller (Writable Default)").
    async fn start(&mut self, _controller: WritableStreamDefaultController<T, E>) -> Result<(), E> {
        Ok(())
    }

    /// Writes a single chunk. The next `write`/`close` only starts once this
    /// one settles (§4.E "Write algorithm").
    async fn write(
        &mut self,
        _chunk: T,
        _controller: WritableStreamDefaultController<T, E>,
    ) -> Result<(), E> {
        Ok(())
    }

    /// Called once, after every previously queued chunk has been written
    /// successfully (§4.E "Close algorithm").
    async fn close(&mut self) -> Result<(), E> {
        Ok(())
    }

    /// Called when the stream is aborted or when an in-progress write fails,
    /// discarding any still-queued chunks (§4.E "Abort algorithm").
    async fn abort(&mut self, _reason: Option<E>) -> Result<(), E> {
        Ok(())
    }
}

/// A sink with no algorithms at all; every chunk written to it is silently
/// accepted.
pub(crate) struct NullSink;

#[async_trait]
impl<T, E> UnderlyingSink<T, E> for NullSink
where
    T: Send + 'static,
    E: Send + 'static,
{
}
