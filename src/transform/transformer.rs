use async_trait::async_trait;

use super::TransformStreamDefaultController;

/// The user-supplied algorithms backing a [`TransformStream`](super::TransformStream)
/// (§3 "Transform Stream", the `start`/`transform`/`flush` algorithms).
#[async_trait]
pub trait Transformer<I, O, E>: Send
where
    I: Send + 'static,
    O: Send + 'static,
    E: Send + 'static,
{
    /// Runs once, before any chunk is written, while the controller is bound
    /// (§3 "Controller (Transform Default)").
    async fn start(&mut self, _controller: TransformStreamDefaultController<O, E>) -> Result<(), E> {
        Ok(())
    }

    /// Transforms a single written chunk. May call `controller.enqueue` zero
    /// or more times, and/or `controller.error`/`terminate` (§4.F "Transform").
    async fn transform(
        &mut self,
        chunk: I,
        controller: TransformStreamDefaultController<O, E>,
    ) -> Result<(), E>;

    /// Called once the writable side closes, after every write has settled
    /// (§4.F "Flush").
    async fn flush(&mut self, _controller: TransformStreamDefaultController<O, E>) -> Result<(), E> {
        Ok(())
    }
}
