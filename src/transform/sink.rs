use std::fmt;

use async_trait::async_trait;

use crate::writable::{UnderlyingSink, WritableStreamDefaultController};

use super::controller::TransformStreamDefaultController;
use super::transformer::Transformer;

/// The writable side's [`UnderlyingSink`] for a transform stream: each write
/// is handed to the [`Transformer`], gated by the readable side's
/// backpressure signal; closing runs `flush` then closes the readable side
/// (§4.F "Write"/"Close algorithm").
pub(crate) struct TransformSink<I, O, E: fmt::Debug + fmt::Display> {
    pub(crate) transformer: Box<dyn Transformer<I, O, E>>,
    pub(crate) controller: TransformStreamDefaultController<O, E>,
}

#[async_trait]
impl<I, O, E> UnderlyingSink<I, E> for TransformSink<I, O, E>
where
    I: Send + 'static,
    O: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    async fn start(&mut self, _controller: WritableStreamDefaultController<I, E>) -> Result<(), E> {
        self.transformer.start(self.controller.clone()).await?;
        // Seed backpressure with an immediate pull-if-needed right after
        // setup, so it starts out accurate instead of permanently blocked
        // until some unrelated call happens to touch the readable side.
        let _ = self.controller.readable.maybe_pull().await;
        Ok(())
    }

    async fn write(
        &mut self,
        chunk: I,
        _controller: WritableStreamDefaultController<I, E>,
    ) -> Result<(), E> {
        self.controller.backpressure.get().await;
        match self.transformer.transform(chunk, self.controller.clone()).await {
            Ok(()) => Ok(()),
            Err(reason) => {
                self.controller.error(reason.clone());
                Err(reason)
            }
        }
    }

    async fn close(&mut self) -> Result<(), E> {
        match self.transformer.flush(self.controller.clone()).await {
            Ok(()) => {
                let _ = self.controller.readable.close();
                Ok(())
            }
            Err(reason) => {
                self.controller.error(reason.clone());
                Err(reason)
            }
        }
    }

    async fn abort(&mut self, reason: Option<E>) -> Result<(), E> {
        if let Some(reason) = reason {
            self.controller.readable.error(reason);
        }
        Ok(())
    }
}
