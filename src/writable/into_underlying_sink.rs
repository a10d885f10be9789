use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Sink, SinkExt};

use super::controller::WritableStreamDefaultController;
use super::sink::UnderlyingSink;

/// Wraps a [`futures_util::Sink`] as an [`UnderlyingSink`], so that
/// [`WritableStream::from_sink`](super::WritableStream::from_sink) can drive
/// a sink already written against `futures_util` without its caller
/// implementing the trait by hand.
///
/// Uses the same take-and-replace pattern as the readable side's
/// `StreamSource`: the sink is taken out of `Option` before every fallible
/// call, so a panic mid-`send` leaves `None` rather than a half-used sink.
pub(crate) struct SinkSink<Si> {
    sink: Option<Pin<Box<Si>>>,
}

impl<Si> SinkSink<Si> {
    pub(crate) fn new(sink: Si) -> Self {
        SinkSink {
            sink: Some(Box::pin(sink)),
        }
    }
}

#[async_trait]
impl<Si, T, E> UnderlyingSink<T, E> for SinkSink<Si>
where
    Si: Sink<T, Error = E> + Send,
    T: Send + 'static,
    E: Send + 'static,
{
    async fn write(
        &mut self,
        chunk: T,
        _controller: WritableStreamDefaultController<T, E>,
    ) -> Result<(), E> {
        let mut sink = match self.sink.take() {
            Some(sink) => sink,
            None => return Ok(()),
        };
        match sink.send(chunk).await {
            Ok(()) => {
                self.sink = Some(sink);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn close(&mut self) -> Result<(), E> {
        match self.sink.take() {
            Some(mut sink) => sink.close().await,
            None => Ok(()),
        }
    }

    async fn abort(&mut self, _reason: Option<E>) -> Result<(), E> {
        self.sink = None;
        Ok(())
    }
}
