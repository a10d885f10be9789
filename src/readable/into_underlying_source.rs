use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use futures_util::StreamExt;

use super::controller::ReadableStreamDefaultController;
use super::source::UnderlyingSource;

/// Wraps a Rust [`Stream`] as an [`UnderlyingSource`], so that
/// [`ReadableStream::from_stream`](super::ReadableStream::from_stream) can
/// drive a stream already written against `futures_core` without its caller
/// implementing the trait by hand.
pub(crate) struct StreamSource<St> {
    stream: Pin<Box<St>>,
}

impl<St> StreamSource<St> {
    pub(crate) fn new(stream: St) -> Self {
        StreamSource {
            stream: Box::pin(stream),
        }
    }
}

#[async_trait]
impl<St, T, E> UnderlyingSource<T, E> for StreamSource<St>
where
    St: Stream<Item = Result<T, E>> + Send,
    T: Send + 'static,
    E: Send + 'static,
{
    async fn pull(&mut self, controller: ReadableStreamDefaultController<T, E>) -> Result<(), E> {
        match self.stream.next().await {
            Some(Ok(chunk)) => {
                let _ = controller.enqueue(chunk).await;
                Ok(())
            }
            Some(Err(reason)) => Err(reason),
            None => {
                let _ = controller.close();
                Ok(())
            }
        }
    }
}
