use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::error::StreamResult;

use super::default_reader::ReadableStreamDefaultReader;

type PendingRead<T, E> =
    Pin<Box<dyn Future<Output = (ReadableStreamDefaultReader<T, E>, StreamResult<Option<T>, E>)> + Send>>;

/// Adapts a [`ReadableStreamDefaultReader`] into a [`futures_core::Stream`].
///
/// Every field here is independently [`Unpin`], since the in-flight read
/// future is already boxed, so no extra pinning crate is needed.
pub struct IntoStream<T, E: fmt::Debug + fmt::Display> {
    reader: Option<ReadableStreamDefaultReader<T, E>>,
    fut: Option<PendingRead<T, E>>,
}

impl<T, E> IntoStream<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    pub(crate) fn new(reader: ReadableStreamDefaultReader<T, E>) -> Self {
        IntoStream {
            reader: Some(reader),
            fut: None,
        }
    }
}

impl<T, E> Stream for IntoStream<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    type Item = StreamResult<T, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.fut.is_none() {
            let reader = match this.reader.take() {
                Some(reader) => reader,
                None => return Poll::Ready(None),
            };
            this.fut = Some(Box::pin(async move {
                let result = reader.read().await;
                (reader, result)
            }));
        }
        let fut = this.fut.as_mut().unwrap();
        match fut.as_mut().poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready((reader, result)) => {
                this.fut = None;
                match result {
                    Ok(Some(chunk)) => {
                        this.reader = Some(reader);
                        Poll::Ready(Some(Ok(chunk)))
                    }
                    Ok(None) => Poll::Ready(None),
                    Err(err) => {
                        this.reader = Some(reader);
                        Poll::Ready(Some(Err(err)))
                    }
                }
            }
        }
    }
}
