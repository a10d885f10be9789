use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::ready;
use futures_util::sink::Sink;

use crate::error::StreamError;

use super::controller::{self, Shared};
use super::default_writer::WritableStreamDefaultWriter;

type VoidFut<E> = Pin<Box<dyn Future<Output = Result<(), StreamError<E>>> + Send>>;

/// A [`Sink`] for [`WritableStream::into_sink`](super::WritableStream::into_sink).
///
/// Holds the writer (and therefore the lock) for as long as it lives; when
/// dropped, the writer's `Drop` releases the lock.
pub struct IntoSink<T, E: fmt::Debug + fmt::Display> {
    writer: Option<WritableStreamDefaultWriter<T, E>>,
    shared: Shared<T, E>,
    ready_fut: Option<VoidFut<E>>,
    write_fut: Option<VoidFut<E>>,
    close_fut: Option<VoidFut<E>>,
}

impl<T, E> IntoSink<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    pub(super) fn new(writer: WritableStreamDefaultWriter<T, E>) -> Self {
        let shared = writer.shared().clone();
        IntoSink {
            writer: Some(writer),
            shared,
            ready_fut: None,
            write_fut: None,
            close_fut: None,
        }
    }
}

impl<T, E> Sink<T> for IntoSink<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    type Error = StreamError<E>;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        if self.ready_fut.is_none() {
            if self.writer.is_none() {
                return Poll::Ready(Ok(()));
            }
            let shared = self.shared.clone();
            self.as_mut().ready_fut = Some(Box::pin(async move { controller::ready(&shared).await }));
        }
        let result = ready!(self.as_mut().ready_fut.as_mut().unwrap().as_mut().poll(cx));
        self.as_mut().ready_fut = None;
        if result.is_err() {
            self.as_mut().writer = None;
        }
        Poll::Ready(result)
    }

    fn start_send(mut self: Pin<&mut Self>, item: T) -> Result<(), Self::Error> {
        if self.writer.is_none() {
            return Ok(());
        }
        let shared = self.shared.clone();
        self.as_mut().write_fut = Some(Box::pin(async move { controller::write(&shared, item).await }));
        Ok(())
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        if self.write_fut.is_none() {
            return Poll::Ready(Ok(()));
        }
        let result = ready!(self.as_mut().write_fut.as_mut().unwrap().as_mut().poll(cx));
        self.as_mut().write_fut = None;
        if result.is_err() {
            self.as_mut().writer = None;
        }
        Poll::Ready(result)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        if self.close_fut.is_none() {
            if self.writer.is_none() {
                return Poll::Ready(Ok(()));
            }
            let shared = self.shared.clone();
            self.as_mut().close_fut = Some(Box::pin(async move { controller::close(&shared).await }));
        }
        let result = ready!(self.as_mut().close_fut.as_mut().unwrap().as_mut().poll(cx));
        self.as_mut().close_fut = None;
        self.as_mut().writer = None;
        Poll::Ready(result)
    }
}
