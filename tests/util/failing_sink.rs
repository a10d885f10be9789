use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Sink;

/// A `Sink` that fails the first item written to it, then accepts
/// everything after that.
pub struct FailingSink<T, E> {
    failed_once: bool,
    error: Option<E>,
    _marker: std::marker::PhantomData<T>,
}

impl<T, E> FailingSink<T, E> {
    pub fn new(error: E) -> Self {
        FailingSink {
            failed_once: false,
            error: Some(error),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: Unpin, E: Unpin> Sink<T> for FailingSink<T, E> {
    type Error = E;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(mut self: Pin<&mut Self>, _item: T) -> Result<(), Self::Error> {
        if !self.failed_once {
            self.failed_once = true;
            if let Some(error) = self.error.take() {
                return Err(error);
            }
        }
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}
