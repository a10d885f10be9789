use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use futures_core::Stream;
use futures_util::Sink;

/// An in-memory `Stream` + `Sink` double, playing the part of a host
/// channel in tests that need a real async source/destination instead of
/// a hand-written `UnderlyingSource`/`UnderlyingSink`.
pub struct SimpleChannel<T> {
    inner: VecDeque<T>,
    closed: bool,
    waker: Option<Waker>,
}

impl<T> SimpleChannel<T> {
    pub fn new() -> Self {
        SimpleChannel {
            inner: VecDeque::new(),
            closed: false,
            waker: None,
        }
    }

    pub fn push(&mut self, item: T) {
        self.inner.push_back(item);
        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
    }

    pub fn close(&mut self) {
        self.closed = true;
        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
    }
}

impl<T> Default for SimpleChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Unpin> Stream for SimpleChannel<T> {
    type Item = Result<T, std::convert::Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(item) = self.inner.pop_front() {
            return Poll::Ready(Some(Ok(item)));
        }
        if self.closed {
            return Poll::Ready(None);
        }
        self.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl<T: Unpin> Sink<T> for SimpleChannel<T> {
    type Error = std::convert::Infallible;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(mut self: Pin<&mut Self>, item: T) -> Result<(), Self::Error> {
        self.push(item);
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.close();
        Poll::Ready(Ok(()))
    }
}
