use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use streams_core::abort_signal::AbortController;
use streams_core::readable::{PipeOptions, ReadableStream, ReadableStreamDefaultController, UnderlyingSource};
use streams_core::writable::{UnderlyingSink, WritableStream, WritableStreamDefaultController};

struct VecSource {
    items: Vec<i32>,
}

#[async_trait]
impl UnderlyingSource<i32, &'static str> for VecSource {
    async fn start(
        &mut self,
        controller: ReadableStreamDefaultController<i32, &'static str>,
    ) -> Result<(), &'static str> {
        for item in self.items.drain(..) {
            controller.enqueue(item).await.map_err(|_| "enqueue failed")?;
        }
        controller.close().map_err(|_| "close failed")?;
        Ok(())
    }
}

struct RecordingSink {
    chunks: Arc<std::sync::Mutex<Vec<i32>>>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl UnderlyingSink<i32, &'static str> for RecordingSink {
    async fn write(
        &mut self,
        chunk: i32,
        _controller: WritableStreamDefaultController<i32, &'static str>,
    ) -> Result<(), &'static str> {
        self.chunks.lock().unwrap().push(chunk);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), &'static str> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn pipes_every_chunk_then_closes_destination() {
    let chunks = Arc::new(std::sync::Mutex::new(Vec::new()));
    let closed = Arc::new(AtomicUsize::new(0));

    let mut source = ReadableStream::from_source(Box::new(VecSource {
        items: vec![1, 2, 3],
    }));
    let mut dest = WritableStream::from_sink_impl(Box::new(RecordingSink {
        chunks: chunks.clone(),
        closed: closed.clone(),
    }));

    source.pipe_to(&mut dest).await.unwrap();

    assert_eq!(*chunks.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

struct FailingWriteSink;

#[async_trait]
impl UnderlyingSink<i32, &'static str> for FailingWriteSink {
    async fn write(
        &mut self,
        _chunk: i32,
        _controller: WritableStreamDefaultController<i32, &'static str>,
    ) -> Result<(), &'static str> {
        Err("write failed")
    }
}

#[tokio::test]
async fn destination_failure_cancels_the_source() {
    let cancelled = Arc::new(AtomicUsize::new(0));

    struct CancelTrackingSource {
        cancelled: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl UnderlyingSource<i32, &'static str> for CancelTrackingSource {
        async fn start(
            &mut self,
            controller: ReadableStreamDefaultController<i32, &'static str>,
        ) -> Result<(), &'static str> {
            controller.enqueue(1).await.map_err(|_| "enqueue failed")
        }

        async fn cancel(&mut self, _reason: Option<&'static str>) -> Result<(), &'static str> {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    let mut source = ReadableStream::from_source(Box::new(CancelTrackingSource {
        cancelled: cancelled.clone(),
    }));
    let mut dest = WritableStream::from_sink_impl(Box::new(FailingWriteSink));

    let err = source.pipe_to(&mut dest).await.unwrap_err();
    assert_eq!(err.reason(), Some(&"write failed"));
    assert_eq!(cancelled.load(Ordering::SeqCst), 1);
}

struct FailingReadSource;

#[async_trait]
impl UnderlyingSource<i32, &'static str> for FailingReadSource {
    async fn start(
        &mut self,
        _controller: ReadableStreamDefaultController<i32, &'static str>,
    ) -> Result<(), &'static str> {
        Err("read failed")
    }
}

#[tokio::test]
async fn source_failure_aborts_the_destination() {
    let aborted_with = Arc::new(std::sync::Mutex::new(None));

    struct AbortTrackingSink {
        aborted_with: Arc<std::sync::Mutex<Option<&'static str>>>,
    }

    #[async_trait]
    impl UnderlyingSink<i32, &'static str> for AbortTrackingSink {
        async fn abort(&mut self, reason: Option<&'static str>) -> Result<(), &'static str> {
            *self.aborted_with.lock().unwrap() = reason;
            Ok(())
        }
    }

    let mut source = ReadableStream::from_source(Box::new(FailingReadSource));
    let mut dest = WritableStream::from_sink_impl(Box::new(AbortTrackingSink {
        aborted_with: aborted_with.clone(),
    }));

    let err = source.pipe_to(&mut dest).await.unwrap_err();
    assert_eq!(err.reason(), Some(&"read failed"));
    assert_eq!(*aborted_with.lock().unwrap(), Some("read failed"));
}

#[tokio::test]
async fn prevent_close_leaves_destination_open() {
    let chunks = Arc::new(std::sync::Mutex::new(Vec::new()));
    let closed = Arc::new(AtomicUsize::new(0));

    let mut source = ReadableStream::from_source(Box::new(VecSource { items: vec![1] }));
    let mut dest = WritableStream::from_sink_impl(Box::new(RecordingSink {
        chunks: chunks.clone(),
        closed: closed.clone(),
    }));

    let mut options = PipeOptions::new();
    options.prevent_close(true);
    source.pipe_to_with_options(&mut dest, &options).await.unwrap();

    assert_eq!(*chunks.lock().unwrap(), vec![1]);
    assert_eq!(closed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn an_aborted_signal_stops_the_pipe_with_its_reason() {
    struct NeverEndingSource;

    #[async_trait]
    impl UnderlyingSource<i32, &'static str> for NeverEndingSource {}

    let aborted_with = Arc::new(std::sync::Mutex::new(None));

    struct AbortTrackingSink {
        aborted_with: Arc<std::sync::Mutex<Option<&'static str>>>,
    }

    #[async_trait]
    impl UnderlyingSink<i32, &'static str> for AbortTrackingSink {
        async fn abort(&mut self, reason: Option<&'static str>) -> Result<(), &'static str> {
            *self.aborted_with.lock().unwrap() = reason;
            Ok(())
        }
    }

    let mut source = ReadableStream::from_source(Box::new(NeverEndingSource));
    let mut dest = WritableStream::from_sink_impl(Box::new(AbortTrackingSink {
        aborted_with: aborted_with.clone(),
    }));

    let controller = AbortController::new();
    let mut options = PipeOptions::new();
    options.signal(controller.signal());

    controller.abort("timed out");
    let err = source
        .pipe_to_with_options(&mut dest, &options)
        .await
        .unwrap_err();
    assert_eq!(err.reason(), Some(&"timed out"));
    assert_eq!(*aborted_with.lock().unwrap(), Some("timed out"));
}
