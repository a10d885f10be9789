mod util;

use async_trait::async_trait;
use futures_util::stream::StreamExt;

use streams_core::error::StreamError;
use streams_core::queuing_strategy::QueuingStrategy;
use streams_core::readable::{ReadableStream, ReadableStreamDefaultController, UnderlyingSource};

use util::SimpleChannel;

struct NoopSource;

#[async_trait]
impl UnderlyingSource<&'static str, &'static str> for NoopSource {}

struct HelloWorldSource;

#[async_trait]
impl UnderlyingSource<&'static str, &'static str> for HelloWorldSource {
    async fn start(
        &mut self,
        controller: ReadableStreamDefaultController<&'static str, &'static str>,
    ) -> Result<(), &'static str> {
        controller.enqueue("Hello").await.map_err(|_| "enqueue failed")?;
        controller.enqueue("world!").await.map_err(|_| "enqueue failed")?;
        controller.close().map_err(|_| "close failed")?;
        Ok(())
    }
}

#[tokio::test]
async fn new_reads_chunks_in_order_then_closes() {
    let mut readable = ReadableStream::from_source(Box::new(HelloWorldSource));
    assert!(!readable.is_locked());

    let mut reader = readable.get_reader().unwrap();
    assert_eq!(reader.read().await.unwrap(), Some("Hello"));
    assert_eq!(reader.read().await.unwrap(), Some("world!"));
    assert_eq!(reader.read().await.unwrap(), None);
    reader.closed().await.unwrap();
}

#[tokio::test]
async fn into_stream_adapts_to_futures_stream() {
    let mut readable = ReadableStream::from_source(Box::new(HelloWorldSource));
    let reader = readable.get_reader().unwrap();
    let mut stream = Box::pin(reader.into_stream());

    assert_eq!(stream.next().await, Some(Ok("Hello")));
    assert_eq!(stream.next().await, Some(Ok("world!")));
    assert_eq!(stream.next().await, None);
}

#[tokio::test]
async fn get_reader_twice_is_a_misuse_error() {
    let mut readable = ReadableStream::from_source(Box::new(NoopSource));
    let _reader = readable.get_reader().unwrap();
    assert!(matches!(readable.get_reader(), Err(StreamError::Misuse(_))));
}

#[tokio::test]
async fn releasing_the_lock_allows_a_new_reader() {
    let mut readable = ReadableStream::from_source(Box::new(NoopSource));

    let mut reader = readable.get_reader().unwrap();
    reader.release_lock();
    reader.release_lock();

    assert!(!readable.is_locked());
    let _reader2 = readable.get_reader().unwrap();
}

#[tokio::test]
async fn dropping_a_reader_releases_the_lock() {
    let mut readable = ReadableStream::from_source(Box::new(NoopSource));
    {
        let _reader = readable.get_reader().unwrap();
        assert!(readable.is_locked());
    }
    assert!(!readable.is_locked());
}

#[tokio::test]
async fn cancel_through_the_reader_calls_the_underlying_cancel() {
    struct CancelSource {
        hits: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    #[async_trait]
    impl UnderlyingSource<i32, &'static str> for CancelSource {
        async fn cancel(&mut self, reason: Option<&'static str>) -> Result<(), &'static str> {
            assert_eq!(reason, Some("stop"));
            self.hits.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
    }

    let hits = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let mut readable = ReadableStream::from_source(Box::new(CancelSource { hits: hits.clone() }));
    let reader = readable.get_reader().unwrap();
    reader.cancel(Some("stop")).await.unwrap();
    assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn channel_lets_a_controller_drive_reads_directly() {
    let (mut readable, controller) =
        ReadableStream::<i32, &'static str>::channel(QueuingStrategy::count(2.0).unwrap());
    controller.enqueue(1).await.unwrap();
    controller.enqueue(2).await.unwrap();
    controller.close().unwrap();

    let reader = readable.get_reader().unwrap();
    assert_eq!(reader.read().await.unwrap(), Some(1));
    assert_eq!(reader.read().await.unwrap(), Some(2));
    assert_eq!(reader.read().await.unwrap(), None);
}

#[tokio::test]
async fn from_stream_wraps_a_futures_stream() {
    let mut channel = SimpleChannel::<i32>::new();
    channel.push(1);
    channel.push(2);
    channel.close();

    let mut readable = ReadableStream::<i32, std::convert::Infallible>::from_stream(channel);
    let reader = readable.get_reader().unwrap();
    assert_eq!(reader.read().await.unwrap(), Some(1));
    assert_eq!(reader.read().await.unwrap(), Some(2));
    assert_eq!(reader.read().await.unwrap(), None);
}

#[tokio::test]
async fn values_iterates_chunks_then_stops() {
    let readable = ReadableStream::from_source(Box::new(HelloWorldSource));
    let mut iter = readable.values(false).unwrap();
    assert_eq!(iter.next().await.unwrap(), Some("Hello"));
    assert_eq!(iter.next().await.unwrap(), Some("world!"));
    assert_eq!(iter.next().await.unwrap(), None);
    assert_eq!(iter.next().await.unwrap(), None);
}
