use async_trait::async_trait;

use streams_core::transform::{TransformStream, TransformStreamDefaultController, Transformer};

struct UppercaseTransformer;

#[async_trait]
impl Transformer<String, String, &'static str> for UppercaseTransformer {
    async fn transform(
        &mut self,
        chunk: String,
        controller: TransformStreamDefaultController<String, &'static str>,
    ) -> Result<(), &'static str> {
        controller.enqueue(chunk.to_uppercase()).await.map_err(|_| "enqueue failed")
    }
}

#[tokio::test]
async fn writing_reads_back_the_transformed_chunk() {
    let transform = TransformStream::from_transformer(Box::new(UppercaseTransformer));
    let (mut writable, mut readable) = transform.into_parts();

    let writer = writable.get_writer().unwrap();
    let mut reader = readable.get_reader().unwrap();

    writer.write("hello".to_string()).await.unwrap();
    assert_eq!(reader.read().await.unwrap(), Some("HELLO".to_string()));

    writer.close().await.unwrap();
    assert_eq!(reader.read().await.unwrap(), None);
}

struct DropEveryOtherTransformer {
    count: usize,
}

#[async_trait]
impl Transformer<i32, i32, &'static str> for DropEveryOtherTransformer {
    async fn transform(
        &mut self,
        chunk: i32,
        controller: TransformStreamDefaultController<i32, &'static str>,
    ) -> Result<(), &'static str> {
        self.count += 1;
        if self.count % 2 == 1 {
            controller.enqueue(chunk).await.map_err(|_| "enqueue failed")?;
        }
        Ok(())
    }
}

#[tokio::test]
async fn transform_may_enqueue_zero_or_more_chunks() {
    let transform =
        TransformStream::from_transformer(Box::new(DropEveryOtherTransformer { count: 0 }));
    let (mut writable, mut readable) = transform.into_parts();
    let writer = writable.get_writer().unwrap();
    let mut reader = readable.get_reader().unwrap();

    writer.write(1).await.unwrap();
    writer.write(2).await.unwrap();
    writer.write(3).await.unwrap();
    writer.close().await.unwrap();

    assert_eq!(reader.read().await.unwrap(), Some(1));
    assert_eq!(reader.read().await.unwrap(), Some(3));
    assert_eq!(reader.read().await.unwrap(), None);
}

struct FlushingTransformer;

#[async_trait]
impl Transformer<i32, i32, &'static str> for FlushingTransformer {
    async fn transform(
        &mut self,
        chunk: i32,
        controller: TransformStreamDefaultController<i32, &'static str>,
    ) -> Result<(), &'static str> {
        controller.enqueue(chunk).await.map_err(|_| "enqueue failed")
    }

    async fn flush(
        &mut self,
        controller: TransformStreamDefaultController<i32, &'static str>,
    ) -> Result<(), &'static str> {
        controller.enqueue(-1).await.map_err(|_| "enqueue failed")
    }
}

#[tokio::test]
async fn flush_runs_once_after_the_writable_side_closes() {
    let transform = TransformStream::from_transformer(Box::new(FlushingTransformer));
    let (mut writable, mut readable) = transform.into_parts();
    let writer = writable.get_writer().unwrap();
    let mut reader = readable.get_reader().unwrap();

    writer.write(1).await.unwrap();
    writer.close().await.unwrap();

    assert_eq!(reader.read().await.unwrap(), Some(1));
    assert_eq!(reader.read().await.unwrap(), Some(-1));
    assert_eq!(reader.read().await.unwrap(), None);
}

struct ErroringTransformer;

#[async_trait]
impl Transformer<i32, i32, &'static str> for ErroringTransformer {
    async fn transform(
        &mut self,
        _chunk: i32,
        _controller: TransformStreamDefaultController<i32, &'static str>,
    ) -> Result<(), &'static str> {
        Err("transform failed")
    }
}

#[tokio::test]
async fn a_failing_transform_errors_both_sides() {
    let transform = TransformStream::from_transformer(Box::new(ErroringTransformer));
    let (mut writable, mut readable) = transform.into_parts();
    let writer = writable.get_writer().unwrap();
    let mut reader = readable.get_reader().unwrap();

    let write_err = writer.write(1).await.unwrap_err();
    assert_eq!(write_err.reason(), Some(&"transform failed"));

    let read_err = reader.read().await.unwrap_err();
    assert_eq!(read_err.reason(), Some(&"transform failed"));
}
