//! A portable, host-independent [transform stream](https://streams.spec.whatwg.org/#ts-model).
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

pub use controller::TransformStreamDefaultController;
pub use transformer::Transformer;

use crate::queuing_strategy::QueuingStrategy;
use crate::readable::{self, ReadableStream};
use crate::settlement::{settlement, Resettable};
use crate::writable::{self, WritableStream};

mod controller;
mod sink;
mod source;
mod transformer;

use self::sink::TransformSink;
use self::source::TransformSource;

/// A [`TransformStream`](https://streams.spec.whatwg.org/#ts-class).
///
/// Made up of a writable side accepting `I` chunks and a readable side
/// producing `O` chunks, wired together by a [`Transformer`] and a shared
/// backpressure signal (§3 "Transform Stream").
pub struct TransformStream<I, O, E: fmt::Debug + fmt::Display> {
    readable: ReadableStream<O, E>,
    writable: WritableStream<I, E>,
}

impl<I, O, E> TransformStream<I, O, E>
where
    I: Send + 'static,
    O: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    /// Creates a new `TransformStream` from a [`Transformer`] and the
    /// writable/readable sides' queuing strategies (§6 "Transform constructor").
    pub fn new(
        transformer: Box<dyn Transformer<I, O, E>>,
        writable_strategy: QueuingStrategy<I, E>,
        readable_strategy: QueuingStrategy<O, E>,
    ) -> Self {
        let writable_link = Arc::new(Mutex::new(None));
        let (initial_backpressure, _settle) = settlement::<()>();
        let backpressure = Arc::new(Resettable::new(initial_backpressure));

        let source = TransformSource {
            writable: Arc::clone(&writable_link),
            backpressure: Arc::clone(&backpressure),
        };
        let readable_shared = readable::controller::new_shared(Box::new(source), readable_strategy);
        let readable_controller = readable::controller::controller_of(&readable_shared);

        let controller = TransformStreamDefaultController {
            readable: readable_controller,
            backpressure,
        };
        let sink = TransformSink {
            transformer,
            controller,
        };
        let writable_shared = writable::controller::new_shared(Box::new(sink), writable_strategy);
        let writable_controller = writable::controller::controller_of(&writable_shared);
        *writable_link.lock() = Some(writable_controller);

        TransformStream {
            readable: ReadableStream::from_shared(readable_shared),
            writable: WritableStream::from_shared(writable_shared),
        }
    }

    /// Creates a `TransformStream` with the default ("count") strategy and a
    /// high-water mark of `1` on both sides.
    pub fn from_transformer(transformer: Box<dyn Transformer<I, O, E>>) -> Self {
        Self::new(
            transformer,
            QueuingStrategy::count(1.0).expect("1.0 is a valid hwm"),
            QueuingStrategy::count(1.0).expect("1.0 is a valid hwm"),
        )
    }

    /// Splits this `TransformStream` into its writable and readable sides.
    pub fn into_parts(self) -> (WritableStream<I, E>, ReadableStream<O, E>) {
        (self.writable, self.readable)
    }

    /// Borrows the writable side.
    pub fn writable(&mut self) -> &mut WritableStream<I, E> {
        &mut self.writable
    }

    /// Borrows the readable side.
    pub fn readable(&mut self) -> &mut ReadableStream<O, E> {
        &mut self.readable
    }
}
