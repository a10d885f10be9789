use std::fmt;
use std::sync::Arc;

use crate::error::StreamResult;
use crate::readable::ReadableStreamDefaultController;
use crate::settlement::Resettable;

/// A [`TransformStreamDefaultController`](https://streams.spec.whatwg.org/#transform-stream-default-controller-class),
/// the handle passed to a [`Transformer`](super::Transformer)'s algorithms.
///
/// Cheap to clone: every clone controls the same transform (§3 "Controller
/// (Transform Default)").
pub struct TransformStreamDefaultController<O, E: fmt::Debug + fmt::Display> {
    pub(crate) readable: ReadableStreamDefaultController<O, E>,
    pub(crate) backpressure: Arc<Resettable<()>>,
}

impl<O, E: fmt::Debug + fmt::Display> Clone for TransformStreamDefaultController<O, E> {
    fn clone(&self) -> Self {
        TransformStreamDefaultController {
            readable: self.readable.clone(),
            backpressure: self.backpressure.clone(),
        }
    }
}

impl<O, E> TransformStreamDefaultController<O, E>
where
    O: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    /// `hwm - total_size` of the readable side's internal queue (§4.F).
    pub fn desired_size(&self) -> Option<f64> {
        self.readable.desired_size()
    }

    /// Enqueues a chunk onto the readable side (§4.F "Enqueue"). Recomputes
    /// backpressure afterwards: if the readable side's queue is now full,
    /// the next `write()` on the writable side waits for the next `pull`.
    pub async fn enqueue(&self, chunk: O) -> StreamResult<(), E> {
        self.readable.enqueue(chunk).await?;
        if self.readable.desired_size().map(|size| size <= 0.0).unwrap_or(true) {
            self.backpressure.reset();
        }
        Ok(())
    }

    /// Errors both sides of the transform (§4.F "Error").
    pub fn error(&self, reason: E) {
        self.readable.error(reason);
    }

    /// Closes the readable side and discards any further chunks
    /// (§4.F "Terminate"). Simplified relative to the full WHATWG algorithm:
    /// this crate has no way to manufacture an `E` to also error the
    /// writable side with, so the writable side is merely left to be
    /// closed/aborted by its own caller.
    pub fn terminate(&self) {
        let _ = self.readable.close();
    }
}
