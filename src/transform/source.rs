use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::readable::{ReadableStreamDefaultController, UnderlyingSource};
use crate::settlement::Resettable;
use crate::writable::WritableStreamDefaultController;

/// The readable side's [`UnderlyingSource`] for a transform stream.
///
/// Its `pull` algorithm is exactly the "set backpressure to false" step
/// (§4.F "Pull algorithm"); its `cancel` algorithm propagates the
/// cancellation reason to the writable side (§4.F "Cancel algorithm").
///
/// `writable` starts empty and is filled in immediately after the writable
/// side is constructed, since the two sides of a transform are built from
/// each other's controller and therefore cannot be wired up in one step.
pub(crate) struct TransformSource<I, E: fmt::Debug + fmt::Display> {
    pub(crate) writable: Arc<Mutex<Option<WritableStreamDefaultController<I, E>>>>,
    pub(crate) backpressure: Arc<Resettable<()>>,
}

#[async_trait]
impl<I, O, E> UnderlyingSource<O, E> for TransformSource<I, E>
where
    I: Send + 'static,
    O: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    async fn pull(&mut self, _controller: ReadableStreamDefaultController<O, E>) -> Result<(), E> {
        self.backpressure.settle_current(());
        Ok(())
    }

    async fn cancel(&mut self, reason: Option<E>) -> Result<(), E> {
        if let Some(reason) = reason {
            let writable = self.writable.lock().as_ref().cloned();
            if let Some(writable) = writable {
                writable.error(reason).await;
            }
        }
        Ok(())
    }
}
