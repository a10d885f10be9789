//! The [tee](https://streams.spec.whatwg.org/#tee-a-readable-stream) algorithm (§4.H).
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::lock::Mutex as AsyncMutex;

use crate::error::StreamError;
use crate::queuing_strategy::QueuingStrategy;

use super::controller::{controller_of, ReadableStreamDefaultController};
use super::source::UnderlyingSource;
use super::{ReadableStream, ReadableStreamDefaultReader};

struct TeeState<T, E: fmt::Debug + fmt::Display> {
    reader: ReadableStreamDefaultReader<T, E>,
    controllers: [Option<ReadableStreamDefaultController<Arc<T>, E>>; 2],
    cancel_reason: [Option<Option<E>>; 2],
    /// Branch indices in the order their `cancel` call actually arrived, so
    /// the later of the two reasons can be identified instead of just
    /// guessing by index.
    cancel_order: Vec<usize>,
}

/// The shared pull/cancel state behind both branches of a tee (§4.H).
///
/// Both branches pull through the same reader; whichever branch's `pull`
/// fires first performs the read and forwards the same `Arc`-wrapped chunk
/// to every branch controller still open (chunks are never deep-copied:
/// both branches observe the same allocation, matching the single shared
/// pull algorithm a tee uses for both of its branches).
struct TeeSource<T, E: fmt::Debug + fmt::Display> {
    state: Arc<AsyncMutex<TeeState<T, E>>>,
    index: usize,
}

#[async_trait]
impl<T, E> UnderlyingSource<Arc<T>, E> for TeeSource<T, E>
where
    T: Send + Sync + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    async fn pull(&mut self, _controller: ReadableStreamDefaultController<Arc<T>, E>) -> Result<(), E> {
        let mut state = self.state.lock().await;
        match state.reader.read().await {
            Ok(Some(chunk)) => {
                let chunk = Arc::new(chunk);
                let mut first_err = None;
                for controller in state.controllers.iter().flatten() {
                    if let Err(err) = controller.enqueue(chunk.clone()).await {
                        first_err = first_err.or_else(|| err.reason().cloned());
                    }
                }
                match first_err {
                    Some(reason) => Err(reason),
                    None => Ok(()),
                }
            }
            Ok(None) => {
                for controller in state.controllers.iter().flatten() {
                    let _ = controller.close();
                }
                Ok(())
            }
            Err(err) => {
                if let Some(reason) = err.reason() {
                    for controller in state.controllers.iter().flatten() {
                        controller.error(reason.clone());
                    }
                    Err(reason.clone())
                } else {
                    Ok(())
                }
            }
        }
    }

    async fn cancel(&mut self, reason: Option<E>) -> Result<(), E> {
        let mut state = self.state.lock().await;
        state.cancel_reason[self.index] = Some(reason);
        state.controllers[self.index] = None;
        state.cancel_order.push(self.index);
        if state.cancel_reason.iter().all(Option::is_some) {
            // The upstream cancel reason is a single `E`, so a true composite
            // `[reason0, reason1]` can't be represented generically; the
            // later of the two reasons to arrive (by actual call order, not
            // by branch index) is forwarded instead.
            let last = *state
                .cancel_order
                .last()
                .expect("both branches recorded a cancel");
            let combined = state.cancel_reason[last].clone().flatten();
            if let Err(err) = state.reader.cancel(combined).await {
                if let Some(reason) = err.reason() {
                    return Err(reason.clone());
                }
            }
        }
        Ok(())
    }
}

/// Tees `source` into two independent branches (§4.H), each with its own
/// internal queue and its own consumer, forwarding every chunk as a shared
/// `Arc` rather than cloning it. Cancelling both branches cancels the
/// original stream; cancelling only one leaves the other branch running.
pub fn tee<T, E>(
    mut source: ReadableStream<T, E>,
) -> Result<(ReadableStream<Arc<T>, E>, ReadableStream<Arc<T>, E>), StreamError<E>>
where
    T: Send + Sync + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    let reader = source.get_reader()?;
    let state = Arc::new(AsyncMutex::new(TeeState {
        reader,
        controllers: [None, None],
        cancel_reason: [None, None],
        cancel_order: Vec::with_capacity(2),
    }));

    let branch0 = ReadableStream::new(
        Box::new(TeeSource {
            state: state.clone(),
            index: 0,
        }),
        QueuingStrategy::count(1.0).expect("1.0 is a valid hwm"),
    );
    let controller0 = controller_of(branch0.shared());

    let branch1 = ReadableStream::new(
        Box::new(TeeSource {
            state: state.clone(),
            index: 1,
        }),
        QueuingStrategy::count(1.0).expect("1.0 is a valid hwm"),
    );
    let controller1 = controller_of(branch1.shared());

    {
        let mut guard = state
            .try_lock()
            .expect("no pull/cancel call can race construction of a tee's own branches");
        guard.controllers = [Some(controller0), Some(controller1)];
    }

    Ok((branch0, branch1))
}
