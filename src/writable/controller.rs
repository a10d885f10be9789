use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::error::{StreamError, StreamResult};
use crate::queue::SizedQueue;
use crate::queuing_strategy::QueuingStrategy;
use crate::settlement::{settlement, Resettable, Settle, Settlement};

use super::sink::UnderlyingSink;

/// `{writable, erroring, errored, closed}` from §3 "Writable Stream".
pub(crate) enum WritableState<E: fmt::Debug + fmt::Display> {
    Writable,
    Erroring(StreamError<E>),
    Errored(StreamError<E>),
    Closed,
}

enum WriteRequest<T, E: fmt::Debug + fmt::Display> {
    Chunk(T, Settle<StreamResult<(), E>>),
    Close(Settle<StreamResult<(), E>>),
}

struct PendingAbort<E: fmt::Debug + fmt::Display> {
    reason: Option<E>,
    settle: Settle<StreamResult<(), E>>,
    settlement: Settlement<StreamResult<(), E>>,
}

pub(crate) struct Inner<T, E: fmt::Debug + fmt::Display> {
    pub(crate) state: WritableState<E>,
    queue: SizedQueue<WriteRequest<T, E>>,
    strategy: QueuingStrategy<T, E>,
    sink: Option<Box<dyn UnderlyingSink<T, E>>>,
    started: bool,
    writing: bool,
    in_flight_close: bool,
    close_requested: bool,
    pending_abort: Option<PendingAbort<E>>,
    pub(crate) locked: bool,
    closed: Option<Settle<StreamResult<(), E>>>,
}

/// The shared state behind a [`WritableStream`](super::WritableStream), its
/// [`WritableStreamDefaultController`] and its
/// [`WritableStreamDefaultWriter`](super::WritableStreamDefaultWriter).
pub(crate) struct SharedWritable<T, E: fmt::Debug + fmt::Display> {
    pub(crate) inner: Mutex<Inner<T, E>>,
    pub(crate) ready: Resettable<StreamResult<(), E>>,
}

pub(crate) type Shared<T, E> = Arc<SharedWritable<T, E>>;

pub(crate) fn new_shared<T, E>(
    sink: Box<dyn UnderlyingSink<T, E>>,
    strategy: QueuingStrategy<T, E>,
) -> Shared<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    Arc::new(SharedWritable {
        inner: Mutex::new(Inner {
            state: WritableState::Writable,
            queue: SizedQueue::new(),
            strategy,
            sink: Some(sink),
            started: false,
            writing: false,
            in_flight_close: false,
            close_requested: false,
            pending_abort: None,
            locked: false,
            closed: None,
        }),
        ready: Resettable::new(crate::settlement::ready(Ok(()))),
    })
}

/// A [`WritableStreamDefaultController`](https://streams.spec.whatwg.org/#writable-default-controller-class),
/// the handle passed to an [`UnderlyingSink`]'s algorithms.
pub struct WritableStreamDefaultController<T, E: fmt::Debug + fmt::Display> {
    pub(crate) shared: Shared<T, E>,
}

impl<T, E: fmt::Debug + fmt::Display> Clone for WritableStreamDefaultController<T, E> {
    fn clone(&self) -> Self {
        WritableStreamDefaultController {
            shared: self.shared.clone(),
        }
    }
}

impl<T, E> WritableStreamDefaultController<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    /// Errors the stream, starting the erroring process (§4.E "Error").
    pub async fn error(&self, reason: E) {
        let should_finish = {
            let mut inner = self.shared.inner.lock();
            start_erroring(&self.shared, &mut inner, StreamError::Reason(reason));
            !inner.writing && !inner.in_flight_close
        };
        if should_finish {
            finish_erroring(self.shared.clone()).await;
        }
    }
}

pub(crate) fn controller_of<T, E>(shared: &Shared<T, E>) -> WritableStreamDefaultController<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    WritableStreamDefaultController {
        shared: shared.clone(),
    }
}

fn desired_size<T, E: fmt::Debug + fmt::Display>(inner: &Inner<T, E>) -> Option<f64> {
    match &inner.state {
        WritableState::Writable => Some(inner.strategy.high_water_mark - inner.queue.total_size()),
        WritableState::Closed => Some(0.0),
        WritableState::Erroring(_) | WritableState::Errored(_) => None,
    }
}

fn has_backpressure<T, E: fmt::Debug + fmt::Display>(inner: &Inner<T, E>) -> bool {
    desired_size(inner).map(|size| size <= 0.0).unwrap_or(true)
}

/// Recomputes backpressure and flips the `ready` signal accordingly
/// (§4.E "Update backpressure").
fn update_backpressure<T, E>(shared: &Shared<T, E>, inner: &Inner<T, E>)
where
    E: Clone,
{
    if has_backpressure(inner) {
        if shared.ready.get().peek().is_some() {
            shared.ready.reset();
        }
    } else {
        shared.ready.settle_current(Ok(()));
    }
}

/// Starts the erroring process for `err`, a no-op if the stream is already
/// `erroring`, `errored` or `closed` (§4.E "Start erroring").
fn start_erroring<T, E>(shared: &Shared<T, E>, inner: &mut Inner<T, E>, err: StreamError<E>)
where
    E: Clone + fmt::Debug + fmt::Display,
{
    if !matches!(inner.state, WritableState::Writable) {
        return;
    }
    warn!(error = %err, "writable stream erroring");
    inner.state = WritableState::Erroring(err.clone());
    shared.ready.reset();
    shared.ready.settle_current(Err(err));
}

/// Completes the erroring process once no write/close is in flight
/// (§4.E "Finish erroring"): runs the sink's `abort` algorithm, clears the
/// queue and transitions to `errored`.
async fn finish_erroring<T, E>(shared: Shared<T, E>)
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    let (err, mut sink, abort_reason) = {
        let mut inner = shared.inner.lock();
        let err = match &inner.state {
            WritableState::Erroring(err) => err.clone(),
            _ => return,
        };
        let sink = inner.sink.take();
        let abort_reason = inner
            .pending_abort
            .as_ref()
            .and_then(|abort| abort.reason.clone());
        (err, sink, abort_reason)
    };
    if let Some(sink) = sink.as_mut() {
        debug!("running sink abort algorithm");
        let _ = sink.abort(abort_reason).await;
    }
    let mut inner = shared.inner.lock();
    inner.sink = None;
    inner.state = WritableState::Errored(err.clone());
    for request in inner.queue.drain() {
        reject_request(request, err.clone());
    }
    if let Some(settle) = inner.closed.take() {
        settle.settle(Err(err.clone()));
    }
    if let Some(abort) = inner.pending_abort.take() {
        abort.settle.settle(Err(err));
    }
}

fn reject_request<T, E: fmt::Debug + fmt::Display>(request: WriteRequest<T, E>, err: StreamError<E>) {
    match request {
        WriteRequest::Chunk(_, settle) => {
            settle.settle(Err(err));
        }
        WriteRequest::Close(settle) => {
            settle.settle(Err(err));
        }
    }
}

impl<T, E> SharedWritable<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    pub(crate) fn is_locked(&self) -> bool {
        self.inner.lock().locked
    }

    pub(crate) fn lock(&self) -> Result<(), &'static str> {
        let mut inner = self.inner.lock();
        if inner.locked {
            return Err("already locked to a writer");
        }
        inner.locked = true;
        Ok(())
    }

    pub(crate) fn release_lock(&self) {
        self.inner.lock().locked = false;
    }

    pub(crate) fn desired_size(&self) -> Option<f64> {
        desired_size(&self.inner.lock())
    }
}

pub(crate) async fn closed<T, E>(shared: &Shared<T, E>) -> StreamResult<(), E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    let settlement = {
        let mut inner = shared.inner.lock();
        match &inner.state {
            WritableState::Closed => return Ok(()),
            WritableState::Errored(err) => return Err(err.clone()),
            _ => {}
        }
        let (settlement, settle) = settlement();
        inner.closed = Some(settle);
        settlement
    };
    settlement.await
}

/// Resolves once backpressure is released (§4.E "Ready").
pub(crate) async fn ready<T, E>(shared: &Shared<T, E>) -> StreamResult<(), E>
where
    E: Clone + fmt::Debug + fmt::Display,
{
    shared.ready.get().await
}

/// Writes a single chunk (§4.E "Write"). Resolves once the chunk has
/// actually been processed by the sink, which may be later than when it
/// was accepted into the queue.
pub(crate) async fn write<T, E>(shared: &Shared<T, E>, chunk: T) -> StreamResult<(), E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    let settlement = {
        let mut inner = shared.inner.lock();
        match &inner.state {
            WritableState::Errored(err) => return Err(err.clone()),
            WritableState::Erroring(err) => return Err(err.clone()),
            WritableState::Closed => {
                return Err(StreamError::state("cannot write to a closed stream"))
            }
            WritableState::Writable => {}
        }
        if inner.close_requested {
            return Err(StreamError::state("cannot write after close has been requested"));
        }
        let size = match inner.strategy.size_of(&chunk) {
            Ok(size) => size,
            Err(reason) => {
                let err = StreamError::Reason(reason);
                start_erroring(shared, &mut inner, err.clone());
                let should_finish = !inner.writing && !inner.in_flight_close;
                drop(inner);
                if should_finish {
                    finish_erroring(shared.clone()).await;
                }
                return Err(err);
            }
        };
        let (settlement, settle) = settlement();
        if let Err(err) = inner.queue.enqueue(WriteRequest::Chunk(chunk, settle), size) {
            start_erroring(shared, &mut inner, err.clone());
            let should_finish = !inner.writing && !inner.in_flight_close;
            drop(inner);
            if should_finish {
                finish_erroring(shared.clone()).await;
            }
            return Err(err);
        }
        update_backpressure(shared, &inner);
        trace!(total_size = inner.queue.total_size(), "queued chunk for write");
        settlement
    };
    advance_queue(shared).await;
    settlement.await
}

/// Requests the stream be closed once every queued write settles
/// (§4.E "Close").
pub(crate) async fn close<T, E>(shared: &Shared<T, E>) -> StreamResult<(), E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    let settlement = {
        let mut inner = shared.inner.lock();
        match &inner.state {
            WritableState::Errored(err) => return Err(err.clone()),
            WritableState::Erroring(err) => return Err(err.clone()),
            WritableState::Closed => return Ok(()),
            WritableState::Writable => {}
        }
        if inner.close_requested {
            return Err(StreamError::state("close already requested"));
        }
        inner.close_requested = true;
        let (settlement, settle) = settlement();
        let _ = inner.queue.enqueue(WriteRequest::Close(settle), 0.0);
        update_backpressure(shared, &inner);
        settlement
    };
    advance_queue(shared).await;
    settlement.await
}

/// [Aborts](https://streams.spec.whatwg.org/#abort-a-writable-stream) the
/// stream, discarding queued writes (§4.E "Abort").
pub(crate) async fn abort<T, E>(shared: &Shared<T, E>, reason: Option<E>) -> StreamResult<(), E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    let (settlement, should_finish) = {
        let mut inner = shared.inner.lock();
        match &inner.state {
            WritableState::Closed => return Ok(()),
            WritableState::Errored(_) => return Ok(()),
            _ => {}
        }
        if let Some(pending) = &inner.pending_abort {
            let settlement = pending.settlement.clone();
            drop(inner);
            return settlement.await;
        }
        let was_already_erroring = matches!(inner.state, WritableState::Erroring(_));
        let (settlement, settle) = settlement();
        inner.pending_abort = Some(PendingAbort {
            reason: reason.clone(),
            settle,
            settlement: settlement.clone(),
        });
        if !was_already_erroring {
            let err = match reason.clone() {
                Some(reason) => StreamError::Reason(reason),
                None => StreamError::state("stream aborted"),
            };
            start_erroring(shared, &mut inner, err);
        }
        let should_finish = !inner.writing && !inner.in_flight_close;
        (settlement, should_finish)
    };
    if should_finish {
        finish_erroring(shared.clone()).await;
    }
    settlement.await
}

/// Drains queued write/close requests one at a time using the
/// take-and-replace pattern, same as the readable controller's pull loop.
async fn advance_queue<T, E>(shared: &Shared<T, E>)
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    ensure_started(shared).await;
    loop {
        let (mut sink, request, is_close) = {
            let mut inner = shared.inner.lock();
            if inner.writing || inner.in_flight_close || !matches!(inner.state, WritableState::Writable) {
                return;
            }
            let request = match inner.queue.dequeue() {
                Some(request) => request,
                None => return,
            };
            let is_close = matches!(request, WriteRequest::Close(_));
            if is_close {
                inner.in_flight_close = true;
            } else {
                inner.writing = true;
            }
            let sink = match inner.sink.take() {
                Some(sink) => sink,
                None => {
                    reject_request(request, StreamError::misuse("sink is gone"));
                    return;
                }
            };
            update_backpressure(shared, &inner);
            (sink, request, is_close)
        };
        let controller = controller_of(shared);
        let (result, settle) = match request {
            WriteRequest::Chunk(chunk, settle) => (sink.write(chunk, controller).await, settle),
            WriteRequest::Close(settle) => (sink.close().await, settle),
        };
        let mut inner = shared.inner.lock();
        inner.sink = Some(sink);
        if is_close {
            inner.in_flight_close = false;
        } else {
            inner.writing = false;
        }
        match result {
            Ok(()) => {
                if is_close {
                    inner.state = WritableState::Closed;
                    if let Some(closed) = inner.closed.take() {
                        closed.settle(Ok(()));
                    }
                }
                drop(inner);
                settle.settle(Ok(()));
            }
            Err(reason) => {
                let err = StreamError::Reason(reason);
                start_erroring(shared, &mut inner, err.clone());
                let should_finish = !inner.writing && !inner.in_flight_close;
                drop(inner);
                settle.settle(Err(err));
                if should_finish {
                    finish_erroring(shared.clone()).await;
                }
                return;
            }
        }
    }
}

async fn ensure_started<T, E>(shared: &Shared<T, E>)
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    let mut sink = {
        let mut inner = shared.inner.lock();
        if inner.started {
            return;
        }
        match inner.sink.take() {
            Some(sink) => sink,
            None => return,
        }
    };
    debug!("starting writable sink");
    let result = sink.start(controller_of(shared)).await;
    let mut inner = shared.inner.lock();
    inner.sink = Some(sink);
    match result {
        Ok(()) => inner.started = true,
        Err(reason) => {
            let err = StreamError::Reason(reason);
            start_erroring(shared, &mut inner, err);
        }
    }
}
