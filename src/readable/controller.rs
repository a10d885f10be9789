use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::error::{StreamError, StreamResult};
use crate::queue::SizedQueue;
use crate::queuing_strategy::QueuingStrategy;
use crate::settlement::{settlement, Settle};

use super::source::UnderlyingSource;

/// `{readable, closed, errored}` from §3 "Readable Stream".
pub(crate) enum ReadableState<E: fmt::Debug + fmt::Display> {
    Readable,
    Closed,
    Errored(StreamError<E>),
}

type ReadResult<T, E> = StreamResult<Option<T>, E>;

pub(crate) struct Inner<T, E: fmt::Debug + fmt::Display> {
    pub(crate) state: ReadableState<E>,
    pub(crate) queue: SizedQueue<T>,
    pub(crate) strategy: QueuingStrategy<T, E>,
    source: Option<Box<dyn UnderlyingSource<T, E>>>,
    started: bool,
    close_requested: bool,
    pulling: bool,
    pull_again: bool,
    pub(crate) disturbed: bool,
    pub(crate) locked: bool,
    read_requests: VecDeque<Settle<ReadResult<T, E>>>,
    reader_closed: Option<Settle<StreamResult<(), E>>>,
}

/// The shared state behind a [`ReadableStream`](super::ReadableStream), its
/// [`ReadableStreamDefaultController`] and its
/// [`ReadableStreamDefaultReader`](super::ReadableStreamDefaultReader).
pub(crate) struct SharedReadable<T, E: fmt::Debug + fmt::Display> {
    pub(crate) inner: Mutex<Inner<T, E>>,
}

pub(crate) type Shared<T, E> = Arc<SharedReadable<T, E>>;

pub(crate) fn new_shared<T, E>(
    source: Box<dyn UnderlyingSource<T, E>>,
    strategy: QueuingStrategy<T, E>,
) -> Shared<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    Arc::new(SharedReadable {
        inner: Mutex::new(Inner {
            state: ReadableState::Readable,
            queue: SizedQueue::new(),
            strategy,
            source: Some(source),
            started: false,
            close_requested: false,
            pulling: false,
            pull_again: false,
            disturbed: false,
            locked: false,
            read_requests: VecDeque::new(),
            reader_closed: None,
        }),
    })
}

/// A [`ReadableStreamDefaultController`](https://streams.spec.whatwg.org/#rs-default-controller-class),
/// the handle passed to a [`UnderlyingSource`]'s algorithms.
///
/// Cheap to clone: every clone controls the same stream (§3 "Controller
/// (Readable Default)").
pub struct ReadableStreamDefaultController<T, E: fmt::Debug + fmt::Display> {
    pub(crate) shared: Shared<T, E>,
}

impl<T, E: fmt::Debug + fmt::Display> Clone for ReadableStreamDefaultController<T, E> {
    fn clone(&self) -> Self {
        ReadableStreamDefaultController {
            shared: self.shared.clone(),
        }
    }
}

impl<T, E> ReadableStreamDefaultController<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    /// Returns `hwm - total_size` (§4.D): `None` if errored, `0` if closed.
    pub fn desired_size(&self) -> Option<f64> {
        let inner = self.shared.inner.lock();
        desired_size(&inner)
    }

    /// Enqueues a chunk (§4.D "Enqueue rule"). If the stream is locked and a
    /// read request is already pending, the chunk bypasses the queue and is
    /// delivered directly to that request.
    pub async fn enqueue(&self, chunk: T) -> StreamResult<(), E> {
        {
            let mut inner = self.shared.inner.lock();
            if !can_close_or_enqueue(&inner) {
                return Err(StreamError::state(
                    "cannot enqueue on a stream that is closed, errored or close-requested",
                ));
            }
            if inner.locked && !inner.read_requests.is_empty() {
                let settle = inner.read_requests.pop_front().unwrap();
                drop(inner);
                settle.settle(Ok(Some(chunk)));
                return self.maybe_pull().await;
            }
            let size = match inner.strategy.size_of(&chunk) {
                Ok(size) => size,
                Err(reason) => {
                    let err = StreamError::Reason(reason);
                    drop(inner);
                    self.error_inner(err.clone());
                    return Err(err);
                }
            };
            if let Err(err) = inner.queue.enqueue(chunk, size) {
                drop(inner);
                self.error_inner(err.clone());
                return Err(err);
            }
            trace!(total_size = inner.queue.total_size(), "enqueued chunk");
        }
        self.maybe_pull().await
    }

    /// Closes the stream (§4.D "Close"). If the queue is empty, the
    /// transition to `closed` happens immediately; otherwise the stream
    /// drains first and closes once the queue empties (see the reader's
    /// `read` implementation).
    pub fn close(&self) -> StreamResult<(), E> {
        let mut inner = self.shared.inner.lock();
        if !can_close_or_enqueue(&inner) {
            return Err(StreamError::state(
                "cannot close a stream that is already closed, errored or close-requested",
            ));
        }
        inner.close_requested = true;
        if inner.queue.is_empty() {
            finalize_close(&mut inner);
        }
        Ok(())
    }

    /// Errors the stream (§4.D "Error"). A no-op if the stream is not
    /// `readable`.
    pub fn error(&self, reason: E) {
        self.error_inner(StreamError::Reason(reason));
    }

    fn error_inner(&self, err: StreamError<E>) {
        let mut inner = self.shared.inner.lock();
        if !matches!(inner.state, ReadableState::Readable) {
            return;
        }
        warn!(error = %err, "readable stream errored");
        inner.queue.reset();
        inner.source = None;
        inner.state = ReadableState::Errored(err.clone());
        for settle in inner.read_requests.drain(..) {
            settle.settle(Err(err.clone()));
        }
        if let Some(settle) = inner.reader_closed.take() {
            settle.settle(Err(err));
        }
    }

    /// Runs the pull discipline (§4.D "Pull discipline") to completion,
    /// invoking `pull` zero or more times as needed. Since this core never
    /// starts its own executor (§1), pulling happens synchronously within
    /// whichever call (`enqueue`, or a reader's `read`) next touches the
    /// controller, rather than truly in the background.
    pub(crate) async fn maybe_pull(&self) -> StreamResult<(), E> {
        self.ensure_started().await?;
        loop {
            let mut source = {
                let mut inner = self.shared.inner.lock();
                if !should_pull(&inner) {
                    return Ok(());
                }
                if inner.pulling {
                    inner.pull_again = true;
                    return Ok(());
                }
                inner.pulling = true;
                match inner.source.take() {
                    Some(source) => source,
                    None => return Ok(()),
                }
            };
            trace!("invoking pull");
            let result = source.pull(self.clone()).await;
            let mut inner = self.shared.inner.lock();
            inner.source = Some(source);
            inner.pulling = false;
            match result {
                Ok(()) => {
                    if !inner.pull_again {
                        return Ok(());
                    }
                    inner.pull_again = false;
                }
                Err(reason) => {
                    drop(inner);
                    let err = StreamError::Reason(reason);
                    self.error_inner(err.clone());
                    return Err(err);
                }
            }
        }
    }

    async fn ensure_started(&self) -> StreamResult<(), E> {
        let mut source = {
            let mut inner = self.shared.inner.lock();
            if inner.started {
                return Ok(());
            }
            match inner.source.take() {
                Some(source) => source,
                None => return Ok(()),
            }
        };
        debug!("starting readable source");
        let result = source.start(self.clone()).await;
        let mut inner = self.shared.inner.lock();
        inner.source = Some(source);
        match result {
            Ok(()) => {
                inner.started = true;
                Ok(())
            }
            Err(reason) => {
                drop(inner);
                let err = StreamError::Reason(reason);
                self.error_inner(err.clone());
                Err(err)
            }
        }
    }

    pub(crate) async fn cancel(&self, reason: Option<E>) -> StreamResult<(), E> {
        let mut source = {
            let mut inner = self.shared.inner.lock();
            inner.disturbed = true;
            match &inner.state {
                ReadableState::Closed => return Ok(()),
                ReadableState::Errored(err) => return Err(err.clone()),
                ReadableState::Readable => {}
            }
            finalize_close(&mut inner);
            inner.queue.reset();
            match inner.source.take() {
                Some(source) => source,
                None => return Ok(()),
            }
        };
        let result = source.cancel(reason).await;
        // The source is spent after cancellation; algorithms are cleared
        // (§9 "Algorithm slots vs inline callbacks").
        drop(source);
        crate::util::void_result(result)
    }
}

fn can_close_or_enqueue<T, E: fmt::Debug + fmt::Display>(inner: &Inner<T, E>) -> bool {
    matches!(inner.state, ReadableState::Readable) && !inner.close_requested
}

fn desired_size<T, E: fmt::Debug + fmt::Display>(inner: &Inner<T, E>) -> Option<f64> {
    match &inner.state {
        ReadableState::Errored(_) => None,
        ReadableState::Closed => Some(0.0),
        ReadableState::Readable => {
            Some(inner.strategy.high_water_mark - inner.queue.total_size())
        }
    }
}

fn should_pull<T, E: fmt::Debug + fmt::Display>(inner: &Inner<T, E>) -> bool {
    if !can_close_or_enqueue(inner) || !inner.started {
        return false;
    }
    if inner.locked && !inner.read_requests.is_empty() {
        return true;
    }
    desired_size(inner).map(|size| size > 0.0).unwrap_or(false)
}

/// Transitions to `closed`, resolving any pending read requests with
/// `done: true` and fulfilling the reader's closed settlement (§4.D "Close").
pub(crate) fn finalize_close<T, E: fmt::Debug + fmt::Display>(inner: &mut Inner<T, E>) {
    inner.state = ReadableState::Closed;
    inner.source = None;
    for settle in inner.read_requests.drain(..) {
        settle.settle(Ok(None));
    }
    if let Some(settle) = inner.reader_closed.take() {
        settle.settle(Ok(()));
    }
}

pub(crate) fn controller_of<T, E>(shared: &Shared<T, E>) -> ReadableStreamDefaultController<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    ReadableStreamDefaultController {
        shared: shared.clone(),
    }
}

impl<T, E> SharedReadable<T, E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    pub(crate) fn is_locked(&self) -> bool {
        self.inner.lock().locked
    }

    /// Locks the stream to a new reader, returning the settlement that
    /// fulfills/rejects when the stream (or this reader's lock) settles, and
    /// a settle handle the controller's close/error paths resolve.
    pub(crate) fn lock(
        &self,
    ) -> Result<crate::settlement::Settlement<StreamResult<(), E>>, &'static str> {
        let mut inner = self.inner.lock();
        if inner.locked {
            return Err("already locked to a reader");
        }
        inner.locked = true;
        let (closed, settle) = settlement();
        match &inner.state {
            ReadableState::Closed => {
                settle.settle(Ok(()));
            }
            ReadableState::Errored(err) => {
                settle.settle(Err(err.clone()));
            }
            ReadableState::Readable => {
                inner.reader_closed = Some(settle);
            }
        }
        Ok(closed)
    }

    /// Releases the lock. Any still-pending read requests are rejected
    /// rather than panicking (the relaxed, non-panicking release behavior
    /// noted on [`ReadableStreamDefaultReader::release_lock`](super::ReadableStreamDefaultReader::release_lock)).
    pub(crate) fn release_lock(&self) {
        let mut inner = self.inner.lock();
        if !inner.locked {
            return;
        }
        inner.locked = false;
        let err = StreamError::misuse("reader released before all pending reads settled");
        for settle in inner.read_requests.drain(..) {
            settle.settle(Err(err.clone()));
        }
        if let Some(settle) = inner.reader_closed.take() {
            settle.settle(Err(err));
        }
    }

    /// Services one `read()` call: delivers immediately if the queue has a
    /// chunk or the stream has settled, otherwise parks a read request and
    /// (re-)triggers the pull discipline.
    pub(crate) async fn read(&self, shared: &Shared<T, E>) -> ReadResult<T, E> {
        let settlement = {
            let mut inner = self.inner.lock();
            inner.disturbed = true;
            if let Some(chunk) = inner.queue.dequeue() {
                if inner.close_requested && inner.queue.is_empty() {
                    finalize_close(&mut inner);
                }
                drop(inner);
                controller_of(shared).maybe_pull().await?;
                return Ok(Some(chunk));
            }
            match &inner.state {
                ReadableState::Closed => return Ok(None),
                ReadableState::Errored(err) => return Err(err.clone()),
                ReadableState::Readable => {}
            }
            let (settlement, settle) = settlement();
            inner.read_requests.push_back(settle);
            settlement
        };
        controller_of(shared).maybe_pull().await?;
        settlement.await
    }
}
