//! The settlement primitive (§4.B): a one-shot, multi-observer completion
//! signal, analogous to a promise but without the microtask machinery a host
//! JS engine would provide.
//!
//! Grounded in the waker-queue idiom used throughout the pack's hand-rolled
//! async channels (e.g. the register-then-double-check pattern in
//! `fedemagnani-veloce`'s SPSC receiver future); here it is generalized to
//! support an arbitrary number of observers rather than a single receiver.
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

enum Slot<T> {
    Pending(Vec<Waker>),
    Settled(T),
}

struct Inner<T> {
    slot: Mutex<Slot<T>>,
}

/// The observer half of a settlement. Cheap to clone: every clone observes
/// the same eventual value, polled independently (FIFO wakeup order per
/// §5 "Ordering guarantees" is preserved because each clone registers its own
/// waker and all wakers are drained in registration order on settle).
pub struct Settlement<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Settlement<T> {
    fn clone(&self) -> Self {
        Settlement {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Settlement<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.inner.slot.lock() {
            Slot::Pending(waiters) => f
                .debug_struct("Settlement")
                .field("state", &"pending")
                .field("waiters", &waiters.len())
                .finish(),
            Slot::Settled(value) => f
                .debug_struct("Settlement")
                .field("state", &"settled")
                .field("value", value)
                .finish(),
        }
    }
}

/// The resolving half of a settlement. May be cloned so that multiple
/// callers can race to settle the same signal (e.g. concurrent `abort()`
/// calls share one pending abort request, §4.E); only the first call across
/// all clones has an effect.
pub struct Settle<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Settle<T> {
    fn clone(&self) -> Self {
        Settle {
            inner: self.inner.clone(),
        }
    }
}

/// Creates a new pending settlement and its resolver.
pub fn settlement<T: Clone>() -> (Settlement<T>, Settle<T>) {
    let inner = Arc::new(Inner {
        slot: Mutex::new(Slot::Pending(Vec::new())),
    });
    (
        Settlement {
            inner: inner.clone(),
        },
        Settle { inner },
    )
}

/// Creates a settlement that is already settled with `value`.
pub fn ready<T: Clone>(value: T) -> Settlement<T> {
    Settlement {
        inner: Arc::new(Inner {
            slot: Mutex::new(Slot::Settled(value)),
        }),
    }
}

impl<T: Clone> Settle<T> {
    /// Settles the signal with `value`. Returns `true` if this call was the
    /// one that settled it, `false` if it was already settled (idempotent,
    /// per §4.B "resolve/reject are idempotent-ignored after first call").
    pub fn settle(&self, value: T) -> bool {
        let wakers = {
            let mut slot = self.inner.slot.lock();
            if matches!(&*slot, Slot::Settled(_)) {
                return false;
            }
            match std::mem::replace(&mut *slot, Slot::Settled(value)) {
                Slot::Pending(wakers) => wakers,
                Slot::Settled(_) => unreachable!(),
            }
        };
        for waker in wakers {
            waker.wake();
        }
        true
    }

    /// Returns `true` if some call to [`settle`](Self::settle) has already
    /// taken effect.
    pub fn is_settled(&self) -> bool {
        matches!(&*self.inner.slot.lock(), Slot::Settled(_))
    }
}

impl<T: Clone> Settlement<T> {
    /// Returns the value without blocking, if it is already settled.
    pub fn peek(&self) -> Option<T> {
        match &*self.inner.slot.lock() {
            Slot::Settled(value) => Some(value.clone()),
            Slot::Pending(_) => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.peek().is_some()
    }
}

impl<T: Clone> Future for Settlement<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut slot = self.inner.slot.lock();
        match &mut *slot {
            Slot::Settled(value) => Poll::Ready(value.clone()),
            Slot::Pending(wakers) => {
                if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

/// A settlement slot that can be atomically replaced with a fresh pending
/// one. Used for the writer's `ready` signal and the transform's
/// `backpressure_change` signal (§4.D/§4.F/§9): consumers must always
/// re-fetch the current settlement via [`get`](Self::get) rather than
/// holding on to a stale one.
pub struct Resettable<T> {
    current: Mutex<Settlement<T>>,
}

impl<T: Clone> Resettable<T> {
    pub fn new(initial: Settlement<T>) -> Self {
        Resettable {
            current: Mutex::new(initial),
        }
    }

    /// Returns the currently active settlement.
    pub fn get(&self) -> Settlement<T> {
        self.current.lock().clone()
    }

    /// Replaces the current settlement with a fresh pending one, returning
    /// its resolver.
    pub fn reset(&self) -> Settle<T> {
        let (settlement, settle) = settlement();
        *self.current.lock() = settlement;
        settle
    }

    /// Settles the currently active settlement in place, without resetting it.
    pub fn settle_current(&self, value: T) -> bool {
        let current = self.current.lock();
        let settle = Settle {
            inner: current.inner.clone(),
        };
        settle.settle(value)
    }
}
