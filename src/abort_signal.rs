//! A minimal stand-in for a DOM `AbortSignal` (§6 "Pipe options"), built on
//! the same [`Settlement`](crate::settlement::Settlement) primitive as
//! everything else in this crate, since there is no host abort-signal type
//! to bind to.
use crate::settlement::{settlement, Settle, Settlement};

/// A monotonic, one-shot "has this been aborted, and if so with what
/// reason" signal. Cloning an `AbortSignal` shares the same underlying
/// state; once [`AbortController::abort`] fires, every clone observes it.
#[derive(Clone)]
pub struct AbortSignal<R: Clone> {
    settlement: Settlement<R>,
}

impl<R: Clone> AbortSignal<R> {
    /// Returns the abort reason immediately, if the signal has already fired.
    pub fn aborted_reason(&self) -> Option<R> {
        self.settlement.peek()
    }

    pub fn is_aborted(&self) -> bool {
        self.settlement.is_settled()
    }

    /// Resolves with the abort reason once (and only once) the signal fires.
    /// Never resolves if the signal is never aborted.
    pub async fn aborted(&self) -> R {
        self.settlement.clone().await
    }
}

/// The controller half of an [`AbortSignal`]. Dropping the controller
/// without calling [`abort`](Self::abort) simply leaves the signal pending
/// forever, matching a DOM `AbortController` that nobody fires.
pub struct AbortController<R: Clone> {
    settle: Settle<R>,
    signal: AbortSignal<R>,
}

impl<R: Clone> AbortController<R> {
    pub fn new() -> Self {
        let (settlement, settle) = settlement();
        AbortController {
            settle,
            signal: AbortSignal { settlement },
        }
    }

    pub fn signal(&self) -> AbortSignal<R> {
        self.signal.clone()
    }

    /// Aborts the signal with `reason`. A no-op if already aborted (the
    /// monotonic "aborted" transition of §5 "Cancellation/timeouts").
    pub fn abort(&self, reason: R) -> bool {
        self.settle.settle(reason)
    }
}

impl<R: Clone> Default for AbortController<R> {
    fn default() -> Self {
        Self::new()
    }
}
