use crate::abort_signal::AbortSignal;

/// Options controlling [`ReadableStream::pipe_to_with_options`](super::ReadableStream::pipe_to_with_options)
/// (§6 "Pipe options").
#[derive(Clone)]
pub struct PipeOptions<E> {
    prevent_close: bool,
    prevent_cancel: bool,
    prevent_abort: bool,
    signal: Option<AbortSignal<E>>,
}

impl<E> Default for PipeOptions<E> {
    fn default() -> Self {
        PipeOptions {
            prevent_close: false,
            prevent_cancel: false,
            prevent_abort: false,
            signal: None,
        }
    }
}

impl<E: Clone> PipeOptions<E> {
    pub fn new() -> Self {
        Default::default()
    }

    /// If set, the destination is not closed when the source closes.
    pub fn prevent_close(&mut self, prevent_close: bool) -> &mut Self {
        self.prevent_close = prevent_close;
        self
    }

    /// If set, the source is not cancelled when the destination errors.
    pub fn prevent_cancel(&mut self, prevent_cancel: bool) -> &mut Self {
        self.prevent_cancel = prevent_cancel;
        self
    }

    /// If set, the destination is not aborted when the source errors.
    pub fn prevent_abort(&mut self, prevent_abort: bool) -> &mut Self {
        self.prevent_abort = prevent_abort;
        self
    }

    /// An [`AbortSignal`] that, once fired, stops the pipe with its reason
    /// (§4.G "Shutdown", triggered by the signal).
    pub fn signal(&mut self, signal: AbortSignal<E>) -> &mut Self {
        self.signal = Some(signal);
        self
    }

    pub(crate) fn prevent_close_flag(&self) -> bool {
        self.prevent_close
    }

    pub(crate) fn prevent_cancel_flag(&self) -> bool {
        self.prevent_cancel
    }

    pub(crate) fn prevent_abort_flag(&self) -> bool {
        self.prevent_abort
    }

    pub(crate) fn abort_signal(&self) -> Option<&AbortSignal<E>> {
        self.signal.as_ref()
    }
}
