//! The [pipe](https://streams.spec.whatwg.org/#piping) algorithm (§4.G).
use std::fmt;

use futures_util::future::{select, Either};
use futures_util::pin_mut;

use crate::error::{StreamError, StreamResult};
use crate::writable::WritableStream;

use super::pipe_options::PipeOptions;
use super::ReadableStream;

/// Pipes `source` into `dest`, locking both for the duration (§4.G).
///
/// On success, every chunk read from `source` has been written to `dest`,
/// and (unless `prevent_close` is set) `dest` has been closed.
///
/// If `source` errors, `dest` is aborted with the same reason (unless
/// `prevent_abort`) and the error is returned. If `dest` errors, `source` is
/// cancelled with the same reason (unless `prevent_cancel`) and the error is
/// returned. If the pipe's [`AbortSignal`](crate::abort_signal::AbortSignal)
/// fires first, both sides are shut down with its reason.
pub async fn pipe<T, E>(
    source: &mut ReadableStream<T, E>,
    dest: &mut WritableStream<T, E>,
    options: &PipeOptions<E>,
) -> StreamResult<(), E>
where
    T: Send + 'static,
    E: Clone + fmt::Debug + fmt::Display + Send + 'static,
{
    let reader = source.get_reader()?;
    let writer = dest.get_writer()?;

    loop {
        let read_fut = reader.read();
        pin_mut!(read_fut);

        let read_outcome = if let Some(signal) = options.abort_signal() {
            let abort_fut = signal.aborted();
            pin_mut!(abort_fut);
            match select(read_fut, abort_fut).await {
                Either::Left((read_result, _)) => read_result,
                Either::Right((reason, _)) => {
                    if !options.prevent_abort_flag() {
                        let _ = writer.abort(Some(reason.clone())).await;
                    }
                    if !options.prevent_cancel_flag() {
                        let _ = reader.cancel(Some(reason.clone())).await;
                    }
                    return Err(StreamError::Reason(reason));
                }
            }
        } else {
            read_fut.await
        };

        match read_outcome {
            Ok(Some(chunk)) => {
                if let Err(err) = writer.write(chunk).await {
                    if !options.prevent_cancel_flag() {
                        let _ = reader.cancel(err.reason().cloned()).await;
                    }
                    return Err(err);
                }
            }
            Ok(None) => {
                if !options.prevent_close_flag() {
                    writer.close().await?;
                }
                return Ok(());
            }
            Err(err) => {
                if !options.prevent_abort_flag() {
                    let _ = writer.abort(err.reason().cloned()).await;
                }
                return Err(err);
            }
        }
    }
}
