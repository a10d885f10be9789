//! Small cross-module helpers.
use std::fmt;

use crate::error::StreamError;

/// Maps the settlement of a `cancel`/`close`/`abort` algorithm to the
/// `Result<(), StreamError<E>>` shape every public surface method returns.
pub(crate) fn void_result<E: fmt::Debug + fmt::Display>(
    result: Result<(), E>,
) -> Result<(), StreamError<E>> {
    result.map_err(StreamError::Reason)
}
