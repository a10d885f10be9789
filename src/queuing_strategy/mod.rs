//! The queuing strategy (§4.C): a pair of (size function, high-water mark)
//! producing a non-negative size per chunk.
use std::fmt;
use std::sync::Arc;

use crate::error::StreamError;

/// A pair of (size function, high-water mark) used by a readable or writable
/// stream to weigh its internal queue.
///
/// Construct with [`QueuingStrategy::new`] for a custom size function, or use
/// [`QueuingStrategy::count`] for the common "one chunk = size 1" strategy
/// (the default for both readable and writable streams, per §6).
pub struct QueuingStrategy<T, E: fmt::Debug + fmt::Display> {
    pub(crate) high_water_mark: f64,
    pub(crate) size_fn: Arc<dyn Fn(&T) -> Result<f64, E> + Send + Sync>,
}

impl<T, E: fmt::Debug + fmt::Display> Clone for QueuingStrategy<T, E> {
    fn clone(&self) -> Self {
        QueuingStrategy {
            high_water_mark: self.high_water_mark,
            size_fn: self.size_fn.clone(),
        }
    }
}

impl<T, E: fmt::Debug + fmt::Display> fmt::Debug for QueuingStrategy<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuingStrategy")
            .field("high_water_mark", &self.high_water_mark)
            .finish_non_exhaustive()
    }
}

impl<T, E: fmt::Debug + fmt::Display> QueuingStrategy<T, E> {
    /// Creates a strategy with the given high-water mark and size function.
    ///
    /// Fails with a range error if `high_water_mark` is negative or NaN
    /// (§4.C, §7).
    pub fn new(
        high_water_mark: f64,
        size_fn: impl Fn(&T) -> Result<f64, E> + Send + Sync + 'static,
    ) -> Result<Self, StreamError<E>> {
        if high_water_mark.is_nan() || high_water_mark < 0.0 {
            return Err(StreamError::range(
                "high water mark must be a non-negative number",
            ));
        }
        Ok(QueuingStrategy {
            high_water_mark,
            size_fn: Arc::new(size_fn),
        })
    }

    /// The "count" strategy: every chunk has size `1`, and the high-water
    /// mark is simply a chunk count.
    pub fn count(high_water_mark: f64) -> Result<Self, StreamError<E>>
    where
        E: 'static,
    {
        Self::new(high_water_mark, |_| Ok(1.0))
    }

    pub(crate) fn size_of(&self, chunk: &T) -> Result<f64, E> {
        (self.size_fn)(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_strategy_sizes_every_chunk_as_one() {
        let strategy: QueuingStrategy<&str, String> = QueuingStrategy::count(4.0).unwrap();
        assert_eq!(strategy.size_of(&"anything").unwrap(), 1.0);
        assert_eq!(strategy.high_water_mark, 4.0);
    }

    #[test]
    fn rejects_negative_or_nan_high_water_mark() {
        let err = QueuingStrategy::<&str, String>::count(-1.0).unwrap_err();
        assert!(matches!(err, StreamError::Range(_)));
        let err = QueuingStrategy::<&str, String>::count(f64::NAN).unwrap_err();
        assert!(matches!(err, StreamError::Range(_)));
    }

    #[test]
    fn size_function_error_surfaces_to_caller() {
        let strategy: QueuingStrategy<&str, String> =
            QueuingStrategy::new(1.0, |_| Err("boom".to_string())).unwrap();
        assert_eq!(strategy.size_of(&"x").unwrap_err(), "boom");
    }
}
