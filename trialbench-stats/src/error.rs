//! Statistics Errors

use thiserror::Error;

/// Errors reported by individual statistics calls.
///
/// A failing call never invalidates values already computed from the same
/// sample sequence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// The sample sequence has no elements
    #[error("sample sequence is empty")]
    Empty,

    /// Geometric mean requested over a sequence containing a zero or negative value
    #[error("geometric mean requires strictly positive samples, found {value} at index {index}")]
    NonPositive {
        /// Position of the first offending sample
        index: usize,
        /// The offending value
        value: f64,
    },

    /// Percentile outside [0, 100]
    #[error("percentile {0} is outside [0, 100]")]
    PercentileOutOfRange(f64),

    /// The statistic needs more samples than were supplied
    #[error("not enough samples: got {got}, need at least {min}")]
    NotEnoughSamples {
        /// Samples supplied
        got: usize,
        /// Samples required
        min: usize,
    },

    /// Confidence level not strictly between 0 and 1
    #[error("invalid confidence level: {0} (must be between 0 and 1)")]
    InvalidConfidenceLevel(f64),
}

/// Reject empty input.
#[inline]
pub(crate) fn ensure_non_empty(samples: &[f64]) -> Result<(), StatsError> {
    if samples.is_empty() {
        Err(StatsError::Empty)
    } else {
        Ok(())
    }
}

/// Reject input shorter than `min`.
#[inline]
pub(crate) fn ensure_at_least(samples: &[f64], min: usize) -> Result<(), StatsError> {
    ensure_non_empty(samples)?;
    if samples.len() < min {
        Err(StatsError::NotEnoughSamples {
            got: samples.len(),
            min,
        })
    } else {
        Ok(())
    }
}
