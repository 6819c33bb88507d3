//! Percentile Computation
//!
//! Order statistics over raw samples. Tail percentiles (p99, p999) keep
//! outliers: in latency data the tail IS the signal.

use crate::error::{StatsError, ensure_non_empty};
use serde::{Deserialize, Serialize};

/// Standard percentiles reported in a summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    /// 25th percentile (first quartile)
    pub p25: f64,
    /// 50th percentile (median)
    pub p50: f64,
    /// 75th percentile (third quartile)
    pub p75: f64,
    /// 90th percentile
    pub p90: f64,
    /// 95th percentile
    pub p95: f64,
    /// 99th percentile
    pub p99: f64,
    /// 99.9th percentile
    pub p999: f64,
}

/// Sorted copy of `samples`; the caller's slice is left untouched.
pub(crate) fn sorted_copy(samples: &[f64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Percentile over an already sorted, non-empty slice.
///
/// Linear interpolation between the two nearest ranks. `p` must already be
/// validated to lie in [0, 100].
pub(crate) fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0) * (n - 1) as f64;
    let lower_idx = (rank.floor() as usize).min(n - 1);
    let upper_idx = (lower_idx + 1).min(n - 1);
    let fraction = rank - lower_idx as f64;

    if fraction == 0.0 {
        return sorted[lower_idx];
    }
    sorted[lower_idx] + fraction * (sorted[upper_idx] - sorted[lower_idx])
}

fn validate_percentile(p: f64) -> Result<(), StatsError> {
    if (0.0..=100.0).contains(&p) {
        Ok(())
    } else {
        Err(StatsError::PercentileOutOfRange(p))
    }
}

/// Compute a single percentile from samples
///
/// Uses linear interpolation between nearest ranks; `percentile(0)` is the
/// minimum and `percentile(100)` the maximum, exactly.
///
/// # Examples
///
/// ```
/// # use trialbench_stats::percentile;
/// let samples = [5.0, 1.0, 4.0, 2.0, 3.0];
/// assert_eq!(percentile(&samples, 50.0).unwrap(), 3.0);
/// assert_eq!(percentile(&samples, 100.0).unwrap(), 5.0);
/// ```
pub fn percentile(samples: &[f64], p: f64) -> Result<f64, StatsError> {
    ensure_non_empty(samples)?;
    validate_percentile(p)?;
    Ok(percentile_of_sorted(&sorted_copy(samples), p))
}

/// Median (50th percentile)
pub fn median(samples: &[f64]) -> Result<f64, StatsError> {
    percentile(samples, 50.0)
}

/// Compute all standard percentiles with a single sort
pub fn compute_percentiles(samples: &[f64]) -> Result<Percentiles, StatsError> {
    ensure_non_empty(samples)?;
    Ok(percentiles_of_sorted(&sorted_copy(samples)))
}

pub(crate) fn percentiles_of_sorted(sorted: &[f64]) -> Percentiles {
    Percentiles {
        p25: percentile_of_sorted(sorted, 25.0),
        p50: percentile_of_sorted(sorted, 50.0),
        p75: percentile_of_sorted(sorted, 75.0),
        p90: percentile_of_sorted(sorted, 90.0),
        p95: percentile_of_sorted(sorted, 95.0),
        p99: percentile_of_sorted(sorted, 99.0),
        p999: percentile_of_sorted(sorted, 99.9),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let p50 = percentile(&samples, 50.0).unwrap();
        assert!((p50 - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_median_even_interpolates() {
        let samples = vec![4.0, 1.0, 3.0, 2.0];
        assert!((median(&samples).unwrap() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_quartiles() {
        let samples: Vec<f64> = (1..=100).map(|x| x as f64).collect();
        let p25 = percentile(&samples, 25.0).unwrap();
        let p75 = percentile(&samples, 75.0).unwrap();

        assert!((p25 - 25.75).abs() < 1e-9);
        assert!((p75 - 75.25).abs() < 1e-9);
    }

    #[test]
    fn test_extremes_are_exact() {
        let samples = vec![0.3, 0.1, 0.7, 0.2];
        assert_eq!(percentile(&samples, 0.0).unwrap(), 0.1);
        assert_eq!(percentile(&samples, 100.0).unwrap(), 0.7);
    }

    #[test]
    fn test_does_not_mutate_input() {
        let samples = vec![3.0, 1.0, 2.0];
        let _ = percentile(&samples, 50.0).unwrap();
        assert_eq!(samples, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_single_sample() {
        let samples = vec![42.0];
        assert_eq!(percentile(&samples, 73.0).unwrap(), 42.0);
    }

    #[test]
    fn test_empty_samples() {
        assert_eq!(percentile(&[], 50.0), Err(StatsError::Empty));
    }

    #[test]
    fn test_out_of_range() {
        let samples = vec![1.0, 2.0];
        assert_eq!(
            percentile(&samples, 100.5),
            Err(StatsError::PercentileOutOfRange(100.5))
        );
        assert!(percentile(&samples, -1.0).is_err());
        assert!(percentile(&samples, f64::NAN).is_err());
    }

    #[test]
    fn test_compute_all_percentiles() {
        let samples: Vec<f64> = (1..=1000).map(|x| x as f64).collect();
        let percentiles = compute_percentiles(&samples).unwrap();

        assert!(percentiles.p50 > 499.0 && percentiles.p50 < 502.0);
        assert!(percentiles.p90 > 899.0 && percentiles.p90 < 902.0);
        assert!(percentiles.p99 > 985.0 && percentiles.p99 < 995.0);
        assert!(percentiles.p999 > 998.0 && percentiles.p999 <= 1000.0);
    }
}
