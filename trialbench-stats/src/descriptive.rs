//! Descriptive Statistics
//!
//! Extrema, central tendency and dispersion over a non-empty sample sequence.
//!
//! Variance is the sample (Bessel-corrected) variance: a benchmark run only
//! ever observes a sample of the workload's cost distribution. A single
//! sample has variance 0.

use crate::error::{StatsError, ensure_non_empty};
use crate::percentiles::{percentile_of_sorted, sorted_copy};

/// Scale factor making the MAD a consistent estimator of the standard
/// deviation for normally distributed data.
pub const MAD_NORMAL_SCALE: f64 = 1.4826;

/// Smallest sample
pub fn min(samples: &[f64]) -> Result<f64, StatsError> {
    ensure_non_empty(samples)?;
    Ok(samples.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Largest sample
pub fn max(samples: &[f64]) -> Result<f64, StatsError> {
    ensure_non_empty(samples)?;
    Ok(samples.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Arithmetic mean
pub fn mean(samples: &[f64]) -> Result<f64, StatsError> {
    ensure_non_empty(samples)?;
    Ok(mean_unchecked(samples))
}

#[inline]
pub(crate) fn mean_unchecked(samples: &[f64]) -> f64 {
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    // Summation rounding can push the mean of near-identical values just
    // outside [min, max].
    let lo = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo <= hi { mean.clamp(lo, hi) } else { mean }
}

/// Geometric mean, computed in log space.
///
/// Defined only for strictly positive samples.
pub fn geometric_mean(samples: &[f64]) -> Result<f64, StatsError> {
    ensure_non_empty(samples)?;
    if let Some((index, &value)) = samples.iter().enumerate().find(|(_, v)| **v <= 0.0) {
        return Err(StatsError::NonPositive { index, value });
    }
    let log_mean = samples.iter().map(|x| x.ln()).sum::<f64>() / samples.len() as f64;
    Ok(log_mean.exp())
}

/// Sample variance (n - 1 denominator)
pub fn variance(samples: &[f64]) -> Result<f64, StatsError> {
    ensure_non_empty(samples)?;
    Ok(variance_with_mean(samples, mean_unchecked(samples)))
}

pub(crate) fn variance_with_mean(samples: &[f64], mean: f64) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (samples.len() - 1) as f64
}

/// Sample standard deviation
pub fn std_dev(samples: &[f64]) -> Result<f64, StatsError> {
    Ok(variance(samples)?.sqrt())
}

/// Standard error of the mean
pub fn std_err(samples: &[f64]) -> Result<f64, StatsError> {
    Ok(std_dev(samples)? / (samples.len() as f64).sqrt())
}

/// Median of absolute deviations from the median
///
/// Robust to outliers: a handful of scheduler hiccups moves the standard
/// deviation a lot and the MAD hardly at all.
pub fn median_absolute_deviation(samples: &[f64]) -> Result<f64, StatsError> {
    ensure_non_empty(samples)?;
    let sorted = sorted_copy(samples);
    Ok(mad_of_sorted(&sorted))
}

pub(crate) fn mad_of_sorted(sorted: &[f64]) -> f64 {
    let median = percentile_of_sorted(sorted, 50.0);
    let deviations: Vec<f64> = sorted.iter().map(|x| (x - median).abs()).collect();
    percentile_of_sorted(&sorted_copy(&deviations), 50.0)
}

/// Robust analog of the standard error: `1.4826 * MAD / sqrt(n)`
pub fn median_absolute_err(samples: &[f64]) -> Result<f64, StatsError> {
    let mad = median_absolute_deviation(samples)?;
    Ok(MAD_NORMAL_SCALE * mad / (samples.len() as f64).sqrt())
}

/// Relative noise: `std_dev / |mean|` (a ratio, not a percentage)
///
/// Zero when the mean is zero.
pub fn coefficient_of_variation(samples: &[f64]) -> Result<f64, StatsError> {
    ensure_non_empty(samples)?;
    let mean = mean_unchecked(samples);
    Ok(cv_from(variance_with_mean(samples, mean).sqrt(), mean))
}

#[inline]
pub(crate) fn cv_from(std_dev: f64, mean: f64) -> f64 {
    if mean == 0.0 {
        0.0
    } else {
        std_dev / mean.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [f64; 8] = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

    #[test]
    fn test_extrema() {
        assert_eq!(min(&SAMPLES).unwrap(), 2.0);
        assert_eq!(max(&SAMPLES).unwrap(), 9.0);
    }

    #[test]
    fn test_mean_and_variance() {
        assert!((mean(&SAMPLES).unwrap() - 5.0).abs() < 1e-12);
        // Sum of squared deviations is 32; Bessel-corrected over 7
        assert!((variance(&SAMPLES).unwrap() - 32.0 / 7.0).abs() < 1e-12);
        assert!((std_dev(&SAMPLES).unwrap() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        let se = std_err(&SAMPLES).unwrap();
        assert!((se - (32.0f64 / 7.0).sqrt() / 8.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_single_sample_has_zero_spread() {
        assert_eq!(variance(&[3.0]).unwrap(), 0.0);
        assert_eq!(std_dev(&[3.0]).unwrap(), 0.0);
        assert_eq!(coefficient_of_variation(&[3.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_geometric_mean() {
        let gm = geometric_mean(&[1.0, 10.0, 100.0]).unwrap();
        assert!((gm - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_geometric_mean_domain_error() {
        assert_eq!(
            geometric_mean(&[1.0, 0.0, 3.0]),
            Err(StatsError::NonPositive {
                index: 1,
                value: 0.0
            })
        );
        assert!(matches!(
            geometric_mean(&[-1.0]),
            Err(StatsError::NonPositive { index: 0, .. })
        ));
    }

    #[test]
    fn test_mad_ignores_outlier() {
        let clean = [10.0, 11.0, 12.0, 13.0, 14.0];
        let dirty = [10.0, 11.0, 12.0, 13.0, 1_000.0];
        let mad_clean = median_absolute_deviation(&clean).unwrap();
        let mad_dirty = median_absolute_deviation(&dirty).unwrap();
        assert_eq!(mad_clean, 1.0);
        assert_eq!(mad_dirty, 1.0);
        assert!(std_dev(&dirty).unwrap() > 10.0 * std_dev(&clean).unwrap());
    }

    #[test]
    fn test_median_absolute_err() {
        let err = median_absolute_err(&[10.0, 11.0, 12.0, 13.0]).unwrap();
        assert!((err - MAD_NORMAL_SCALE * 1.0 / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_coefficient_of_variation() {
        let cv = coefficient_of_variation(&[90.0, 110.0]).unwrap();
        let expected = 200.0f64.sqrt() / 100.0;
        assert!((cv - expected).abs() < 1e-12);
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_mean_stays_within_extrema() {
        let samples = [0.1 + 0.2; 7];
        let m = mean(&samples).unwrap();
        assert!(m >= min(&samples).unwrap() && m <= max(&samples).unwrap());
    }

    #[test]
    fn test_empty_is_error() {
        assert_eq!(min(&[]), Err(StatsError::Empty));
        assert_eq!(mean(&[]), Err(StatsError::Empty));
        assert_eq!(variance(&[]), Err(StatsError::Empty));
        assert_eq!(median_absolute_deviation(&[]), Err(StatsError::Empty));
    }
}
