//! Baseline Scores
//!
//! Standardized distance of a run's mean from a reference (baseline) mean,
//! for regression detection between a current run and a stored one.
//!
//! - `z_score` treats the baseline's standard deviation as the known
//!   population value. Appropriate for large baselines.
//! - `t_score` uses the current run's own standard error. Preferred for
//!   small trial counts.

use crate::descriptive::{mean_unchecked, variance_with_mean};
use crate::error::{StatsError, ensure_at_least, ensure_non_empty};
use serde::{Deserialize, Serialize};

/// Reference distribution a run is scored against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Baseline mean
    pub mean: f64,
    /// Baseline sample standard deviation
    pub std_dev: f64,
    /// Number of samples the baseline was computed from
    pub sample_count: usize,
}

impl Baseline {
    /// Build a baseline from a previously recorded sample sequence
    pub fn from_samples(samples: &[f64]) -> Result<Self, StatsError> {
        ensure_non_empty(samples)?;
        let mean = mean_unchecked(samples);
        Ok(Self {
            mean,
            std_dev: variance_with_mean(samples, mean).sqrt(),
            sample_count: samples.len(),
        })
    }
}

/// Divide, mapping a zero scale to 0 (no difference) or a signed infinity.
#[inline]
fn standardize(diff: f64, scale: f64) -> f64 {
    if scale > 0.0 {
        diff / scale
    } else if diff == 0.0 {
        0.0
    } else {
        diff.signum() * f64::INFINITY
    }
}

/// `(mean - baseline.mean) / (baseline.std_dev / sqrt(n))`
pub fn z_score(samples: &[f64], baseline: &Baseline) -> Result<f64, StatsError> {
    ensure_non_empty(samples)?;
    let n = samples.len() as f64;
    let diff = mean_unchecked(samples) - baseline.mean;
    Ok(standardize(diff, baseline.std_dev / n.sqrt()))
}

/// `(mean - baseline.mean) / std_err`, with `std_err` from `samples`
///
/// Needs at least two samples for a standard error.
pub fn t_score(samples: &[f64], baseline: &Baseline) -> Result<f64, StatsError> {
    ensure_at_least(samples, 2)?;
    let n = samples.len() as f64;
    let mean = mean_unchecked(samples);
    let std_err = variance_with_mean(samples, mean).sqrt() / n.sqrt();
    Ok(standardize(mean - baseline.mean, std_err))
}

/// Welch's two-sample t statistic and Welch–Satterthwaite degrees of freedom
pub fn welch_t(baseline: &[f64], current: &[f64]) -> Result<(f64, f64), StatsError> {
    ensure_at_least(baseline, 2)?;
    ensure_at_least(current, 2)?;

    let (n1, n2) = (baseline.len() as f64, current.len() as f64);
    let (m1, m2) = (mean_unchecked(baseline), mean_unchecked(current));
    let v1 = variance_with_mean(baseline, m1) / n1;
    let v2 = variance_with_mean(current, m2) / n2;

    let t = standardize(m2 - m1, (v1 + v2).sqrt());
    let denom = v1 * v1 / (n1 - 1.0) + v2 * v2 / (n2 - 1.0);
    let df = if denom > 0.0 {
        (v1 + v2).powi(2) / denom
    } else {
        n1 + n2 - 2.0
    };
    Ok((t, df))
}
