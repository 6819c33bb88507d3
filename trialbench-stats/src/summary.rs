//! Summary Statistics
//!
//! One immutable aggregate per finished run. Every field is computed over
//! the same sample slice; outliers are counted but kept in every statistic.

use crate::descriptive::{
    MAD_NORMAL_SCALE, cv_from, geometric_mean, mad_of_sorted, mean_unchecked, variance_with_mean,
};
use crate::error::{StatsError, ensure_non_empty};
use crate::outliers::{OutlierAnalysis, OutlierMethod, detect_outliers};
use crate::percentiles::{Percentiles, percentile_of_sorted, percentiles_of_sorted, sorted_copy};
use crate::scores::{Baseline, t_score, z_score};
use serde::{Deserialize, Serialize};

/// Options controlling what a summary includes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryOptions {
    /// Outlier detection method
    #[serde(default)]
    pub outlier_method: OutlierMethod,
    /// Reference run for z/t scores
    #[serde(default)]
    pub baseline: Option<Baseline>,
}

/// Comprehensive summary statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of samples summarised
    pub sample_count: usize,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Geometric mean; `None` when a sample is zero or negative
    pub geometric_mean: Option<f64>,
    /// Median (p50)
    pub median: f64,
    /// Standard percentiles
    pub percentiles: Percentiles,
    /// Sample variance
    pub variance: f64,
    /// Sample standard deviation
    pub std_dev: f64,
    /// Standard error of the mean
    pub std_err: f64,
    /// Median absolute deviation
    pub median_abs_dev: f64,
    /// Scaled MAD over sqrt(n)
    pub median_abs_err: f64,
    /// std_dev / |mean|
    pub coefficient_of_variation: f64,
    /// z-score against the configured baseline
    #[serde(default, with = "crate::serde_float::option")]
    pub z_score: Option<f64>,
    /// t-score against the configured baseline (needs two samples)
    #[serde(default, with = "crate::serde_float::option")]
    pub t_score: Option<f64>,
    /// Outlier classification
    pub outliers: OutlierAnalysis,
}

/// Compute summary statistics for a non-empty sample sequence
///
/// The caller's slice is never reordered.
pub fn compute_summary(samples: &[f64], options: &SummaryOptions) -> Result<Summary, StatsError> {
    ensure_non_empty(samples)?;

    let n = samples.len();
    let sorted = sorted_copy(samples);

    let mean = mean_unchecked(samples);
    let variance = variance_with_mean(samples, mean);
    let std_dev = variance.sqrt();
    let median_abs_dev = mad_of_sorted(&sorted);

    let (z_score, t_score) = match &options.baseline {
        Some(baseline) => (
            z_score(samples, baseline).ok(),
            t_score(samples, baseline).ok(),
        ),
        None => (None, None),
    };

    Ok(Summary {
        sample_count: n,
        min: sorted[0],
        max: sorted[n - 1],
        mean,
        geometric_mean: geometric_mean(samples).ok(),
        median: percentile_of_sorted(&sorted, 50.0),
        percentiles: percentiles_of_sorted(&sorted),
        variance,
        std_dev,
        std_err: std_dev / (n as f64).sqrt(),
        median_abs_dev,
        median_abs_err: MAD_NORMAL_SCALE * median_abs_dev / (n as f64).sqrt(),
        coefficient_of_variation: cv_from(std_dev, mean),
        z_score,
        t_score,
        outliers: detect_outliers(samples, options.outlier_method),
    })
}

impl Summary {
    /// Interquartile range
    pub fn iqr(&self) -> f64 {
        self.percentiles.p75 - self.percentiles.p25
    }

    /// Relative noise below `cv_threshold` (a ratio, e.g. 0.05)
    pub fn is_stable(&self, cv_threshold: f64) -> bool {
        self.coefficient_of_variation < cv_threshold
    }

    /// Outlier share above `threshold_pct` percent
    pub fn is_noisy(&self, threshold_pct: f64) -> bool {
        self.outliers.is_noisy(threshold_pct)
    }

    /// Baseline built from this summary, for scoring later runs
    pub fn as_baseline(&self) -> Baseline {
        Baseline {
            mean: self.mean,
            std_dev: self.std_dev,
            sample_count: self.sample_count,
        }
    }
}

/// Statistics for one auxiliary per-trial counter (cycles, cache misses, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterStatistics {
    /// Mean count per trial
    pub mean: f64,
    /// Median count per trial
    pub median: f64,
    /// Standard deviation of the count
    pub std_dev: f64,
    /// Minimum count observed
    pub min: u64,
    /// Maximum count observed
    pub max: u64,
    /// Counts per unit of elapsed time (cycles per ns approximates GHz)
    pub per_time_unit: f64,
}

/// Compute counter statistics from raw per-trial counts
///
/// `elapsed` runs parallel to `values` and is used for the rate.
pub fn compute_counter_stats(values: &[u64], elapsed: &[f64]) -> CounterStatistics {
    if values.is_empty() {
        return CounterStatistics::default();
    }

    let as_f64: Vec<f64> = values.iter().map(|&c| c as f64).collect();
    let sorted = sorted_copy(&as_f64);
    let mean = mean_unchecked(&as_f64);

    let total_elapsed: f64 = elapsed.iter().sum();
    let per_time_unit = if total_elapsed > 0.0 {
        as_f64.iter().sum::<f64>() / total_elapsed
    } else {
        0.0
    };

    CounterStatistics {
        mean,
        median: percentile_of_sorted(&sorted, 50.0),
        std_dev: variance_with_mean(&as_f64, mean).sqrt(),
        min: values.iter().copied().min().unwrap_or(0),
        max: values.iter().copied().max().unwrap_or(0),
        per_time_unit,
    }
}
