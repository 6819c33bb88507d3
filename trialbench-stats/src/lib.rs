#![warn(missing_docs)]
//! Trialbench Statistical Engine
//!
//! Pure functions over a finished, non-empty sample sequence:
//! - Extrema, arithmetic and geometric mean
//! - Percentiles by linear interpolation between nearest ranks
//! - Sample variance, standard deviation and standard error
//! - Robust dispersion: median absolute deviation and its error analog
//! - Noise indicators: coefficient of variation, outlier share
//! - z/t scores against a baseline and full run-to-run comparison
//! - Bootstrap confidence intervals (percentile and BCa)
//!
//! No function reorders the caller's slice; order statistics work on an
//! internal sorted copy.

mod bootstrap;
mod comparison;
mod descriptive;
mod error;
mod outliers;
mod percentiles;
mod scores;
mod serde_float;
mod summary;

pub use bootstrap::{
    BootstrapConfig, BootstrapMethod, BootstrapResult, ConfidenceInterval, compute_bootstrap,
};
pub use comparison::{ComparisonConfig, ComparisonResult, EffectInterpretation, compare_runs};
pub use descriptive::{
    MAD_NORMAL_SCALE, coefficient_of_variation, geometric_mean, max, mean,
    median_absolute_deviation, median_absolute_err, min, std_dev, std_err, variance,
};
pub use error::StatsError;
pub use outliers::{OutlierAnalysis, OutlierMethod, detect_outliers};
pub use percentiles::{Percentiles, compute_percentiles, median, percentile};
pub use scores::{Baseline, t_score, welch_t, z_score};
pub use summary::{
    CounterStatistics, Summary, SummaryOptions, compute_counter_stats, compute_summary,
};

/// Threshold below which BCa method is used instead of percentile
pub const BCA_THRESHOLD: usize = 100;

/// Default number of bootstrap iterations
pub const DEFAULT_BOOTSTRAP_ITERATIONS: usize = 100_000;

/// Default confidence level (95%)
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(BCA_THRESHOLD, 100);
        assert_eq!(DEFAULT_BOOTSTRAP_ITERATIONS, 100_000);
        assert!((DEFAULT_CONFIDENCE_LEVEL - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_matches_individual_functions() {
        let samples = [12.0, 15.0, 11.0, 19.0, 14.0, 13.0];
        let summary = compute_summary(&samples, &SummaryOptions::default()).unwrap();

        assert_eq!(summary.min, min(&samples).unwrap());
        assert_eq!(summary.max, max(&samples).unwrap());
        assert_eq!(summary.mean, mean(&samples).unwrap());
        assert_eq!(summary.median, percentile(&samples, 50.0).unwrap());
        assert_eq!(summary.variance, variance(&samples).unwrap());
        assert_eq!(summary.std_err, std_err(&samples).unwrap());
        assert_eq!(summary.median_abs_dev, median_absolute_deviation(&samples).unwrap());
        assert_eq!(summary.median_abs_err, median_absolute_err(&samples).unwrap());
        assert_eq!(
            summary.coefficient_of_variation,
            coefficient_of_variation(&samples).unwrap()
        );
        assert_eq!(summary.geometric_mean, geometric_mean(&samples).ok());
    }
}
