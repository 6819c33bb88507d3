//! Run Comparison
//!
//! Regression detection between a baseline run and a current run of the
//! same workload: standardized scores, effect size, and a bootstrap
//! estimate of the probability that the current run is slower.

use crate::bootstrap::{
    chunked_resample, percentile_interval, resampled_mean, validate_confidence,
};
use crate::descriptive::{mean_unchecked, variance_with_mean};
use crate::error::{StatsError, ensure_at_least};
use crate::scores::{Baseline, welch_t, z_score};
use serde::{Deserialize, Serialize};

/// Result of comparing two runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Baseline mean
    pub baseline_mean: f64,
    /// Current mean
    pub current_mean: f64,
    /// Relative change in percent: (current - baseline) / baseline * 100
    pub relative_change: f64,
    /// Absolute change in the sample unit
    pub absolute_change: f64,
    /// Welch's t statistic (positive = current slower)
    #[serde(with = "crate::serde_float")]
    pub t_score: f64,
    /// Welch–Satterthwaite degrees of freedom
    pub degrees_of_freedom: f64,
    /// Current mean standardized by the baseline's spread
    #[serde(with = "crate::serde_float")]
    pub z_score: f64,
    /// Probability that current is slower than baseline (0.0 to 1.0)
    pub probability_regression: f64,
    /// Lower bound of the bootstrap CI of the difference of means
    pub difference_ci_lower: f64,
    /// Upper bound of the bootstrap CI of the difference of means
    pub difference_ci_upper: f64,
    /// Whether the difference is statistically significant
    pub is_significant: bool,
    /// Effect size (Cohen's d)
    pub effect_size: f64,
    /// Effect size interpretation
    pub effect_interpretation: EffectInterpretation,
}

impl ComparisonResult {
    /// Significant and slower
    pub fn is_regression(&self) -> bool {
        self.is_significant && self.absolute_change > 0.0
    }

    /// Significant and faster
    pub fn is_improvement(&self) -> bool {
        self.is_significant && self.absolute_change < 0.0
    }
}

/// Interpretation of effect size magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectInterpretation {
    /// |d| < 0.2 - negligible difference
    Negligible,
    /// 0.2 <= |d| < 0.5 - small difference
    Small,
    /// 0.5 <= |d| < 0.8 - medium difference
    Medium,
    /// |d| >= 0.8 - large difference
    Large,
}

impl std::fmt::Display for EffectInterpretation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectInterpretation::Negligible => write!(f, "negligible"),
            EffectInterpretation::Small => write!(f, "small"),
            EffectInterpretation::Medium => write!(f, "medium"),
            EffectInterpretation::Large => write!(f, "large"),
        }
    }
}

/// Configuration for comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Number of bootstrap iterations
    pub bootstrap_iterations: usize,
    /// Confidence level (e.g., 0.95 for 95%)
    pub confidence_level: f64,
    /// Minimum relative change (%) to call significant
    pub significance_threshold: f64,
    /// Resampling seed; `None` draws one from OS entropy
    pub seed: Option<u64>,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            bootstrap_iterations: 10_000,
            confidence_level: 0.95,
            significance_threshold: 5.0,
            seed: None,
        }
    }
}

/// Compare a current run against a baseline run
///
/// Both sequences need at least two samples.
pub fn compare_runs(
    baseline: &[f64],
    current: &[f64],
    config: &ComparisonConfig,
) -> Result<ComparisonResult, StatsError> {
    ensure_at_least(baseline, 2)?;
    ensure_at_least(current, 2)?;
    validate_confidence(config.confidence_level)?;

    let baseline_mean = mean_unchecked(baseline);
    let current_mean = mean_unchecked(current);
    let observed_diff = current_mean - baseline_mean;
    let relative_change = if baseline_mean > 0.0 {
        (observed_diff / baseline_mean) * 100.0
    } else {
        0.0
    };

    let (t_score, degrees_of_freedom) = welch_t(baseline, current)?;
    let z_score = z_score(current, &Baseline::from_samples(baseline)?)?;

    // Bootstrap the difference of means
    let seed = config.seed.unwrap_or_else(rand::random);
    let iterations = config.bootstrap_iterations.max(1);
    let diffs = chunked_resample(iterations, seed, true, |rng| {
        resampled_mean(current, rng) - resampled_mean(baseline, rng)
    });

    let regressions = diffs.iter().filter(|&&d| d > 0.0).count();
    let probability_regression = regressions as f64 / diffs.len() as f64;
    let (difference_ci_lower, difference_ci_upper) =
        percentile_interval(&diffs, config.confidence_level);

    // Cohen's d over the pooled standard deviation
    let n1 = baseline.len() as f64;
    let n2 = current.len() as f64;
    let var1 = variance_with_mean(baseline, baseline_mean);
    let var2 = variance_with_mean(current, current_mean);
    let pooled_std = (((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / (n1 + n2 - 2.0)).sqrt();
    let effect_size = if pooled_std > 0.0 {
        observed_diff / pooled_std
    } else {
        0.0
    };

    // Significant: CI excludes zero AND change exceeds threshold
    let ci_excludes_zero = difference_ci_lower > 0.0 || difference_ci_upper < 0.0;
    let exceeds_threshold = relative_change.abs() >= config.significance_threshold;

    Ok(ComparisonResult {
        baseline_mean,
        current_mean,
        relative_change,
        absolute_change: observed_diff,
        t_score,
        degrees_of_freedom,
        z_score,
        probability_regression,
        difference_ci_lower,
        difference_ci_upper,
        is_significant: ci_excludes_zero && exceeds_threshold,
        effect_size,
        effect_interpretation: interpret_effect_size(effect_size),
    })
}

/// Interpret effect size magnitude using Cohen's conventions
fn interpret_effect_size(d: f64) -> EffectInterpretation {
    let abs_d = d.abs();
    if abs_d < 0.2 {
        EffectInterpretation::Negligible
    } else if abs_d < 0.5 {
        EffectInterpretation::Small
    } else if abs_d < 0.8 {
        EffectInterpretation::Medium
    } else {
        EffectInterpretation::Large
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ComparisonConfig {
        ComparisonConfig {
            bootstrap_iterations: 2000,
            seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_compare_identical() {
        let samples = vec![100.0, 102.0, 98.0, 101.0, 99.0, 100.0, 101.0, 99.0];
        let result = compare_runs(&samples, &samples, &config()).unwrap();

        assert!(result.probability_regression > 0.3 && result.probability_regression < 0.7);
        assert_eq!(result.relative_change, 0.0);
        assert_eq!(result.t_score, 0.0);
        assert_eq!(result.z_score, 0.0);
        assert!(!result.is_significant);
        assert_eq!(
            result.effect_interpretation,
            EffectInterpretation::Negligible
        );
    }

    #[test]
    fn test_compare_clear_regression() {
        let baseline = vec![100.0, 102.0, 98.0, 101.0, 99.0, 100.0, 101.0, 99.0];
        let current = vec![200.0, 202.0, 198.0, 201.0, 199.0, 200.0, 201.0, 199.0];

        let result = compare_runs(&baseline, &current, &config()).unwrap();

        assert!(result.probability_regression > 0.95);
        assert!(result.relative_change > 90.0);
        assert!(result.t_score > 10.0);
        assert!(result.is_regression());
        assert_eq!(result.effect_interpretation, EffectInterpretation::Large);
    }

    #[test]
    fn test_compare_clear_improvement() {
        let baseline = vec![200.0, 202.0, 198.0, 201.0, 199.0, 200.0, 201.0, 199.0];
        let current = vec![100.0, 102.0, 98.0, 101.0, 99.0, 100.0, 101.0, 99.0];

        let result = compare_runs(&baseline, &current, &config()).unwrap();

        assert!(result.probability_regression < 0.05);
        assert!(result.relative_change < -40.0);
        assert!(result.is_improvement());
        assert!(result.t_score < 0.0);
    }

    #[test]
    fn test_seeded_comparison_is_reproducible() {
        let baseline = vec![10.0, 12.0, 11.0, 13.0, 9.0];
        let current = vec![11.0, 12.5, 11.5, 12.0, 10.0];
        let a = compare_runs(&baseline, &current, &config()).unwrap();
        let b = compare_runs(&baseline, &current, &config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_effect_size_interpretation() {
        assert_eq!(interpret_effect_size(0.1), EffectInterpretation::Negligible);
        assert_eq!(interpret_effect_size(0.3), EffectInterpretation::Small);
        assert_eq!(interpret_effect_size(0.6), EffectInterpretation::Medium);
        assert_eq!(interpret_effect_size(1.0), EffectInterpretation::Large);
        assert_eq!(interpret_effect_size(-0.5), EffectInterpretation::Medium);
    }

    #[test]
    fn test_insufficient_samples() {
        let config = ComparisonConfig::default();

        assert_eq!(
            compare_runs(&[], &[1.0, 2.0], &config),
            Err(StatsError::Empty)
        );
        assert_eq!(
            compare_runs(&[1.0], &[1.0, 2.0], &config),
            Err(StatsError::NotEnoughSamples { got: 1, min: 2 })
        );
        assert_eq!(
            compare_runs(&[1.0, 2.0], &[1.0], &config),
            Err(StatsError::NotEnoughSamples { got: 1, min: 2 })
        );
    }
}
