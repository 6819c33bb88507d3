//! Bootstrap Resampling
//!
//! Percentile and BCa (Bias-Corrected and Accelerated) confidence intervals
//! for the mean.
//!
//! Resampling is split into fixed-size chunks, each driven by its own RNG
//! derived from the configured seed. The resampled distribution therefore
//! depends only on the seed, not on how rayon schedules the chunks.

use crate::descriptive::mean_unchecked;
use crate::error::{StatsError, ensure_at_least};
use crate::percentiles::sorted_copy;
use crate::{BCA_THRESHOLD, DEFAULT_BOOTSTRAP_ITERATIONS, DEFAULT_CONFIDENCE_LEVEL};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Resamples per RNG stream
const CHUNK_SIZE: usize = 1024;

/// Bootstrap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Number of bootstrap iterations (default: 100,000)
    pub iterations: usize,
    /// Confidence level (default: 0.95 for 95% CI)
    pub confidence_level: f64,
    /// Whether to use parallel computation
    pub parallel: bool,
    /// Force BCa method even for large samples
    pub force_bca: bool,
    /// Resampling seed; `None` draws one from OS entropy
    pub seed: Option<u64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_BOOTSTRAP_ITERATIONS,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            parallel: true,
            force_bca: false,
            seed: None,
        }
    }
}

/// Which bootstrap method was used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BootstrapMethod {
    /// Standard percentile method (for N >= 100)
    Percentile,
    /// BCa method (for small samples or when forced)
    Bca,
}

/// Confidence interval bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower bound
    pub lower: f64,
    /// Upper bound
    pub upper: f64,
    /// Confidence level the bounds were computed for
    pub level: f64,
}

impl ConfidenceInterval {
    /// Whether `value` lies within the interval (inclusive)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Interval width
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Result of bootstrap analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapResult {
    /// Point estimate (sample mean)
    pub point_estimate: f64,
    /// Confidence interval
    pub confidence_interval: ConfidenceInterval,
    /// Standard error of the mean
    pub standard_error: f64,
    /// Which method was used
    pub method: BootstrapMethod,
    /// Seed the resampling used
    pub seed: u64,
    /// Warning message if any
    pub warning: Option<String>,
}

/// Compute bootstrap confidence interval for the mean
///
/// Automatically selects BCa method for small samples (N < 100).
pub fn compute_bootstrap(
    samples: &[f64],
    config: &BootstrapConfig,
) -> Result<BootstrapResult, StatsError> {
    ensure_at_least(samples, 3)?;
    validate_confidence(config.confidence_level)?;

    let n = samples.len();
    let seed = config.seed.unwrap_or_else(rand::random);
    let point_estimate = mean_unchecked(samples);

    let spread = samples.iter().map(|x| (x - point_estimate).powi(2)).sum::<f64>();
    if spread == 0.0 {
        return Ok(BootstrapResult {
            point_estimate,
            confidence_interval: ConfidenceInterval {
                lower: point_estimate,
                upper: point_estimate,
                level: config.confidence_level,
            },
            standard_error: 0.0,
            method: BootstrapMethod::Percentile,
            seed,
            warning: Some("All samples have identical values".to_string()),
        });
    }

    let use_bca = config.force_bca || n < BCA_THRESHOLD;
    let iterations = config.iterations.max(1);
    let bootstrap_means = resample_means(samples, iterations, seed, config.parallel);

    let (lower, upper) = if use_bca {
        bca_interval(samples, &bootstrap_means, config.confidence_level)
    } else {
        percentile_interval(&bootstrap_means, config.confidence_level)
    };

    let bootstrap_mean = bootstrap_means.iter().sum::<f64>() / bootstrap_means.len() as f64;
    let standard_error = (bootstrap_means
        .iter()
        .map(|x| (x - bootstrap_mean).powi(2))
        .sum::<f64>()
        / bootstrap_means.len() as f64)
        .sqrt();

    let warning = if n < 10 {
        Some("Very small sample size may lead to unreliable estimates".to_string())
    } else {
        None
    };

    Ok(BootstrapResult {
        point_estimate,
        confidence_interval: ConfidenceInterval {
            lower,
            upper,
            level: config.confidence_level,
        },
        standard_error,
        method: if use_bca {
            BootstrapMethod::Bca
        } else {
            BootstrapMethod::Percentile
        },
        seed,
        warning,
    })
}

pub(crate) fn validate_confidence(level: f64) -> Result<(), StatsError> {
    if level > 0.0 && level < 1.0 {
        Ok(())
    } else {
        Err(StatsError::InvalidConfidenceLevel(level))
    }
}

/// Seed for one chunk's RNG stream (SplitMix64 finaliser over seed + index).
pub(crate) fn chunk_seed(seed: u64, chunk: u64) -> u64 {
    let mut z = seed.wrapping_add(chunk.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Run `iterations` resamples of `f`, chunked over independent RNG streams.
pub(crate) fn chunked_resample<F>(iterations: usize, seed: u64, parallel: bool, f: F) -> Vec<f64>
where
    F: Fn(&mut StdRng) -> f64 + Sync,
{
    let chunks = iterations.div_ceil(CHUNK_SIZE);
    let run_chunk = |chunk: usize| {
        let mut rng = StdRng::seed_from_u64(chunk_seed(seed, chunk as u64));
        let len = CHUNK_SIZE.min(iterations - chunk * CHUNK_SIZE);
        (0..len).map(|_| f(&mut rng)).collect::<Vec<f64>>()
    };

    if parallel {
        (0..chunks).into_par_iter().flat_map_iter(run_chunk).collect()
    } else {
        (0..chunks).flat_map(run_chunk).collect()
    }
}

/// Mean of one resample drawn with replacement
#[inline]
pub(crate) fn resampled_mean(samples: &[f64], rng: &mut StdRng) -> f64 {
    let n = samples.len();
    (0..n).map(|_| samples[rng.gen_range(0..n)]).sum::<f64>() / n as f64
}

fn resample_means(samples: &[f64], iterations: usize, seed: u64, parallel: bool) -> Vec<f64> {
    chunked_resample(iterations, seed, parallel, |rng| resampled_mean(samples, rng))
}

/// Standard percentile interval
pub(crate) fn percentile_interval(bootstrap: &[f64], confidence: f64) -> (f64, f64) {
    let sorted = sorted_copy(bootstrap);

    let n = sorted.len();
    let alpha = (1.0 - confidence) / 2.0;

    let lower_idx = ((alpha * n as f64).floor() as usize).min(n - 1);
    let upper_idx = (((1.0 - alpha) * n as f64).floor() as usize).min(n - 1);

    (sorted[lower_idx], sorted[upper_idx])
}

/// BCa (Bias-Corrected and Accelerated) interval
///
/// More accurate for small samples and skewed distributions.
fn bca_interval(samples: &[f64], bootstrap_means: &[f64], confidence: f64) -> (f64, f64) {
    let n = samples.len();
    let b = bootstrap_means.len();
    let theta_hat = mean_unchecked(samples);

    let sorted = sorted_copy(bootstrap_means);

    // Bias correction (z0)
    let count_below = bootstrap_means.iter().filter(|&&x| x < theta_hat).count();
    let prop = count_below as f64 / b as f64;
    let z0 = normal_quantile(prop.clamp(0.0001, 0.9999));

    // Acceleration (a) via jackknife
    let total: f64 = samples.iter().sum();
    let jackknife_means: Vec<f64> = samples
        .iter()
        .map(|x| (total - x) / (n - 1) as f64)
        .collect();
    let jack_mean = jackknife_means.iter().sum::<f64>() / n as f64;
    let numerator: f64 = jackknife_means.iter().map(|x| (jack_mean - x).powi(3)).sum();
    let denominator: f64 = jackknife_means.iter().map(|x| (jack_mean - x).powi(2)).sum();

    let a = if denominator.abs() < 1e-10 {
        0.0
    } else {
        numerator / (6.0 * denominator.powf(1.5))
    };

    let alpha = (1.0 - confidence) / 2.0;
    let z_alpha = normal_quantile(alpha);
    let z_1_alpha = normal_quantile(1.0 - alpha);

    let alpha1 = normal_cdf(z0 + (z0 + z_alpha) / (1.0 - a * (z0 + z_alpha)));
    let alpha2 = normal_cdf(z0 + (z0 + z_1_alpha) / (1.0 - a * (z0 + z_1_alpha)));

    let lower_idx = ((alpha1 * b as f64).floor() as usize).min(b - 1);
    let upper_idx = ((alpha2 * b as f64).floor() as usize).min(b - 1);

    (sorted[lower_idx], sorted[upper_idx])
}

/// Standard normal quantile (inverse CDF)
///
/// Abramowitz and Stegun 26.2.23.
pub(crate) fn normal_quantile(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let p = p.clamp(1e-10, 1.0 - 1e-10);
    let sign = if p < 0.5 { -1.0 } else { 1.0 };
    let p = if p < 0.5 { p } else { 1.0 - p };

    let t = (-2.0 * p.ln()).sqrt();

    let c0 = 2.515517;
    let c1 = 0.802853;
    let c2 = 0.010328;
    let d1 = 1.432788;
    let d2 = 0.189269;
    let d3 = 0.001308;

    let x = t - (c0 + c1 * t + c2 * t * t) / (1.0 + d1 * t + d2 * t * t + d3 * t * t * t);

    sign * x
}

/// Standard normal CDF
pub(crate) fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Error function, Abramowitz and Stegun 7.1.26
fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x >= 0.0 { 1.0 } else { -1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}
