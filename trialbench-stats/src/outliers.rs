//! Outlier Detection
//!
//! Flags samples that sit far from the bulk of the distribution so noisy
//! runs can be recognised.
//!
//! Outliers are counted, never removed: min, max, percentiles and the mean
//! in a [`Summary`](crate::Summary) are always computed over every sample.

use crate::descriptive::{MAD_NORMAL_SCALE, mad_of_sorted, mean_unchecked};
use crate::percentiles::{percentile_of_sorted, sorted_copy};
use serde::{Deserialize, Serialize};

/// Method for outlier detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum OutlierMethod {
    /// Tukey fences: outside `[Q1 - fence*IQR, Q3 + fence*IQR]`
    Iqr {
        /// IQR multiplier (1.5 = standard, 3.0 = "far out")
        fence: f64,
    },
    /// Classic z-score against the (population) standard deviation
    ZScore {
        /// Number of standard deviations
        threshold: f64,
    },
    /// Modified z-score `|x - median| / (1.4826 * MAD)`
    Mad {
        /// Cut-off on the modified z-score (3.5 is customary)
        threshold: f64,
    },
    /// No outlier detection
    None,
}

impl Default for OutlierMethod {
    fn default() -> Self {
        OutlierMethod::Iqr { fence: 1.5 }
    }
}

/// Result of outlier analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierAnalysis {
    /// Indices (trial order) of outlier samples
    pub outlier_indices: Vec<usize>,
    /// Number of low outliers (below lower bound)
    pub low_count: usize,
    /// Number of high outliers (above upper bound)
    pub high_count: usize,
    /// Lower fence used for detection; `None` when no fences apply
    pub lower_bound: Option<f64>,
    /// Upper fence used for detection; `None` when no fences apply
    pub upper_bound: Option<f64>,
    /// Number of samples analysed
    pub sample_count: usize,
    /// Detection method used
    pub method: OutlierMethod,
}

impl OutlierAnalysis {
    /// Total number of outliers
    pub fn outlier_count(&self) -> usize {
        self.low_count + self.high_count
    }

    /// Percentage of samples that are outliers
    pub fn outlier_percentage(&self) -> f64 {
        if self.sample_count == 0 {
            return 0.0;
        }
        (self.outlier_count() as f64 / self.sample_count as f64) * 100.0
    }

    /// Check if outlier percentage exceeds threshold (indicates noisy environment)
    pub fn is_noisy(&self, threshold_pct: f64) -> bool {
        self.outlier_percentage() > threshold_pct
    }

    /// Copy of `samples` with the flagged outliers left out
    pub fn cleaned(&self, samples: &[f64]) -> Vec<f64> {
        samples
            .iter()
            .enumerate()
            .filter(|(i, _)| self.outlier_indices.binary_search(i).is_err())
            .map(|(_, &v)| v)
            .collect()
    }
}

/// Detect outliers in samples using specified method
///
/// # Examples
///
/// ```
/// # use trialbench_stats::{detect_outliers, OutlierMethod};
/// let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
/// let analysis = detect_outliers(&samples, OutlierMethod::default());
/// assert_eq!(analysis.outlier_count(), 1);
/// ```
pub fn detect_outliers(samples: &[f64], method: OutlierMethod) -> OutlierAnalysis {
    if samples.is_empty() {
        return unbounded(samples, method);
    }

    let sorted = sorted_copy(samples);
    let (lower, upper) = match method {
        OutlierMethod::None => return unbounded(samples, method),
        OutlierMethod::Iqr { fence } => {
            let q1 = percentile_of_sorted(&sorted, 25.0);
            let q3 = percentile_of_sorted(&sorted, 75.0);
            let iqr = q3 - q1;
            (q1 - fence * iqr, q3 + fence * iqr)
        }
        OutlierMethod::ZScore { threshold } => {
            let n = samples.len() as f64;
            let mean = mean_unchecked(samples);
            let std_dev = (samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
            (mean - threshold * std_dev, mean + threshold * std_dev)
        }
        OutlierMethod::Mad { threshold } => {
            let median = percentile_of_sorted(&sorted, 50.0);
            let spread = MAD_NORMAL_SCALE * mad_of_sorted(&sorted);
            (median - threshold * spread, median + threshold * spread)
        }
    };

    bounded(samples, method, lower, upper)
}

/// Analysis with no fences: nothing is an outlier.
fn unbounded(samples: &[f64], method: OutlierMethod) -> OutlierAnalysis {
    OutlierAnalysis {
        outlier_indices: Vec::new(),
        low_count: 0,
        high_count: 0,
        lower_bound: None,
        upper_bound: None,
        sample_count: samples.len(),
        method,
    }
}

/// Classify every sample against `[lower, upper]`.
fn bounded(samples: &[f64], method: OutlierMethod, lower: f64, upper: f64) -> OutlierAnalysis {
    let mut outlier_indices = Vec::new();
    let mut low_count = 0;
    let mut high_count = 0;

    for (i, &sample) in samples.iter().enumerate() {
        if sample < lower {
            outlier_indices.push(i);
            low_count += 1;
        } else if sample > upper {
            outlier_indices.push(i);
            high_count += 1;
        }
    }

    OutlierAnalysis {
        outlier_indices,
        low_count,
        high_count,
        lower_bound: Some(lower),
        upper_bound: Some(upper),
        sample_count: samples.len(),
        method,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_outliers() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = detect_outliers(&samples, OutlierMethod::default());

        assert!(result.outlier_indices.is_empty());
        assert_eq!(result.cleaned(&samples).len(), 5);
    }

    #[test]
    fn test_with_outliers() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let result = detect_outliers(&samples, OutlierMethod::default());

        assert_eq!(result.outlier_indices, vec![5]);
        assert_eq!(result.high_count, 1);
        assert_eq!(result.low_count, 0);
        assert_eq!(result.cleaned(&samples), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_outlier_percentage() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let result = detect_outliers(&samples, OutlierMethod::default());

        // 1 out of 6 = ~16.7%
        assert!(result.outlier_percentage() > 15.0);
        assert!(result.outlier_percentage() < 20.0);
        assert!(result.is_noisy(10.0));
        assert!(!result.is_noisy(20.0));
    }

    #[test]
    fn test_mad_method_flags_spike() {
        let samples = vec![10.0, 10.5, 9.5, 10.2, 9.8, 10.1, 55.0];
        let result = detect_outliers(&samples, OutlierMethod::Mad { threshold: 3.5 });
        assert_eq!(result.outlier_indices, vec![6]);
    }

    #[test]
    fn test_zscore_method_constant_samples() {
        let samples = vec![7.0; 10];
        let result = detect_outliers(&samples, OutlierMethod::ZScore { threshold: 3.0 });
        assert_eq!(result.outlier_count(), 0);
    }

    #[test]
    fn test_no_detection() {
        let samples = vec![1.0, 2.0, 100.0];
        let result = detect_outliers(&samples, OutlierMethod::None);

        assert!(result.outlier_indices.is_empty());
        assert_eq!(result.cleaned(&samples).len(), 3);
        assert_eq!(result.lower_bound, None);
        assert_eq!(result.upper_bound, None);
    }

    #[test]
    fn test_fences_reported() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = detect_outliers(&samples, OutlierMethod::Iqr { fence: 1.5 });

        assert_eq!(result.lower_bound, Some(-1.0));
        assert_eq!(result.upper_bound, Some(7.0));
    }

    #[test]
    fn test_empty_samples() {
        let result = detect_outliers(&[], OutlierMethod::default());

        assert!(result.outlier_indices.is_empty());
        assert_eq!(result.outlier_percentage(), 0.0);
    }
}
