//! Dataset Providers
//!
//! A dataset is any iterator; the runner owns it and pulls one element per
//! trial. This module provides the common generation policies:
//!
//! - [`repeat`]: the same value forever
//! - [`Range`]: `start, start + step, ...` strictly below `end`
//! - [`Choice`]: a fixed set of values, cycled or drawn at random
//! - [`Random`]: continuous uniform or normal draws
//!
//! Use [`Iterator::take`] to bound an infinite provider.
//!
//! Random providers follow one seed discipline: the same seed yields the same
//! sequence, and no seed means an entropy-drawn one. The seed actually used
//! is always readable through `seed()` so a run can be replayed.

use crate::error::BenchError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};

/// Resolve an optional seed, drawing one from OS entropy when absent
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random)
}

// ─── Repeat ──────────────────────────────────────────────────────────────────

/// Infinite provider yielding clones of one value
#[derive(Debug, Clone)]
pub struct Repeat<T> {
    value: T,
}

/// Provider that feeds `value` to every trial
pub fn repeat<T: Clone>(value: T) -> Repeat<T> {
    Repeat { value }
}

impl<T: Clone> Iterator for Repeat<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        Some(self.value.clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

// ─── Range ───────────────────────────────────────────────────────────────────

/// Numeric types a [`Range`] can step over
pub trait RangeValue: Copy + PartialOrd + std::fmt::Debug {
    /// Whether `self` is a usable step (strictly positive and finite)
    fn is_valid_step(self) -> bool;

    /// Number of values in `[start, end)` at the given step
    fn step_count(start: Self, end: Self, step: Self) -> usize;

    /// `start + step * index`
    fn offset(start: Self, step: Self, index: usize) -> Self;
}

macro_rules! impl_range_int {
    ($($t:ty),*) => {$(
        impl RangeValue for $t {
            fn is_valid_step(self) -> bool {
                self > 0
            }

            fn step_count(start: Self, end: Self, step: Self) -> usize {
                if end <= start {
                    return 0;
                }
                let span = end as i128 - start as i128;
                let step = step as i128;
                ((span + step - 1) / step) as usize
            }

            fn offset(start: Self, step: Self, index: usize) -> Self {
                (start as i128 + step as i128 * index as i128) as $t
            }
        }
    )*};
}

macro_rules! impl_range_float {
    ($($t:ty),*) => {$(
        impl RangeValue for $t {
            fn is_valid_step(self) -> bool {
                self > 0.0 && self.is_finite()
            }

            fn step_count(start: Self, end: Self, step: Self) -> usize {
                if !(end > start) {
                    return 0;
                }
                ((end - start) / step).ceil() as usize
            }

            fn offset(start: Self, step: Self, index: usize) -> Self {
                start + step * index as $t
            }
        }
    )*};
}

impl_range_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_range_float!(f32, f64);

/// Finite arithmetic progression `start, start + step, ...` excluding `end`
#[derive(Debug, Clone)]
pub struct Range<T> {
    start: T,
    step: T,
    index: usize,
    len: usize,
}

impl<T: RangeValue> Range<T> {
    /// Validate and create a range
    ///
    /// Rejects a non-positive or non-finite step, bounds that are not
    /// comparable, and ranges that would be empty.
    pub fn new(start: T, end: T, step: T) -> Result<Self, BenchError> {
        if !step.is_valid_step() {
            return Err(BenchError::ConfigurationInvalid(format!(
                "range step must be positive, got {step:?}"
            )));
        }
        if !(start < end) {
            return Err(BenchError::ConfigurationInvalid(format!(
                "range start {start:?} must be below end {end:?}"
            )));
        }
        let mut len = T::step_count(start, end, step);
        // Float rounding can put the last computed value on or past `end`
        while len > 0 && !(T::offset(start, step, len - 1) < end) {
            len -= 1;
        }
        Ok(Self {
            start,
            step,
            index: 0,
            len,
        })
    }
}

impl<T: RangeValue> Iterator for Range<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.index >= self.len {
            return None;
        }
        let value = T::offset(self.start, self.step, self.index);
        self.index += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<T: RangeValue> ExactSizeIterator for Range<T> {}

// ─── Choice ──────────────────────────────────────────────────────────────────

/// How a [`Choice`] picks the next value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChoicePolicy {
    /// Deterministic round-robin in declaration order
    #[default]
    Cycle,
    /// Uniform random draw with replacement
    Random,
}

/// Infinite provider drawing from a fixed set of values
#[derive(Debug, Clone)]
pub struct Choice<T> {
    values: Vec<T>,
    policy: ChoicePolicy,
    cursor: usize,
    rng: StdRng,
    seed: u64,
}

impl<T: Clone> Choice<T> {
    /// Create a provider over `values`; `seed` only matters for `Random`
    pub fn new(values: Vec<T>, policy: ChoicePolicy, seed: Option<u64>) -> Result<Self, BenchError> {
        if values.is_empty() {
            return Err(BenchError::ConfigurationInvalid(
                "choice needs at least one value".into(),
            ));
        }
        let seed = resolve_seed(seed);
        Ok(Self {
            values,
            policy,
            cursor: 0,
            rng: StdRng::seed_from_u64(seed),
            seed,
        })
    }

    /// Seed driving random draws
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl<T: Clone> Iterator for Choice<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let index = match self.policy {
            ChoicePolicy::Cycle => {
                let i = self.cursor;
                self.cursor = (self.cursor + 1) % self.values.len();
                i
            }
            ChoicePolicy::Random => self.rng.gen_range(0..self.values.len()),
        };
        Some(self.values[index].clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

// ─── Random ──────────────────────────────────────────────────────────────────

/// Infinite provider of independent draws from a distribution
#[derive(Debug, Clone)]
pub struct Random<D> {
    distribution: D,
    rng: StdRng,
    seed: u64,
}

impl<D> Random<D> {
    /// Wrap any `rand_distr` distribution
    pub fn from_distribution(distribution: D, seed: Option<u64>) -> Self {
        let seed = resolve_seed(seed);
        Self {
            distribution,
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed driving the draws
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Random<Uniform<f64>> {
    /// Uniform draws over `[low, high)`
    pub fn uniform(low: f64, high: f64, seed: Option<u64>) -> Result<Self, BenchError> {
        if !(low < high && (high - low).is_finite()) {
            return Err(BenchError::ConfigurationInvalid(format!(
                "uniform bounds must be finite with low < high, got [{low}, {high})"
            )));
        }
        Ok(Self::from_distribution(Uniform::new(low, high), seed))
    }
}

impl Random<Normal<f64>> {
    /// Normal draws with the given mean and standard deviation
    pub fn normal(mean: f64, std_dev: f64, seed: Option<u64>) -> Result<Self, BenchError> {
        if !mean.is_finite() {
            return Err(BenchError::ConfigurationInvalid(format!(
                "normal mean must be finite, got {mean}"
            )));
        }
        if !(std_dev.is_finite() && std_dev >= 0.0) {
            return Err(BenchError::ConfigurationInvalid(format!(
                "normal std_dev must be finite and non-negative, got {std_dev}"
            )));
        }
        let distribution = Normal::new(mean, std_dev).map_err(|e| {
            BenchError::ConfigurationInvalid(format!("normal std_dev {std_dev}: {e}"))
        })?;
        Ok(Self::from_distribution(distribution, seed))
    }
}

impl<D: Distribution<f64>> Iterator for Random<D> {
    type Item = f64;

    #[inline]
    fn next(&mut self) -> Option<f64> {
        Some(self.distribution.sample(&mut self.rng))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

// ─── Declarative source ──────────────────────────────────────────────────────

/// Serializable description of a numeric dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DatasetSource {
    /// Same value for every trial
    Repeat {
        /// Value fed to the workload
        value: f64,
    },
    /// Arithmetic progression, end exclusive
    Range {
        /// First value
        start: f64,
        /// Exclusive upper bound
        end: f64,
        /// Positive increment
        step: f64,
    },
    /// Fixed set of values
    Choice {
        /// Candidate values
        values: Vec<f64>,
        /// Selection policy
        #[serde(default)]
        policy: ChoicePolicy,
        /// Seed for random selection
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Continuous uniform draws over `[low, high)`
    Uniform {
        /// Inclusive lower bound
        low: f64,
        /// Exclusive upper bound
        high: f64,
        /// Seed for the draws
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Normal draws
    Normal {
        /// Distribution mean
        mean: f64,
        /// Distribution standard deviation
        std_dev: f64,
        /// Seed for the draws
        #[serde(default)]
        seed: Option<u64>,
    },
}

impl Default for DatasetSource {
    fn default() -> Self {
        DatasetSource::Repeat { value: 0.0 }
    }
}

impl DatasetSource {
    /// Build the provider, optionally bounded to `take` elements
    pub fn build(&self, take: Option<usize>) -> Result<NumericDataset, BenchError> {
        let inner = match self {
            DatasetSource::Repeat { value } => NumericInner::Repeat(repeat(*value)),
            DatasetSource::Range { start, end, step } => {
                NumericInner::Range(Range::new(*start, *end, *step)?)
            }
            DatasetSource::Choice {
                values,
                policy,
                seed,
            } => NumericInner::Choice(Choice::new(values.clone(), *policy, *seed)?),
            DatasetSource::Uniform { low, high, seed } => {
                NumericInner::Uniform(Random::uniform(*low, *high, *seed)?)
            }
            DatasetSource::Normal {
                mean,
                std_dev,
                seed,
            } => NumericInner::Normal(Random::normal(*mean, *std_dev, *seed)?),
        };
        Ok(NumericDataset {
            inner,
            remaining: take,
        })
    }

    /// Whether the source consumes a random seed
    pub fn is_random(&self) -> bool {
        matches!(
            self,
            DatasetSource::Choice {
                policy: ChoicePolicy::Random,
                ..
            } | DatasetSource::Uniform { .. }
                | DatasetSource::Normal { .. }
        )
    }
}

#[derive(Debug, Clone)]
enum NumericInner {
    Repeat(Repeat<f64>),
    Range(Range<f64>),
    Choice(Choice<f64>),
    Uniform(Random<Uniform<f64>>),
    Normal(Random<Normal<f64>>),
}

/// Provider built from a [`DatasetSource`]
#[derive(Debug, Clone)]
pub struct NumericDataset {
    inner: NumericInner,
    remaining: Option<usize>,
}

impl NumericDataset {
    /// Seed actually used, for random sources
    pub fn seed(&self) -> Option<u64> {
        match &self.inner {
            NumericInner::Choice(c) => Some(c.seed()),
            NumericInner::Uniform(r) => Some(r.seed()),
            NumericInner::Normal(r) => Some(r.seed()),
            NumericInner::Repeat(_) | NumericInner::Range(_) => None,
        }
    }
}

impl Iterator for NumericDataset {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        match &mut self.inner {
            NumericInner::Repeat(it) => it.next(),
            NumericInner::Range(it) => it.next(),
            NumericInner::Choice(it) => it.next(),
            NumericInner::Uniform(it) => it.next(),
            NumericInner::Normal(it) => it.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lower, upper) = match &self.inner {
            NumericInner::Repeat(it) => it.size_hint(),
            NumericInner::Range(it) => it.size_hint(),
            NumericInner::Choice(it) => it.size_hint(),
            NumericInner::Uniform(it) => it.size_hint(),
            NumericInner::Normal(it) => it.size_hint(),
        };
        match self.remaining {
            Some(n) => (lower.min(n), Some(upper.map_or(n, |u| u.min(n)))),
            None => (lower, upper),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_is_infinite() {
        let values: Vec<i32> = repeat(10).take(4).collect();
        assert_eq!(values, vec![10, 10, 10, 10]);
        assert_eq!(repeat(1).size_hint(), (usize::MAX, None));
    }

    #[test]
    fn test_int_range_excludes_end() {
        let values: Vec<u32> = Range::new(0u32, 10, 3).unwrap().collect();
        assert_eq!(values, vec![0, 3, 6, 9]);
        assert_eq!(Range::new(0i64, 9, 3).unwrap().len(), 3);
    }

    #[test]
    fn test_float_range_has_no_drift() {
        let values: Vec<f64> = Range::new(0.0, 1.0, 0.1).unwrap().collect();
        assert_eq!(values.len(), 10);
        assert!((values[9] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_malformed_ranges_rejected() {
        assert!(matches!(
            Range::new(0, 10, 0),
            Err(BenchError::ConfigurationInvalid(_))
        ));
        assert!(Range::new(5, 5, 1).is_err());
        assert!(Range::new(10.0, 0.0, 1.0).is_err());
        assert!(Range::new(0.0, 1.0, f64::NAN).is_err());
        assert!(Range::new(0.0, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_choice_cycles_in_order() {
        let values: Vec<&str> = Choice::new(vec!["a", "b", "c"], ChoicePolicy::Cycle, None)
            .unwrap()
            .take(5)
            .collect();
        assert_eq!(values, vec!["a", "b", "c", "a", "b"]);
    }

    #[test]
    fn test_choice_requires_values() {
        assert!(Choice::<u8>::new(vec![], ChoicePolicy::Cycle, None).is_err());
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a: Vec<u8> = Choice::new(vec![1, 2, 3, 4], ChoicePolicy::Random, Some(7))
            .unwrap()
            .take(32)
            .collect();
        let b: Vec<u8> = Choice::new(vec![1, 2, 3, 4], ChoicePolicy::Random, Some(7))
            .unwrap()
            .take(32)
            .collect();
        assert_eq!(a, b);

        let x: Vec<f64> = Random::normal(5.0, 2.0, Some(99)).unwrap().take(16).collect();
        let y: Vec<f64> = Random::normal(5.0, 2.0, Some(99)).unwrap().take(16).collect();
        assert_eq!(x, y);
    }

    #[test]
    fn test_unseeded_reports_realised_seed() {
        let first = Random::uniform(0.0, 1.0, None).unwrap();
        let seed = first.seed();
        let replay: Vec<f64> = Random::uniform(0.0, 1.0, Some(seed)).unwrap().take(8).collect();
        let original: Vec<f64> = first.take(8).collect();
        assert_eq!(original, replay);
    }

    #[test]
    fn test_uniform_stays_in_bounds() {
        for v in Random::uniform(2.0, 3.0, Some(1)).unwrap().take(1000) {
            assert!((2.0..3.0).contains(&v));
        }
        assert!(Random::uniform(3.0, 3.0, None).is_err());
        assert!(Random::normal(0.0, -1.0, None).is_err());
    }

    #[test]
    fn test_normal_rejects_bad_std_dev() {
        assert!(Random::normal(5.0, 0.0, Some(1)).is_ok());
        for std_dev in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Random::normal(0.0, std_dev, None),
                Err(BenchError::ConfigurationInvalid(_))
            ));
        }

        let source = DatasetSource::Normal {
            mean: 10.0,
            std_dev: -2.0,
            seed: Some(3),
        };
        assert!(matches!(
            source.build(None),
            Err(BenchError::ConfigurationInvalid(_))
        ));
    }

    #[test]
    fn test_source_build_with_take() {
        let source = DatasetSource::Repeat { value: 10.0 };
        let dataset = source.build(Some(3)).unwrap();
        assert_eq!(dataset.size_hint(), (3, Some(3)));
        assert_eq!(dataset.seed(), None);
        assert_eq!(dataset.collect::<Vec<_>>(), vec![10.0, 10.0, 10.0]);

        let range = DatasetSource::Range {
            start: 0.0,
            end: 4.0,
            step: 1.0,
        };
        assert_eq!(range.build(Some(10)).unwrap().size_hint(), (4, Some(4)));
    }

    #[test]
    fn test_source_seed_reproducible() {
        let source = DatasetSource::Uniform {
            low: 0.0,
            high: 100.0,
            seed: Some(42),
        };
        assert!(source.is_random());
        let a = source.build(Some(20)).unwrap();
        assert_eq!(a.seed(), Some(42));
        let b = source.build(Some(20)).unwrap();
        assert_eq!(a.collect::<Vec<_>>(), b.collect::<Vec<_>>());
    }
}
