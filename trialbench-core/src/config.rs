//! Run Configuration
//!
//! Immutable description of one run. Built by the caller, validated once by
//! the runner, never mutated while trials execute.

use crate::cache::{CacheCondition, DEFAULT_POLLUTE_BYTES};
use crate::error::BenchError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use trialbench_stats::SummaryOptions;

/// Default number of discarded warm-up trials
pub const DEFAULT_WARMUP_TRIALS: usize = 3;

/// Default calibration target: total sampling time to aim for
pub const DEFAULT_TARGET_TIME: Duration = Duration::from_millis(100);

/// Default lower bound on calibrated trial count
pub const DEFAULT_MIN_TRIALS: usize = 10;

/// Default upper bound on calibrated trial count
pub const DEFAULT_MAX_TRIALS: usize = 10_000;

/// How many trials the sampling phase runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrialCount {
    /// Exactly `n` trials; calibration is skipped
    Fixed(usize),
    /// Double a batch until it takes `target_time` or reaches `max_trials`
    Calibrated {
        /// Total trial time the calibrated count should fill
        #[serde(with = "duration_nanos")]
        target_time: Duration,
        /// Floor on the final count
        min_trials: usize,
        /// Ceiling on the final count and on calibration batches
        max_trials: usize,
    },
}

impl Default for TrialCount {
    fn default() -> Self {
        TrialCount::Calibrated {
            target_time: DEFAULT_TARGET_TIME,
            min_trials: DEFAULT_MIN_TRIALS,
            max_trials: DEFAULT_MAX_TRIALS,
        }
    }
}

impl TrialCount {
    /// Trial count when fixed
    pub fn fixed(self) -> Option<usize> {
        match self {
            TrialCount::Fixed(n) => Some(n),
            TrialCount::Calibrated { .. } => None,
        }
    }
}

/// Configuration of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Sampling trial count
    pub trials: TrialCount,
    /// Discarded trials before sampling; ignored for cold runs
    pub warmup_trials: usize,
    /// Cache state carried into each trial
    pub cache: CacheCondition,
    /// Bytes the polluter touches before each cold trial
    pub pollute_bytes: usize,
    /// Pin the runner thread to this CPU before the first trial
    pub pin_cpu: Option<usize>,
    /// Upper bound on time spent in calibration and in warm-up, each
    #[serde(default, with = "opt_duration_nanos")]
    pub phase_deadline: Option<Duration>,
    /// What the finished summary includes
    #[serde(default)]
    pub summary: SummaryOptions,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            trials: TrialCount::default(),
            warmup_trials: DEFAULT_WARMUP_TRIALS,
            cache: CacheCondition::Warm,
            pollute_bytes: DEFAULT_POLLUTE_BYTES,
            pin_cpu: None,
            phase_deadline: None,
            summary: SummaryOptions::default(),
        }
    }
}

impl RunConfig {
    /// Run exactly `n` sampling trials
    pub fn fixed(n: usize) -> Self {
        Self {
            trials: TrialCount::Fixed(n),
            ..Default::default()
        }
    }

    /// Set the trial count policy
    pub fn with_trials(mut self, trials: TrialCount) -> Self {
        self.trials = trials;
        self
    }

    /// Set the warm-up trial count
    pub fn with_warmup(mut self, trials: usize) -> Self {
        self.warmup_trials = trials;
        self
    }

    /// Set the cache condition
    pub fn with_cache(mut self, cache: CacheCondition) -> Self {
        self.cache = cache;
        self
    }

    /// Set the cold-trial pollution footprint
    pub fn with_pollute_bytes(mut self, bytes: usize) -> Self {
        self.pollute_bytes = bytes;
        self
    }

    /// Pin the runner thread to a CPU
    pub fn with_pin_cpu(mut self, cpu: usize) -> Self {
        self.pin_cpu = Some(cpu);
        self
    }

    /// Bound calibration and warm-up time
    pub fn with_phase_deadline(mut self, deadline: Duration) -> Self {
        self.phase_deadline = Some(deadline);
        self
    }

    /// Set summary options
    pub fn with_summary(mut self, summary: SummaryOptions) -> Self {
        self.summary = summary;
        self
    }

    /// Warm-up trials that will actually run
    pub fn effective_warmup(&self) -> usize {
        if self.cache.is_cold() {
            0
        } else {
            self.warmup_trials
        }
    }

    /// Reject configurations that could never produce a valid run
    pub fn validate(&self) -> Result<(), BenchError> {
        match self.trials {
            TrialCount::Fixed(0) => {
                return Err(BenchError::ConfigurationInvalid(
                    "trial count must be at least 1".into(),
                ));
            }
            TrialCount::Fixed(_) => {}
            TrialCount::Calibrated {
                target_time,
                min_trials,
                max_trials,
            } => {
                if target_time.is_zero() {
                    return Err(BenchError::ConfigurationInvalid(
                        "calibration target time must be positive".into(),
                    ));
                }
                if min_trials == 0 {
                    return Err(BenchError::ConfigurationInvalid(
                        "min_trials must be at least 1".into(),
                    ));
                }
                if max_trials < min_trials {
                    return Err(BenchError::ConfigurationInvalid(format!(
                        "max_trials ({max_trials}) is below min_trials ({min_trials})"
                    )));
                }
            }
        }

        if self.cache.is_cold() && self.pollute_bytes == 0 {
            return Err(BenchError::ConfigurationInvalid(
                "cold runs need a non-zero pollute_bytes".into(),
            ));
        }

        if self.phase_deadline.is_some_and(|d| d.is_zero()) {
            return Err(BenchError::ConfigurationInvalid(
                "phase deadline must be positive".into(),
            ));
        }

        Ok(())
    }
}

mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_nanos() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_nanos)
    }
}

mod opt_duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&(d.as_nanos() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(d).map(|n| n.map(Duration::from_nanos))
    }
}
