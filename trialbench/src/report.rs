//! Exported run data
//!
//! The shape handed to reporters: ordered raw samples, per-counter series,
//! and named summary fields. Rendering (tables, JSON files, plots) belongs to
//! the consumer; every type here is plain serde data.

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trialbench_core::{BenchError, CacheCondition, Clock, RunConfig, Runner, TimeUnit};
use trialbench_stats::{
    BootstrapConfig, BootstrapResult, ComparisonConfig, ComparisonResult, CounterStatistics,
    StatsError, Summary, compare_runs, compute_bootstrap, compute_counter_stats,
};

/// Run metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Benchmark name
    pub name: String,
    /// Crate version that produced the report
    pub version: String,
    /// When `run` was called
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Unit of every sample
    pub unit: TimeUnit,
    /// Cache condition of every trial
    pub cache: CacheCondition,
    /// Sampling trial count chosen by configuration or calibration
    pub trials_requested: usize,
    /// Samples actually recorded
    pub trials_realised: usize,
    /// Seed of a random dataset, for replaying the trial-to-input mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_seed: Option<u64>,
    /// Configuration the run used
    pub config: RunConfig,
}

/// Finished run, ready for a reporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Run metadata
    pub meta: ReportMeta,
    /// Elapsed value of each trial, in trial order
    pub samples: Vec<u64>,
    /// Per-trial counter values by counter name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub counters: BTreeMap<String, Vec<u64>>,
    /// Summary over `samples`
    pub summary: Summary,
    /// Summary of each counter
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub counter_stats: BTreeMap<String, CounterStatistics>,
}

impl RunReport {
    /// Export a finished runner
    ///
    /// Fails with `InvalidState` unless the runner is `Finished`.
    pub fn from_runner<I, C>(
        name: impl Into<String>,
        runner: &Runner<I, C>,
    ) -> Result<Self, BenchError>
    where
        I: Iterator,
        I::Item: Clone,
        C: Clock,
    {
        let summary = runner.summary()?.clone();
        let sequence = runner.samples();

        let (started_at, finished_at) = match (runner.started_at(), runner.finished_at()) {
            (Some(start), Some(end)) => (DateTime::<Utc>::from(start), DateTime::<Utc>::from(end)),
            _ => {
                return Err(BenchError::InvalidState {
                    state: runner.state().as_str(),
                    operation: "export",
                });
            }
        };

        let mut counters = BTreeMap::new();
        let mut counter_stats = BTreeMap::new();
        for name in sequence.counter_names() {
            let (values, elapsed) = sequence.counter_series(&name);
            counter_stats.insert(name.clone(), compute_counter_stats(&values, &elapsed));
            counters.insert(name, values);
        }

        Ok(Self {
            meta: ReportMeta {
                name: name.into(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                started_at,
                finished_at,
                unit: sequence.unit(),
                cache: runner.config().cache,
                trials_requested: runner.sampling_trials().unwrap_or(sequence.len()),
                trials_realised: sequence.len(),
                dataset_seed: None,
                config: runner.config().clone(),
            },
            samples: sequence.iter().map(|s| s.elapsed).collect(),
            counters,
            summary,
            counter_stats,
        })
    }

    /// Record the dataset seed for replay
    pub fn with_dataset_seed(mut self, seed: Option<u64>) -> Self {
        self.meta.dataset_seed = seed;
        self
    }

    /// Samples as floats, in trial order
    pub fn elapsed_values(&self) -> Vec<f64> {
        self.samples.iter().map(|&s| s as f64).collect()
    }

    /// Bootstrap confidence interval of the mean
    pub fn bootstrap_mean(&self, config: &BootstrapConfig) -> Result<BootstrapResult, StatsError> {
        compute_bootstrap(&self.elapsed_values(), config)
    }

    /// Compare this run against `baseline`
    ///
    /// Both runs must use the same time unit.
    pub fn compare_to(
        &self,
        baseline: &RunReport,
        config: &ComparisonConfig,
    ) -> anyhow::Result<ComparisonResult> {
        if self.meta.unit != baseline.meta.unit {
            bail!(
                "cannot compare {} against a baseline measured in {}",
                self.meta.unit,
                baseline.meta.unit
            );
        }
        Ok(compare_runs(
            &baseline.elapsed_values(),
            &self.elapsed_values(),
            config,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialbench_core::{CycleCounterHook, repeat};

    fn finished_runner(trials: usize) -> Runner<trialbench_core::dataset::Repeat<u64>> {
        let mut runner = Runner::new(RunConfig::fixed(trials), repeat(10u64)).unwrap();
        runner.run_infallible(|x| x * x).unwrap();
        runner
    }

    #[test]
    fn test_export_shape() {
        let runner = finished_runner(5);
        let report = RunReport::from_runner("square", &runner).unwrap();

        assert_eq!(report.meta.name, "square");
        assert_eq!(report.samples.len(), 5);
        assert_eq!(report.meta.trials_requested, 5);
        assert_eq!(report.meta.trials_realised, 5);
        assert_eq!(report.meta.unit, TimeUnit::Nanoseconds);
        assert!(report.meta.finished_at >= report.meta.started_at);
        assert_eq!(report.summary.sample_count, 5);
        assert!(report.counters.is_empty());
    }

    #[test]
    fn test_counters_exported() {
        let mut runner = Runner::new(RunConfig::fixed(8), repeat(3u64))
            .unwrap()
            .with_counter_hook(Box::new(CycleCounterHook::new()));
        runner.run_infallible(|x| x + 1).unwrap();
        let report = RunReport::from_runner("inc", &runner).unwrap();

        assert_eq!(report.counters["cycles"].len(), 8);
        assert!(report.counter_stats.contains_key("cycles"));
    }

    #[test]
    fn test_unfinished_runner_not_exported() {
        let runner = Runner::new(RunConfig::fixed(3), repeat(1u64)).unwrap();
        assert!(matches!(
            RunReport::from_runner("idle", &runner),
            Err(BenchError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_compare_against_itself() {
        let report = RunReport::from_runner("square", &finished_runner(20)).unwrap();
        let config = ComparisonConfig {
            bootstrap_iterations: 500,
            seed: Some(3),
            ..Default::default()
        };
        let result = report.compare_to(&report, &config).unwrap();

        assert_eq!(result.relative_change, 0.0);
        assert!(!result.is_significant);
    }

    #[test]
    fn test_compare_rejects_unit_mismatch() {
        let report = RunReport::from_runner("square", &finished_runner(4)).unwrap();
        let mut cycles = report.clone();
        cycles.meta.unit = TimeUnit::Cycles;
        assert!(report.compare_to(&cycles, &ComparisonConfig::default()).is_err());
    }
}
