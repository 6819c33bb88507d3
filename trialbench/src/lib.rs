#![warn(missing_docs)]
//! # Trialbench
//!
//! Measure a unit of code under controlled conditions and get decision-grade
//! statistics about its cost.
//!
//! - **Controlled trials**: every call bracketed by reordering barriers and
//!   timestamps, with its result kept alive so it cannot be optimized away
//! - **Cache conditions**: warm (steady state) or cold (eviction before every trial)
//! - **Datasets**: repeat, range, choice, uniform and normal inputs with reproducible seeds
//! - **Calibration**: trial count sized to a target measurement time
//! - **Robust statistics**: percentiles, MAD, coefficient of variation,
//!   outlier counts, z/t scores and bootstrap intervals
//! - **Counters**: optional per-trial counter hooks such as the cycle counter
//!
//! ## Quick Start
//!
//! ```no_run
//! use trialbench::prelude::*;
//!
//! let report = trialbench::bench("square", RunConfig::fixed(100), repeat(10u64), |x| x * x)?;
//! println!("median: {:.1} {}", report.summary.median, report.meta.unit);
//! # Ok::<(), trialbench::BenchError>(())
//! ```
//!
//! ## Driving the runner directly
//!
//! ```no_run
//! use trialbench::prelude::*;
//!
//! let mut runner = Runner::new(
//!     RunConfig::fixed(50).with_cache(CacheCondition::Cold),
//!     Range::new(0u64, 50, 1)?,
//! )?;
//! runner.run_infallible(|n| (0..n).sum::<u64>())?;
//! let summary = runner.summary()?;
//! assert!(summary.min <= summary.max);
//! # Ok::<(), trialbench::BenchError>(())
//! ```

mod config;
mod logging;
mod report;

pub use config::{CONFIG_FILE_NAME, DatasetConfig, RunnerConfig, StatsConfig, TrialConfig};
pub use logging::{default_directive, init_logging};
pub use report::{ReportMeta, RunReport};

// Re-export the execution engine
pub use trialbench_core::dataset;
pub use trialbench_core::{
    BenchError, BufferPolluter, CacheCondition, CachePolluter, CancellationToken, Clock,
    CounterHook, CounterValue, CpuTimeClock, CycleClock, CycleCounterHook, DatasetSource,
    HAS_CYCLE_COUNTER, NumericDataset, RunConfig, RunState, Runner, Sample, SampleSequence,
    TimeUnit, TrialCount, TrialExecutor, WallClock, WorkloadError, consume, pin_to_cpu, repeat,
    reorder_barrier,
};

// Re-export stats
pub use trialbench_stats::{
    Baseline, BootstrapConfig, BootstrapResult, ComparisonConfig, ComparisonResult,
    CounterStatistics, OutlierAnalysis, OutlierMethod, Percentiles, StatsError, Summary,
    SummaryOptions, compare_runs, compute_bootstrap, compute_counter_stats, compute_summary,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::dataset::{Choice, ChoicePolicy, Random, Range};
    pub use crate::{
        BenchError, CacheCondition, CancellationToken, RunConfig, RunReport, RunState, Runner,
        Summary, SummaryOptions, TrialConfig, TrialCount, repeat,
    };
}

/// Run `workload` once per trial over `dataset` and export the result
pub fn bench<D, T, F>(
    name: &str,
    config: RunConfig,
    dataset: D,
    workload: F,
) -> Result<RunReport, BenchError>
where
    D: IntoIterator,
    D::Item: Clone,
    F: FnMut(D::Item) -> T,
{
    let mut runner = Runner::new(config, dataset)?;
    runner.run_infallible(workload)?;
    RunReport::from_runner(name, &runner)
}

/// Like [`bench`] for a workload that can fail; the first error faults the run
pub fn try_bench<D, T, E, F>(
    name: &str,
    config: RunConfig,
    dataset: D,
    workload: F,
) -> Result<RunReport, BenchError>
where
    D: IntoIterator,
    D::Item: Clone,
    F: FnMut(D::Item) -> Result<T, E>,
    E: Into<WorkloadError>,
{
    let mut runner = Runner::new(config, dataset)?;
    runner.run(workload)?;
    RunReport::from_runner(name, &runner)
}

/// Run `workload` with the runner and dataset described by `config`
///
/// The realised dataset seed is recorded in the report so the trial-to-input
/// mapping can be replayed.
pub fn bench_configured<T, F>(
    name: &str,
    config: &TrialConfig,
    workload: F,
) -> anyhow::Result<RunReport>
where
    F: FnMut(f64) -> T,
{
    let run_config = config.to_run_config()?;
    let dataset = config.build_dataset()?;
    let seed = dataset.seed();
    tracing::debug!(name, ?seed, "configured run");

    let mut runner = Runner::new(run_config, dataset)?;
    runner.run_infallible(workload)?;
    Ok(RunReport::from_runner(name, &runner)?.with_dataset_seed(seed))
}
