#![warn(missing_docs)]
//! Trialbench Core - Execution Engine
//!
//! This crate runs a workload repeatedly under controlled conditions:
//! - [`Runner`] state machine: calibration, warm-up, sampling
//! - [`TrialExecutor`] bracketing each call with barriers and timestamps
//! - Warm and cold cache conditions with a pluggable [`CachePolluter`]
//! - Dataset providers with reproducible seeding
//! - Wall, CPU-time and cycle clocks (RDTSCP / CNTVCT_EL0)
//! - CPU affinity pinning for stable counter readings

mod barrier;
mod cache;
mod config;
mod counters;
pub mod dataset;
mod error;
mod executor;
mod measure;
mod runner;

pub use barrier::{consume, reorder_barrier};
pub use cache::{
    BufferPolluter, CACHE_LINE_BYTES, CacheCondition, CachePolluter, DEFAULT_POLLUTE_BYTES,
};
pub use config::{
    DEFAULT_MAX_TRIALS, DEFAULT_MIN_TRIALS, DEFAULT_TARGET_TIME, DEFAULT_WARMUP_TRIALS, RunConfig,
    TrialCount,
};
pub use counters::{CounterHook, CounterValue, CycleCounterHook};
pub use dataset::{DatasetSource, NumericDataset, repeat};
pub use error::{BenchError, WorkloadError, WorkloadPanic};
pub use executor::{Sample, SampleSequence, TrialExecutor};
/// Whether this platform provides hardware cycle counters (x86_64 RDTSCP or AArch64 CNTVCT_EL0).
/// When `false`, [`CycleClock`] always reads 0 and only wall or CPU time is meaningful.
pub use measure::HAS_CYCLE_COUNTER;
pub use measure::{Clock, CpuTimeClock, CycleClock, TimeUnit, WallClock, pin_to_cpu, read_cycles};
pub use runner::{CancellationToken, RunState, Runner};
