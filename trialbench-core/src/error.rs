//! Run Errors

use thiserror::Error;
use trialbench_stats::StatsError;

/// Boxed error returned by a fallible workload
pub type WorkloadError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while configuring or driving a run
///
/// Clock and workload faults are always fatal to the run in progress.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Rejected before any trial executes
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),

    /// A trial observed its end timestamp before its start timestamp
    #[error("clock went backwards in trial {trial}: start={start}, end={end}")]
    ClockNonMonotonic {
        /// Zero-based trial index within the sampling phase
        trial: usize,
        /// Start reading
        start: u64,
        /// End reading
        end: u64,
    },

    /// The benchmarked workload returned an error or panicked
    #[error("workload failed in trial {trial}: {source}")]
    WorkloadFailed {
        /// Zero-based trial index within the phase that failed
        trial: usize,
        /// Underlying failure
        #[source]
        source: WorkloadError,
    },

    /// A statistics call was made outside its domain
    #[error("statistics domain error: {0}")]
    StatisticsDomain(#[from] StatsError),

    /// The run was cancelled between trials
    #[error("run cancelled after {completed} trials")]
    Cancelled {
        /// Trials completed before the cancellation was observed
        completed: usize,
    },

    /// Operation not valid in the runner's current state
    #[error("cannot {operation} while runner is {state}")]
    InvalidState {
        /// State the runner was in
        state: &'static str,
        /// Attempted operation
        operation: &'static str,
    },
}

impl BenchError {
    /// Whether the error is a timing, workload or cancellation fault of a running trial
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BenchError::ClockNonMonotonic { .. }
                | BenchError::WorkloadFailed { .. }
                | BenchError::Cancelled { .. }
        )
    }
}

/// Message carried by a workload panic
#[derive(Debug, Error)]
#[error("workload panicked: {0}")]
pub struct WorkloadPanic(pub String);

impl WorkloadPanic {
    pub(crate) fn from_payload(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        WorkloadPanic(message)
    }
}
