//! Runner State Machine
//!
//! ```text
//! Idle -> [Calibrating] -> [WarmingUp] -> Sampling -> Finished
//!    \__________ any non-Idle phase __________/ -> Faulted
//! ```
//!
//! Trials run sequentially on the calling thread. Calibration and warm-up
//! trials are fed clones of the first dataset element, so the dataset cursor
//! only advances during sampling: trial `n` always receives element `n`.

use crate::cache::CachePolluter;
use crate::config::{RunConfig, TrialCount};
use crate::counters::CounterHook;
use crate::error::{BenchError, WorkloadError, WorkloadPanic};
use crate::executor::{Sample, SampleSequence, TrialExecutor};
use crate::measure::{Clock, WallClock, pin_to_cpu};
use std::cell::OnceCell;
use std::convert::Infallible;
use std::iter::Peekable;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, error, info, warn};
use trialbench_stats::{Summary, compute_summary};

/// Runner lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Configured, no trial executed
    Idle,
    /// Searching for a trial count that fills the target time
    Calibrating,
    /// Running discarded trials to reach steady state
    WarmingUp,
    /// Recording samples
    Sampling,
    /// Sample sequence complete and immutable
    Finished,
    /// Aborted by a clock fault, workload failure or cancellation
    Faulted,
}

impl RunState {
    /// Lowercase state name
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Calibrating => "calibrating",
            RunState::WarmingUp => "warming-up",
            RunState::Sampling => "sampling",
            RunState::Finished => "finished",
            RunState::Faulted => "faulted",
        }
    }

    /// Whether no further transition can happen
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Finished | RunState::Faulted)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cooperative cancellation flag, checked between trials only
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the current trial still completes
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Drives one workload over one dataset
pub struct Runner<I: Iterator, C = WallClock> {
    config: RunConfig,
    dataset: Peekable<I>,
    executor: TrialExecutor<C>,
    state: RunState,
    samples: SampleSequence,
    discarded: Vec<Sample>,
    sampling_trials: Option<usize>,
    cancel: CancellationToken,
    summary: OnceCell<Summary>,
    started_at: Option<SystemTime>,
    finished_at: Option<SystemTime>,
}

impl<I> Runner<I, WallClock>
where
    I: Iterator,
    I::Item: Clone,
{
    /// Validate `config` and take ownership of `dataset`, timing with the wall clock
    pub fn new(
        config: RunConfig,
        dataset: impl IntoIterator<IntoIter = I>,
    ) -> Result<Self, BenchError> {
        Self::with_clock(config, dataset, WallClock::new())
    }
}

impl<I, C> Runner<I, C>
where
    I: Iterator,
    I::Item: Clone,
    C: Clock,
{
    /// Validate `config` and take ownership of `dataset`, timing with `clock`
    ///
    /// Fails with `ConfigurationInvalid` when the configuration is malformed,
    /// the dataset is empty, or a fixed trial count exceeds what the dataset
    /// can supply.
    pub fn with_clock(
        config: RunConfig,
        dataset: impl IntoIterator<IntoIter = I>,
        clock: C,
    ) -> Result<Self, BenchError> {
        config.validate()?;

        let mut dataset = dataset.into_iter().peekable();
        if dataset.peek().is_none() {
            return Err(BenchError::ConfigurationInvalid("dataset is empty".into()));
        }
        if let (TrialCount::Fixed(n), (_, Some(available))) = (config.trials, dataset.size_hint())
        {
            if available < n {
                return Err(BenchError::ConfigurationInvalid(format!(
                    "dataset supplies at most {available} inputs but {n} trials were requested"
                )));
            }
        }

        let executor = TrialExecutor::new(clock, config.cache, config.pollute_bytes);
        let samples = SampleSequence::with_capacity(
            executor.unit(),
            config.trials.fixed().unwrap_or_default(),
        );

        Ok(Self {
            config,
            dataset,
            executor,
            state: RunState::Idle,
            samples,
            discarded: Vec::new(),
            sampling_trials: None,
            cancel: CancellationToken::new(),
            summary: OnceCell::new(),
            started_at: None,
            finished_at: None,
        })
    }

    /// Replace the cache polluter used for cold trials
    pub fn with_polluter(mut self, polluter: Box<dyn CachePolluter>) -> Self {
        self.executor.set_polluter(polluter);
        self
    }

    /// Attach a per-trial counter hook
    pub fn with_counter_hook(mut self, hook: Box<dyn CounterHook>) -> Self {
        self.executor.set_counter_hook(hook);
        self
    }

    /// Share a cancellation token with another thread
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this run at the next trial boundary
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run configuration
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Samples recorded so far; complete once `Finished`
    pub fn samples(&self) -> &SampleSequence {
        &self.samples
    }

    /// Samples collected before a fault, kept for diagnostics only
    pub fn discarded_samples(&self) -> &[Sample] {
        &self.discarded
    }

    /// Sampling trial count chosen by configuration or calibration
    pub fn sampling_trials(&self) -> Option<usize> {
        self.sampling_trials
    }

    /// Wall time at which `run` started
    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    /// Wall time at which the run reached a terminal state
    pub fn finished_at(&self) -> Option<SystemTime> {
        self.finished_at
    }

    /// Summary of the finished sample sequence, computed once
    pub fn summary(&self) -> Result<&Summary, BenchError> {
        if self.state != RunState::Finished {
            return Err(BenchError::InvalidState {
                state: self.state.as_str(),
                operation: "summarize",
            });
        }
        if let Some(summary) = self.summary.get() {
            return Ok(summary);
        }
        let summary = compute_summary(&self.samples.elapsed_values(), &self.config.summary)?;
        Ok(self.summary.get_or_init(|| summary))
    }

    /// Run an infallible workload to completion
    pub fn run_infallible<T, F>(&mut self, mut workload: F) -> Result<&SampleSequence, BenchError>
    where
        F: FnMut(I::Item) -> T,
    {
        self.run(|input| Ok::<T, Infallible>(workload(input)))
    }

    /// Run a fallible workload to completion
    ///
    /// Any workload error or panic, clock fault, or cancellation moves the
    /// runner to `Faulted`; samples collected up to that point are moved to
    /// [`discarded_samples`](Self::discarded_samples) and no summary is produced.
    /// A dataset that ends before a fixed trial count is reached faults the
    /// run with `ConfigurationInvalid`; a calibrated run finishes short instead.
    pub fn run<T, E, F>(&mut self, mut workload: F) -> Result<&SampleSequence, BenchError>
    where
        F: FnMut(I::Item) -> Result<T, E>,
        E: Into<WorkloadError>,
    {
        if self.state != RunState::Idle {
            return Err(BenchError::InvalidState {
                state: self.state.as_str(),
                operation: "run",
            });
        }

        self.started_at = Some(SystemTime::now());
        if let Some(cpu) = self.config.pin_cpu {
            match pin_to_cpu(cpu) {
                Ok(()) => debug!(cpu, "pinned runner thread"),
                Err(e) => warn!(cpu, error = %e, "cpu pinning failed, continuing unpinned"),
            }
        }

        match self.drive(&mut workload) {
            Ok(()) => {
                self.state = RunState::Finished;
                self.finished_at = Some(SystemTime::now());
                info!(
                    samples = self.samples.len(),
                    unit = %self.samples.unit(),
                    "run finished"
                );
                Ok(&self.samples)
            }
            Err(e) => {
                let phase = self.state;
                self.state = RunState::Faulted;
                self.finished_at = Some(SystemTime::now());
                self.discarded = self.samples.take();
                error!(
                    phase = %phase,
                    discarded = self.discarded.len(),
                    error = %e,
                    "run faulted"
                );
                Err(e)
            }
        }
    }

    fn drive<T, E, F>(&mut self, workload: &mut F) -> Result<(), BenchError>
    where
        F: FnMut(I::Item) -> Result<T, E>,
        E: Into<WorkloadError>,
    {
        let probe = self
            .dataset
            .peek()
            .cloned()
            .ok_or_else(|| BenchError::ConfigurationInvalid("dataset is empty".into()))?;

        let trials = match self.config.trials {
            TrialCount::Fixed(n) => n,
            TrialCount::Calibrated {
                target_time,
                min_trials,
                max_trials,
            } => {
                self.state = RunState::Calibrating;
                self.calibrate(&probe, workload, target_time, min_trials, max_trials)?
            }
        };
        self.sampling_trials = Some(trials);

        let warmup = self.config.effective_warmup();
        if warmup > 0 {
            self.state = RunState::WarmingUp;
            self.warm_up(&probe, workload, warmup)?;
        } else if self.config.cache.is_cold() {
            debug!("cold run, skipping warm-up");
        }
        drop(probe);

        self.state = RunState::Sampling;
        info!(trials, cache = %self.config.cache, "sampling");
        for trial in 0..trials {
            self.check_cancelled(trial)?;
            let Some(input) = self.dataset.next() else {
                if let TrialCount::Fixed(n) = self.config.trials {
                    return Err(BenchError::ConfigurationInvalid(format!(
                        "dataset ended after {trial} of {n} fixed trials"
                    )));
                }
                warn!(
                    requested = trials,
                    realised = trial,
                    "dataset exhausted before requested trial count"
                );
                break;
            };
            let sample = self.trial(trial, input, workload)?;
            self.samples.push(sample);
        }
        Ok(())
    }

    /// Double a batch of discarded trials until it fills `target` or hits
    /// `max_trials`, then size the sampling phase from the per-trial cost.
    fn calibrate<T, E, F>(
        &mut self,
        probe: &I::Item,
        workload: &mut F,
        target: Duration,
        min_trials: usize,
        max_trials: usize,
    ) -> Result<usize, BenchError>
    where
        F: FnMut(I::Item) -> Result<T, E>,
        E: Into<WorkloadError>,
    {
        let deadline = self.phase_deadline();
        let mut batch = 1usize;
        let mut executed = 0usize;

        let (batch, elapsed) = loop {
            let started = Instant::now();
            for _ in 0..batch {
                self.check_cancelled(executed)?;
                self.trial(executed, probe.clone(), workload)?;
                executed += 1;
            }
            let elapsed = started.elapsed();
            debug!(batch, elapsed_ns = elapsed.as_nanos() as u64, "calibration batch");

            if elapsed >= target || batch >= max_trials {
                break (batch, elapsed);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                debug!(batch, "calibration deadline reached");
                break (batch, elapsed);
            }
            batch = batch.saturating_mul(2).min(max_trials);
        };

        let per_trial = elapsed.as_secs_f64() / batch as f64;
        let trials = if per_trial > 0.0 {
            let estimate = target.as_secs_f64() / per_trial;
            (estimate.min(max_trials as f64) as usize).clamp(min_trials, max_trials)
        } else {
            max_trials
        };
        info!(
            trials,
            calibration_trials = executed,
            per_trial_ns = per_trial * 1e9,
            "calibrated"
        );
        Ok(trials)
    }

    fn warm_up<T, E, F>(
        &mut self,
        probe: &I::Item,
        workload: &mut F,
        trials: usize,
    ) -> Result<(), BenchError>
    where
        F: FnMut(I::Item) -> Result<T, E>,
        E: Into<WorkloadError>,
    {
        let deadline = self.phase_deadline();
        debug!(trials, "warming up");
        for trial in 0..trials {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                debug!(completed = trial, "warm-up deadline reached");
                break;
            }
            self.check_cancelled(trial)?;
            self.trial(trial, probe.clone(), workload)?;
        }
        Ok(())
    }

    #[inline]
    fn trial<T, E, F>(
        &mut self,
        index: usize,
        input: I::Item,
        workload: &mut F,
    ) -> Result<Sample, BenchError>
    where
        F: FnMut(I::Item) -> Result<T, E>,
        E: Into<WorkloadError>,
    {
        let executor = &mut self.executor;
        match catch_unwind(AssertUnwindSafe(|| executor.execute(index, input, workload))) {
            Ok(result) => result,
            Err(payload) => Err(BenchError::WorkloadFailed {
                trial: index,
                source: Box::new(WorkloadPanic::from_payload(payload)),
            }),
        }
    }

    fn check_cancelled(&self, completed: usize) -> Result<(), BenchError> {
        if self.cancel.is_cancelled() {
            Err(BenchError::Cancelled { completed })
        } else {
            Ok(())
        }
    }

    fn phase_deadline(&self) -> Option<Instant> {
        self.config.phase_deadline.map(|d| Instant::now() + d)
    }
}

impl<I: Iterator, C: std::fmt::Debug> std::fmt::Debug for Runner<I, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("executor", &self.executor)
            .field("samples", &self.samples.len())
            .finish()
    }
}
