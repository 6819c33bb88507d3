//! Trial Executor
//!
//! Runs the workload exactly once per call inside a fixed bracket:
//!
//! ```text
//! [pollute if cold] -> counters.begin -> barrier -> t0 -> workload -> consume -> t1 -> barrier -> counters.end
//! ```
//!
//! The bracket never yields to a scheduler and never allocates between the
//! two timestamps.

use crate::barrier::{consume, reorder_barrier};
use crate::cache::{BufferPolluter, CacheCondition, CachePolluter};
use crate::counters::{CounterHook, CounterValue};
use crate::error::{BenchError, WorkloadError};
use crate::measure::{Clock, TimeUnit};
use serde::{Deserialize, Serialize};

/// One trial's measurement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// `end - start` in the clock's unit
    pub elapsed: u64,
    /// Counter readings taken in the same bracket
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub counters: Vec<CounterValue>,
}

impl Sample {
    /// Reading for counter `name`, if the hook reported it
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.counters.iter().find(|c| c.name == name).map(|c| c.value)
    }
}

/// Append-only sequence of samples in trial order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSequence {
    unit: TimeUnit,
    samples: Vec<Sample>,
}

impl SampleSequence {
    /// Empty sequence measured in `unit`
    pub fn new(unit: TimeUnit) -> Self {
        Self {
            unit,
            samples: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(unit: TimeUnit, capacity: usize) -> Self {
        Self {
            unit,
            samples: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub(crate) fn take(&mut self) -> Vec<Sample> {
        std::mem::take(&mut self.samples)
    }

    /// Unit of every `elapsed` value
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample was recorded
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in trial order
    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    /// Iterate in trial order
    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Elapsed values as floats, ready for the statistics engine
    pub fn elapsed_values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.elapsed as f64).collect()
    }

    /// Distinct counter names in first-seen order
    pub fn counter_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for counter in self.samples.iter().flat_map(|s| &s.counters) {
            if !names.contains(&counter.name) {
                names.push(counter.name.clone());
            }
        }
        names
    }

    /// Per-trial values for counter `name`, with the matching elapsed values
    pub fn counter_series(&self, name: &str) -> (Vec<u64>, Vec<f64>) {
        self.samples
            .iter()
            .filter_map(|s| s.counter(name).map(|v| (v, s.elapsed as f64)))
            .unzip()
    }
}

impl<'a> IntoIterator for &'a SampleSequence {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Executes single trials under one cache condition
pub struct TrialExecutor<C> {
    clock: C,
    cache: CacheCondition,
    pollute_bytes: usize,
    polluter: Box<dyn CachePolluter>,
    counters: Option<Box<dyn CounterHook>>,
}

impl<C: Clock> TrialExecutor<C> {
    /// Executor using a [`BufferPolluter`] for cold trials
    pub fn new(clock: C, cache: CacheCondition, pollute_bytes: usize) -> Self {
        Self {
            clock,
            cache,
            pollute_bytes,
            polluter: Box::new(BufferPolluter::new()),
            counters: None,
        }
    }

    /// Replace the cache polluter
    pub fn with_polluter(mut self, polluter: Box<dyn CachePolluter>) -> Self {
        self.polluter = polluter;
        self
    }

    /// Attach a per-trial counter hook
    pub fn with_counter_hook(mut self, hook: Box<dyn CounterHook>) -> Self {
        self.counters = Some(hook);
        self
    }

    pub(crate) fn set_polluter(&mut self, polluter: Box<dyn CachePolluter>) {
        self.polluter = polluter;
    }

    pub(crate) fn set_counter_hook(&mut self, hook: Box<dyn CounterHook>) {
        self.counters = Some(hook);
    }

    /// The clock bounding each trial
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Unit of produced samples
    pub fn unit(&self) -> TimeUnit {
        self.clock.unit()
    }

    /// Cache condition applied to every trial
    pub fn cache(&self) -> CacheCondition {
        self.cache
    }

    /// Run `workload` once on `input` and measure it
    ///
    /// `trial` only labels errors. A workload error yields no sample.
    #[inline]
    pub fn execute<I, T, E, F>(
        &mut self,
        trial: usize,
        input: I,
        workload: &mut F,
    ) -> Result<Sample, BenchError>
    where
        F: FnMut(I) -> Result<T, E>,
        E: Into<WorkloadError>,
    {
        if self.cache.is_cold() {
            self.polluter.pollute(self.pollute_bytes);
        }
        if let Some(hook) = self.counters.as_mut() {
            hook.begin();
        }

        reorder_barrier();
        let start = self.clock.now();
        let result = workload(input);
        consume(&result);
        let end = self.clock.now();
        reorder_barrier();

        let counters = match self.counters.as_mut() {
            Some(hook) => hook.end(),
            None => Vec::new(),
        };

        if let Err(e) = result {
            return Err(BenchError::WorkloadFailed {
                trial,
                source: e.into(),
            });
        }
        if end < start {
            return Err(BenchError::ClockNonMonotonic { trial, start, end });
        }

        Ok(Sample {
            elapsed: end - start,
            counters,
        })
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for TrialExecutor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrialExecutor")
            .field("clock", &self.clock)
            .field("cache", &self.cache)
            .field("pollute_bytes", &self.pollute_bytes)
            .field("counters", &self.counters.is_some())
            .finish()
    }
}
