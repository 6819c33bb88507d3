//! Per-Trial Counter Hooks
//!
//! A hook is read in the same bracket as the trial timestamps and its values
//! are stored next to the sample. Programming hardware counters is left to
//! the hook's implementor.

use crate::measure::read_cycles;
use serde::{Deserialize, Serialize};

/// One named counter reading for one trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterValue {
    /// Symbolic event name (e.g. "cycles", "cache-misses")
    pub name: String,
    /// Delta observed across the trial
    pub value: u64,
}

impl CounterValue {
    /// Create a reading
    pub fn new(name: impl Into<String>, value: u64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Externally supplied per-trial counter reader
pub trait CounterHook: Send {
    /// Called immediately before the start timestamp
    fn begin(&mut self);

    /// Called immediately after the end timestamp; returns the trial's deltas
    fn end(&mut self) -> Vec<CounterValue>;
}

/// Hook recording the hardware cycle counter as `"cycles"`
#[derive(Debug, Default)]
pub struct CycleCounterHook {
    start: u64,
}

impl CycleCounterHook {
    /// Counter name this hook reports
    pub const NAME: &'static str = "cycles";

    /// Create a hook
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterHook for CycleCounterHook {
    #[inline(always)]
    fn begin(&mut self) {
        self.start = read_cycles();
    }

    #[inline(always)]
    fn end(&mut self) -> Vec<CounterValue> {
        let delta = read_cycles().saturating_sub(self.start);
        vec![CounterValue::new(Self::NAME, delta)]
    }
}
