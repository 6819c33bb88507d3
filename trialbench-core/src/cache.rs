//! Cache Conditions
//!
//! `Warm` keeps whatever cache state the previous trial left behind.
//! `Cold` evicts the working set before every trial by streaming through a
//! buffer larger than the last-level cache.

use crate::barrier::consume;
use serde::{Deserialize, Serialize};

/// Size of one cache line touched by [`BufferPolluter`]
pub const CACHE_LINE_BYTES: usize = 64;

/// Default pollution footprint (32 MiB, larger than common LLCs)
pub const DEFAULT_POLLUTE_BYTES: usize = 32 * 1024 * 1024;

/// Cache state carried into each trial; fixed for a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheCondition {
    /// Steady state: cache effects persist between trials
    #[default]
    Warm,
    /// Forced eviction before every trial
    Cold,
}

impl CacheCondition {
    /// Whether the executor must pollute before each trial
    pub fn is_cold(self) -> bool {
        self == CacheCondition::Cold
    }
}

impl std::fmt::Display for CacheCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheCondition::Warm => write!(f, "warm"),
            CacheCondition::Cold => write!(f, "cold"),
        }
    }
}

/// Evicts caches ahead of a cold trial
pub trait CachePolluter: Send {
    /// Touch at least `bytes` of memory unrelated to the workload
    fn pollute(&mut self, bytes: usize);
}

/// Polluter that reads and writes one byte per cache line of a private buffer
///
/// The buffer is allocated lazily on first use and reused afterwards, so
/// allocation cost never lands inside a trial.
#[derive(Debug, Default)]
pub struct BufferPolluter {
    buffer: Vec<u8>,
    pass: u8,
}

impl BufferPolluter {
    /// Create an empty polluter
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently held
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

impl CachePolluter for BufferPolluter {
    fn pollute(&mut self, bytes: usize) {
        if self.buffer.len() < bytes {
            self.buffer.resize(bytes, 0);
        }
        self.pass = self.pass.wrapping_add(1);

        let mut acc = 0u8;
        for line in self.buffer[..bytes].chunks_mut(CACHE_LINE_BYTES) {
            line[0] = line[0].wrapping_add(self.pass);
            acc ^= line[0];
        }
        consume(acc);
    }
}
