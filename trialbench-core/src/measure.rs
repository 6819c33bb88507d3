//! High-Precision Timing
//!
//! Clock sources that bound each trial. Uses RDTSCP on x86_64 and
//! CNTVCT_EL0 on AArch64 for the cycle clock, the monotonic
//! `std::time::Instant` for wall time, and the per-thread CPU-time clock
//! where the OS provides one.

use serde::{Deserialize, Serialize};
use std::time::Instant;

// ─── Inline cycle counter helpers ────────────────────────────────────────────

/// Read the CPU cycle/tick counter (platform-specific).
#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub fn read_cycles() -> u64 {
    // SAFETY: RDTSCP is available on all x86_64 CPUs since ~2006 and waits
    // for all prior instructions to complete before reading the counter.
    unsafe {
        let mut _aux: u32 = 0;
        std::arch::x86_64::__rdtscp(&mut _aux)
    }
}

/// Read the virtual counter timer on AArch64 (comparable to x86 TSC).
#[cfg(target_arch = "aarch64")]
#[inline(always)]
pub fn read_cycles() -> u64 {
    let cnt: u64;
    // SAFETY: CNTVCT_EL0 is readable from EL0 on all AArch64 implementations.
    unsafe {
        std::arch::asm!("mrs {}, cntvct_el0", out(reg) cnt, options(nostack, nomem));
    }
    cnt
}

/// No cycle counter on this target; always 0.
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline(always)]
pub fn read_cycles() -> u64 {
    0
}

/// Whether this platform provides real cycle counters.
pub const HAS_CYCLE_COUNTER: bool = cfg!(target_arch = "x86_64") || cfg!(target_arch = "aarch64");

// ─── Clock ───────────────────────────────────────────────────────────────────

/// Unit of the values a [`Clock`] returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Nanoseconds
    Nanoseconds,
    /// Raw counter ticks
    Cycles,
}

impl TimeUnit {
    /// Short suffix used in reports
    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Cycles => "cycles",
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

/// A monotonic time source
///
/// Two consecutive `now` readings on the same thread must never decrease.
/// A violation is reported by the trial executor as a measurement fault.
pub trait Clock {
    /// Current reading
    fn now(&self) -> u64;

    /// Unit of every reading
    fn unit(&self) -> TimeUnit;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline(always)]
    fn now(&self) -> u64 {
        (**self).now()
    }

    fn unit(&self) -> TimeUnit {
        (**self).unit()
    }
}

/// Monotonic wall clock, nanoseconds since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    /// Start a new clock at zero
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    #[inline(always)]
    fn now(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn unit(&self) -> TimeUnit {
        TimeUnit::Nanoseconds
    }
}

/// Hardware cycle counter
///
/// Only meaningful when [`HAS_CYCLE_COUNTER`] is true. Pin the thread with
/// [`pin_to_cpu`] to avoid mixing counters from different cores.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleClock;

impl Clock for CycleClock {
    #[inline(always)]
    fn now(&self) -> u64 {
        read_cycles()
    }

    fn unit(&self) -> TimeUnit {
        TimeUnit::Cycles
    }
}

/// CPU time consumed by the calling thread, in nanoseconds
///
/// Excludes time the thread spent descheduled. The per-thread CPU clock is
/// probed once at construction; where the OS does not provide one, every
/// reading comes from a wall clock instead so a trial never pairs readings
/// from two different sources.
#[derive(Debug, Clone, Copy)]
pub struct CpuTimeClock {
    fallback: WallClock,
    thread_clock: bool,
}

impl CpuTimeClock {
    /// Create a CPU-time clock for the calling thread
    pub fn new() -> Self {
        Self {
            fallback: WallClock::new(),
            thread_clock: thread_cpu_time().is_some(),
        }
    }

    /// Whether readings come from the per-thread CPU clock
    pub fn is_thread_cpu_time(&self) -> bool {
        self.thread_clock
    }
}

impl Default for CpuTimeClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
fn thread_cpu_time() -> Option<u64> {
    // SAFETY: timespec is plain old data and `ts` is valid for writes.
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_THREAD_CPUTIME_ID, &mut ts) };
    if rc != 0 {
        return None;
    }
    Some(
        (ts.tv_sec as u64)
            .saturating_mul(1_000_000_000)
            .saturating_add(ts.tv_nsec as u64),
    )
}

#[cfg(not(unix))]
fn thread_cpu_time() -> Option<u64> {
    None
}

impl Clock for CpuTimeClock {
    #[inline(always)]
    fn now(&self) -> u64 {
        if self.thread_clock {
            // The clock id was accepted by the probe; reads of a valid id do not fail.
            if let Some(t) = thread_cpu_time() {
                return t;
            }
        }
        self.fallback.now()
    }

    fn unit(&self) -> TimeUnit {
        TimeUnit::Nanoseconds
    }
}

/// Set CPU affinity to pin the current thread to a specific core
///
/// This improves counter stability by avoiding core migrations.
#[cfg(target_os = "linux")]
pub fn pin_to_cpu(cpu: usize) -> Result<(), std::io::Error> {
    use std::mem::MaybeUninit;

    if cpu >= libc::CPU_SETSIZE as usize {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("cpu index {cpu} exceeds CPU_SETSIZE"),
        ));
    }

    unsafe {
        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();

        libc::CPU_ZERO(set_ref);
        libc::CPU_SET(cpu, set_ref);

        let result = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref);

        if result == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

/// CPU pinning is not supported on this platform
#[cfg(not(target_os = "linux"))]
pub fn pin_to_cpu(_cpu: usize) -> Result<(), std::io::Error> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "cpu pinning is only supported on linux",
    ))
}
