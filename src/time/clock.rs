//! Monotonic time sources.
//!
//! The time domain never reads the OS clock directly; it asks a
//! [`TimeSource`]. Production code uses [`WallClock`], tests use
//! [`VirtualClock`] so that every deadline decision is reproducible.

use crate::types::Time;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of monotonic timestamps.
pub trait TimeSource: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Time;
}

/// Wall clock backed by [`std::time::Instant`].
///
/// The epoch is the instant the clock was created.
#[derive(Debug)]
pub struct WallClock {
    epoch: std::time::Instant,
}

impl WallClock {
    /// Creates a wall clock whose epoch is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: std::time::Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for WallClock {
    fn now(&self) -> Time {
        let nanos = self.epoch.elapsed().as_nanos();
        Time::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

/// Manually driven clock for lab tests.
///
/// Time only moves when told to. Every [`TimeSource::now`] call is counted so
/// tests can check how many clock reads a scheduling pass performed.
///
/// # Example
///
/// ```
/// use timedomain::time::{TimeSource, VirtualClock};
/// use timedomain::types::Time;
///
/// let clock = VirtualClock::new();
/// clock.advance(1_000_000);
/// assert_eq!(clock.now(), Time::from_millis(1));
/// assert_eq!(clock.reads(), 1);
/// ```
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: AtomicU64,
    reads: AtomicU64,
}

impl VirtualClock {
    /// Creates a virtual clock at [`Time::ZERO`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a virtual clock at `time`.
    #[must_use]
    pub fn starting_at(time: Time) -> Self {
        Self {
            now: AtomicU64::new(time.as_nanos()),
            reads: AtomicU64::new(0),
        }
    }

    /// Moves time forward by `nanos`.
    pub fn advance(&self, nanos: u64) {
        self.now.fetch_add(nanos, Ordering::Release);
    }

    /// Moves time forward to `time`. No-op if `time` is in the past.
    pub fn advance_to(&self, time: Time) {
        self.now.fetch_max(time.as_nanos(), Ordering::AcqRel);
    }

    /// Sets the current time unconditionally.
    pub fn set(&self, time: Time) {
        self.now.store(time.as_nanos(), Ordering::Release);
    }

    /// Number of times [`TimeSource::now`] has been called.
    #[must_use]
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Acquire)
    }

    /// Resets the read counter.
    pub fn reset_reads(&self) {
        self.reads.store(0, Ordering::Release);
    }
}

impl TimeSource for VirtualClock {
    fn now(&self) -> Time {
        self.reads.fetch_add(1, Ordering::AcqRel);
        Time::from_nanos(self.now.load(Ordering::Acquire))
    }
}
