//! Deferred, at-most-once clock reads.
//!
//! A scheduling pass (one drain, one registration, one prune) threads a single
//! [`LazyNow`] through every decision it makes. The first decision that
//! actually needs the time reads the clock; every later decision in the same
//! pass reuses that reading, so the whole pass observes one logical instant
//! and no pass pays for more than one clock read.

use super::TimeSource;
use crate::types::Time;
use core::fmt;

/// A clock reading taken lazily and cached for the rest of a pass.
pub struct LazyNow<'a> {
    clock: Option<&'a dyn TimeSource>,
    now: Option<Time>,
}

impl<'a> LazyNow<'a> {
    /// A snapshot that will read `clock` the first time it is asked.
    #[must_use]
    pub fn new(clock: &'a dyn TimeSource) -> Self {
        Self {
            clock: Some(clock),
            now: None,
        }
    }

    /// A snapshot pinned to an already known instant. Never reads a clock.
    #[must_use]
    pub const fn at(now: Time) -> Self {
        Self {
            clock: None,
            now: Some(now),
        }
    }

    /// Returns the cached instant, reading the clock on first use.
    pub fn now(&mut self) -> Time {
        if let Some(now) = self.now {
            return now;
        }
        let now = self.clock.map_or(Time::ZERO, TimeSource::now);
        self.now = Some(now);
        now
    }

    /// Returns true once the instant has been captured.
    #[must_use]
    pub const fn is_captured(&self) -> bool {
        self.now.is_some()
    }
}

impl fmt::Debug for LazyNow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyNow")
            .field("now", &self.now)
            .field("has_clock", &self.clock.is_some())
            .finish()
    }
}
