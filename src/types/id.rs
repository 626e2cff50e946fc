//! Identifier and timestamp types.
//!
//! [`QueueId`] names a queue registered with one time domain and records which
//! domain that is, so a queue handed to the wrong domain is caught at the API
//! boundary. [`Time`] is the monotonic timestamp every wake-up is keyed by.

use crate::util::ArenaIndex;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::ops::Add;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static NEXT_DOMAIN_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a time domain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainId(u64);

impl DomainId {
    /// Allocates a fresh domain identity.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_DOMAIN_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomainId({})", self.0)
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.0)
    }
}

/// Identifier of a task queue registered with a time domain.
///
/// Stays valid until the queue is unregistered; after that the slot's
/// generation moves on and the id no longer resolves.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueId {
    domain: DomainId,
    slot: ArenaIndex,
}

impl QueueId {
    pub(crate) const fn new(domain: DomainId, slot: ArenaIndex) -> Self {
        Self { domain, slot }
    }

    /// The time domain this queue is registered with.
    #[must_use]
    pub const fn time_domain(self) -> DomainId {
        self.domain
    }

    pub(crate) const fn slot(self) -> ArenaIndex {
        self.slot
    }
}

impl fmt::Debug for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QueueId({}/{}:{})",
            self.domain,
            self.slot.index(),
            self.slot.generation()
        )
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.slot.index())
    }
}

/// A monotonic timestamp in nanoseconds since an arbitrary epoch.
///
/// In production this is derived from a [`WallClock`](crate::time::WallClock);
/// under test it is whatever a [`VirtualClock`](crate::time::VirtualClock) says.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Time(u64);

impl Time {
    /// The epoch.
    pub const ZERO: Self = Self(0);

    /// The latest representable instant. Used as the "no wake-up" deadline.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates a time from nanoseconds since the epoch.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Creates a time from milliseconds since the epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    /// Creates a time from seconds since the epoch.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1_000_000_000))
    }

    /// Nanoseconds since the epoch.
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Milliseconds since the epoch (truncated).
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0 / 1_000_000
    }

    /// Adds nanoseconds, saturating at [`Time::MAX`].
    #[must_use]
    pub const fn saturating_add_nanos(self, nanos: u64) -> Self {
        Self(self.0.saturating_add(nanos))
    }

    /// Nanoseconds elapsed since `earlier`, or 0 if `earlier` is later.
    #[must_use]
    pub const fn duration_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Signed distance `self - earlier` in fractional milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn millis_since_f64(self, earlier: Self) -> f64 {
        if self >= earlier {
            (self.0 - earlier.0) as f64 / 1_000_000.0
        } else {
            -((earlier.0 - self.0) as f64 / 1_000_000.0)
        }
    }
}

impl Add<Duration> for Time {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add_nanos(u64::try_from(rhs.as_nanos()).unwrap_or(u64::MAX))
    }
}

impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Time({}ns)", self.0)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::MAX {
            f.write_str("never")
        } else if self.0 >= 1_000_000_000 {
            write!(
                f,
                "{}.{:03}s",
                self.0 / 1_000_000_000,
                (self.0 / 1_000_000) % 1000
            )
        } else if self.0 >= 1_000_000 {
            write!(f, "{}ms", self.0 / 1_000_000)
        } else if self.0 >= 1_000 {
            write!(f, "{}us", self.0 / 1_000)
        } else {
            write!(f, "{}ns", self.0)
        }
    }
}
