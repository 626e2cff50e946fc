//! Wake-up requests.

use super::Time;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Precision hint attached to a wake-up.
///
/// `High` asks the environment to arm its most precise (and most expensive)
/// timer for the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeUpResolution {
    /// Coarse timer is acceptable.
    #[default]
    Low,
    /// Precise timer requested.
    High,
}

/// A request to be notified at or after `time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WakeUp {
    /// Earliest instant the queue wants to be woken.
    pub time: Time,
    /// Timer precision hint.
    pub resolution: WakeUpResolution,
}

impl WakeUp {
    /// A low-resolution wake-up at `time`.
    #[must_use]
    pub const fn low(time: Time) -> Self {
        Self {
            time,
            resolution: WakeUpResolution::Low,
        }
    }

    /// A high-resolution wake-up at `time`.
    #[must_use]
    pub const fn high(time: Time) -> Self {
        Self {
            time,
            resolution: WakeUpResolution::High,
        }
    }

    /// Returns true for [`WakeUpResolution::High`].
    #[must_use]
    pub fn is_high_resolution(&self) -> bool {
        self.resolution == WakeUpResolution::High
    }
}

impl fmt::Display for WakeUp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolution {
            WakeUpResolution::Low => write!(f, "{}", self.time),
            WakeUpResolution::High => write!(f, "{} (high-res)", self.time),
        }
    }
}
