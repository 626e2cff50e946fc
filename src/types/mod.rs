//! Core types: identifiers, timestamps, wake-up requests.

pub mod id;
pub mod wake_up;

pub use id::{DomainId, QueueId, Time};
pub use wake_up::{WakeUp, WakeUpResolution};
