//! Deterministic harness pieces for driving a time domain in tests.
//!
//! - [`RecordingScheduler`]: an [`UnderlyingScheduler`](crate::runtime::UnderlyingScheduler)
//!   that records every call instead of arming a real timer
//! - Virtual time lives in [`time::VirtualClock`](crate::time::VirtualClock)

pub mod recording;

pub use recording::{RecordingScheduler, SchedulerCall, SchedulerLog};
