//! Timedomain: delayed wake-up scheduling across many task queues sharing one clock.
//!
//! # Overview
//!
//! Each registered task queue may hold at most one pending "wake me at T"
//! request. A [`TimeDomain`] keeps those requests in a mutable min-heap with
//! stable handles, always knows which queue is due first, and tells an
//! external [`UnderlyingScheduler`] when it next needs to run: now, or at a
//! specific deadline. When that moment arrives the domain drains every due
//! queue, dispatching delayed tasks across queues in run-time order with
//! ties broken by posting order.
//!
//! # Core Guarantees
//!
//! - **O(1) earliest deadline**: the heap minimum drives every scheduler decision
//! - **Stable handles**: a queue moves its wake-up in place; erased handles go stale and are detected
//! - **One clock read per pass**: every decision in a pass shares one [`time::LazyNow`] instant
//! - **Deterministic drains**: equal run times dispatch in global posting order
//! - **Single writer**: the domain is bound to its owner thread; misuse panics in debug builds
//!
//! # Module Structure
//!
//! - [`types`]: identifiers, timestamps, wake-up requests
//! - [`time`]: clock sources and the lazy clock snapshot
//! - [`runtime`]: wake-up heap, time domain, task queue contract, config
//! - [`lab`]: recording scheduler for deterministic tests
//! - [`util`]: generation-checked arena
//! - [`error`]: configuration errors
//! - [`tracing_compat`]: logging macros that compile away without `tracing-integration`

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

pub mod error;
pub mod lab;
pub mod runtime;
pub mod time;
pub mod tracing_compat;
pub mod types;
pub mod util;

#[cfg(test)]
mod test_utils;

pub use error::{ConfigError, ConfigResult};
pub use runtime::{
    DelayedTaskHandle, DelayedTaskQueue, HeapHandle, TaskQueue, TimeDomain, TimeDomainConfig,
    TimeDomainSnapshot, UnderlyingScheduler, WakeUpHeap,
};
pub use time::{LazyNow, TimeSource, VirtualClock, WallClock};
pub use types::{DomainId, QueueId, Time, WakeUp, WakeUpResolution};
