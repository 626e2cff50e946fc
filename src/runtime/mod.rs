//! Wake-up scheduling across task queues.
//!
//! # Components
//!
//! - [`WakeUpHeap`]: mutable min-heap of pending wake-ups with stable handles
//! - [`TimeDomain`]: owns the heap and the registered queues, and drives the
//!   [`UnderlyingScheduler`]
//! - [`TaskQueue`]: what the domain needs from each queue
//! - [`DelayedTaskQueue`]: a ready-to-use queue implementation
//! - [`TimeDomainConfig`]: construction settings with environment overrides

pub mod affinity;
pub mod config;
pub mod delayed_queue;
pub mod env_config;
pub mod scheduler;
pub mod snapshot;
pub mod task_queue;
pub mod time_domain;
pub mod wake_up_heap;

pub use affinity::ThreadAffinity;
pub use config::TimeDomainConfig;
pub use delayed_queue::{DelayedTaskHandle, DelayedTaskQueue};
pub use scheduler::UnderlyingScheduler;
pub use snapshot::TimeDomainSnapshot;
pub use task_queue::{
    ReadyDelayedTask, ReadyTaskSink, SequenceSource, TaskQueue, WakeUpRegistration,
};
pub use time_domain::TimeDomain;
pub use wake_up_heap::{HeapEntry, HeapHandle, WakeUpHeap};
