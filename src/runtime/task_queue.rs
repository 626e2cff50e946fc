//! The capability a time domain needs from each registered queue.
//!
//! A [`TaskQueue`] owns its delayed work; the time domain only decides *when*
//! a queue should be looked at. Whenever a queue callback may change the
//! queue's own pending wake-up, the domain hands it a [`WakeUpRegistration`]
//! bound to that queue's heap slot, which is the only way a queue can touch
//! the shared heap.

use super::time_domain::WakeUpState;
use super::wake_up_heap::HeapHandle;
use crate::time::LazyNow;
use crate::types::{QueueId, Time, WakeUp};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Global, monotonically increasing task sequence numbers.
///
/// All queues registered with one time domain draw from the same source, so
/// sequence numbers order tasks across queues by posting order.
#[derive(Debug, Clone, Default)]
pub struct SequenceSource(Arc<AtomicU64>);

impl SequenceSource {
    /// A fresh source whose first number is 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next sequence number.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// A delayed task whose run time has arrived, tagged for cross-queue sorting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyDelayedTask<T> {
    /// When the task was scheduled to run.
    pub run_time: Time,
    /// Global posting order, used to break run-time ties.
    pub sequence_num: u64,
    /// The queue the task came from and must be dispatched back to.
    pub queue: QueueId,
    /// The task itself.
    pub task: T,
}

impl<T> ReadyDelayedTask<T> {
    /// Dispatch order key: run time, then posting order.
    #[must_use]
    pub const fn sort_key(&self) -> (Time, u64) {
        (self.run_time, self.sequence_num)
    }
}

/// Collects ready tasks from one queue, stamping each with that queue's id.
#[derive(Debug)]
pub struct ReadyTaskSink<'a, T> {
    queue: QueueId,
    tasks: &'a mut Vec<ReadyDelayedTask<T>>,
}

impl<'a, T> ReadyTaskSink<'a, T> {
    pub(crate) fn new(queue: QueueId, tasks: &'a mut Vec<ReadyDelayedTask<T>>) -> Self {
        Self { queue, tasks }
    }

    /// Adds a ready task.
    pub fn push(&mut self, run_time: Time, sequence_num: u64, task: T) {
        self.tasks.push(ReadyDelayedTask {
            run_time,
            sequence_num,
            queue: self.queue,
            task,
        });
    }

    /// The queue being collected from.
    #[must_use]
    pub const fn queue(&self) -> QueueId {
        self.queue
    }
}

/// A queue's handle on its own entry in the domain's wake-up heap.
///
/// Only lives for the duration of one callback.
pub struct WakeUpRegistration<'a> {
    queue: QueueId,
    enabled: bool,
    heap_handle: &'a mut Option<HeapHandle>,
    state: &'a mut WakeUpState,
}

impl<'a> WakeUpRegistration<'a> {
    pub(crate) fn new(
        queue: QueueId,
        enabled: bool,
        heap_handle: &'a mut Option<HeapHandle>,
        state: &'a mut WakeUpState,
    ) -> Self {
        Self {
            queue,
            enabled,
            heap_handle,
            state,
        }
    }

    /// The queue this registration belongs to.
    #[must_use]
    pub const fn queue(&self) -> QueueId {
        self.queue
    }

    /// The queue's live heap handle, if it has a pending wake-up.
    #[must_use]
    pub fn heap_handle(&self) -> Option<HeapHandle> {
        *self.heap_handle
    }

    /// The queue's currently registered wake-up.
    #[must_use]
    pub fn current_wake_up(&self) -> Option<WakeUp> {
        self.state.wake_up_for(*self.heap_handle)
    }

    /// Registers, moves or clears this queue's wake-up.
    ///
    /// See [`TimeDomain::set_next_wake_up`](super::TimeDomain::set_next_wake_up).
    pub fn set_next_wake_up(&mut self, wake_up: Option<WakeUp>, now: &mut LazyNow<'_>) {
        self.state
            .set_next_wake_up(self.queue, self.heap_handle, self.enabled, wake_up, now);
    }
}

/// Operations a time domain performs on a registered queue.
///
/// All methods are called from the domain's owning thread, one at a time.
pub trait TaskQueue {
    /// The unit of work moved between the delayed and ready stages.
    type Task;

    /// Whether the queue is currently allowed to run work.
    ///
    /// A disabled queue may not hold a pending wake-up.
    fn is_enabled(&self) -> bool;

    /// Enables or disables the queue. Called by
    /// [`TimeDomain::set_queue_enabled`](super::TimeDomain::set_queue_enabled).
    fn set_enabled(&mut self, enabled: bool);

    /// The wake-up the queue wants for its earliest delayed task, if any.
    fn next_delayed_wake_up(&self) -> Option<WakeUp>;

    /// Drops canceled tasks from the front of the delayed ordering.
    ///
    /// Returns true if anything was removed.
    fn remove_all_canceled_delayed_tasks_from_front(&mut self, now: &mut LazyNow<'_>) -> bool;

    /// The queue's wake-up time has arrived.
    ///
    /// Implementations must clear their pending wake-up through
    /// `registration`; the default does exactly that and nothing else.
    fn on_start_wake_up(&mut self, registration: &mut WakeUpRegistration<'_>, now: &mut LazyNow<'_>) {
        registration.set_next_wake_up(None, now);
    }

    /// Moves every delayed task that is due at `now` into the ready stage.
    fn move_ready_delayed_tasks_to_work_queue(&mut self, now: &mut LazyNow<'_>);

    /// Hands every delayed task that is due at `now` to `sink` instead of
    /// moving it, so the domain can interleave tasks from several queues.
    fn take_ready_delayed_tasks(&mut self, now: &mut LazyNow<'_>, sink: &mut ReadyTaskSink<'_, Self::Task>);

    /// Puts one task previously handed out by
    /// [`take_ready_delayed_tasks`](Self::take_ready_delayed_tasks) into the
    /// ready stage.
    fn move_ready_delayed_task_to_work_queue(&mut self, task: Self::Task);

    /// Recomputes and re-registers the queue's own wake-up.
    fn update_delayed_wake_up(&mut self, registration: &mut WakeUpRegistration<'_>, now: &mut LazyNow<'_>) {
        let wake_up = if self.is_enabled() {
            self.next_delayed_wake_up()
        } else {
            None
        };
        registration.set_next_wake_up(wake_up, now);
    }
}

impl<Q: TaskQueue + ?Sized> TaskQueue for Box<Q> {
    type Task = Q::Task;

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }

    fn set_enabled(&mut self, enabled: bool) {
        (**self).set_enabled(enabled);
    }

    fn next_delayed_wake_up(&self) -> Option<WakeUp> {
        (**self).next_delayed_wake_up()
    }

    fn remove_all_canceled_delayed_tasks_from_front(&mut self, now: &mut LazyNow<'_>) -> bool {
        (**self).remove_all_canceled_delayed_tasks_from_front(now)
    }

    fn on_start_wake_up(&mut self, registration: &mut WakeUpRegistration<'_>, now: &mut LazyNow<'_>) {
        (**self).on_start_wake_up(registration, now);
    }

    fn move_ready_delayed_tasks_to_work_queue(&mut self, now: &mut LazyNow<'_>) {
        (**self).move_ready_delayed_tasks_to_work_queue(now);
    }

    fn take_ready_delayed_tasks(&mut self, now: &mut LazyNow<'_>, sink: &mut ReadyTaskSink<'_, Self::Task>) {
        (**self).take_ready_delayed_tasks(now, sink);
    }

    fn move_ready_delayed_task_to_work_queue(&mut self, task: Self::Task) {
        (**self).move_ready_delayed_task_to_work_queue(task);
    }

    fn update_delayed_wake_up(&mut self, registration: &mut WakeUpRegistration<'_>, now: &mut LazyNow<'_>) {
        (**self).update_delayed_wake_up(registration, now);
    }
}
