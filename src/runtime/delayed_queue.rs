//! A plain delayed-task queue usable with a [`TimeDomain`](super::TimeDomain).
//!
//! Delayed tasks wait in a min-heap ordered by `(run_time, sequence_num)`.
//! Once due they move into a FIFO work queue that the embedding run loop
//! pops from. Canceling a task only flags it; canceled tasks stay in the heap
//! (and can still hold the queue's wake-up) until pruned or reached.

use super::task_queue::{ReadyTaskSink, SequenceSource, TaskQueue};
use crate::time::LazyNow;
use crate::types::{Time, WakeUp, WakeUpResolution};
use std::cmp::Ordering;
use std::collections::binary_heap::PeekMut;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

/// Cancels one posted delayed task.
#[derive(Debug, Clone)]
pub struct DelayedTaskHandle {
    canceled: Arc<AtomicBool>,
}

impl DelayedTaskHandle {
    /// Marks the task canceled. It will never reach the work queue.
    pub fn cancel(&self) {
        self.canceled.store(true, AtomicOrdering::Release);
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(AtomicOrdering::Acquire)
    }
}

#[derive(Debug)]
struct DelayedTask<T> {
    run_time: Time,
    sequence_num: u64,
    resolution: WakeUpResolution,
    canceled: Arc<AtomicBool>,
    task: T,
}

impl<T> DelayedTask<T> {
    fn is_canceled(&self) -> bool {
        self.canceled.load(AtomicOrdering::Acquire)
    }
}

impl<T> PartialEq for DelayedTask<T> {
    fn eq(&self, other: &Self) -> bool {
        self.sequence_num == other.sequence_num && self.run_time == other.run_time
    }
}

impl<T> Eq for DelayedTask<T> {}

impl<T> Ord for DelayedTask<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the earliest task on top.
        other
            .run_time
            .cmp(&self.run_time)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

impl<T> PartialOrd for DelayedTask<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A task queue with delayed and immediate stages.
#[derive(Debug)]
pub struct DelayedTaskQueue<T> {
    delayed: BinaryHeap<DelayedTask<T>>,
    work_queue: VecDeque<T>,
    sequence: SequenceSource,
    enabled: bool,
}

impl<T> DelayedTaskQueue<T> {
    /// Creates an enabled, empty queue drawing sequence numbers from
    /// `sequence`.
    #[must_use]
    pub fn new(sequence: SequenceSource) -> Self {
        Self {
            delayed: BinaryHeap::new(),
            work_queue: VecDeque::new(),
            sequence,
            enabled: true,
        }
    }

    /// Posts `task` to run at `run_time`.
    ///
    /// The queue's wake-up is not updated; ask the owning domain to
    /// [`update_delayed_wake_up`](super::TimeDomain::update_delayed_wake_up).
    pub fn post_delayed(
        &mut self,
        task: T,
        run_time: Time,
        resolution: WakeUpResolution,
    ) -> DelayedTaskHandle {
        let canceled = Arc::new(AtomicBool::new(false));
        self.delayed.push(DelayedTask {
            run_time,
            sequence_num: self.sequence.next(),
            resolution,
            canceled: Arc::clone(&canceled),
            task,
        });
        DelayedTaskHandle { canceled }
    }

    /// Appends `task` straight to the work queue.
    pub fn post(&mut self, task: T) {
        self.work_queue.push_back(task);
    }

    /// Number of delayed tasks, canceled ones included.
    #[must_use]
    pub fn delayed_len(&self) -> usize {
        self.delayed.len()
    }

    /// Number of tasks ready to run.
    #[must_use]
    pub fn work_len(&self) -> usize {
        self.work_queue.len()
    }

    /// Run time of the earliest delayed task, canceled or not.
    #[must_use]
    pub fn next_run_time(&self) -> Option<Time> {
        self.delayed.peek().map(|front| front.run_time)
    }

    /// Pops the oldest ready task.
    pub fn pop_work(&mut self) -> Option<T> {
        self.work_queue.pop_front()
    }

    /// Drains every ready task in order.
    pub fn take_work(&mut self) -> Vec<T> {
        self.work_queue.drain(..).collect()
    }

    /// Ready tasks in order, without removing them.
    #[must_use]
    pub fn ready_tasks(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.work_queue.iter().cloned().collect()
    }

    fn pop_due(&mut self, now: &mut LazyNow<'_>) -> Option<DelayedTask<T>> {
        let front = self.delayed.peek_mut()?;
        if front.run_time > now.now() {
            return None;
        }
        Some(PeekMut::pop(front))
    }
}

impl<T> TaskQueue for DelayedTaskQueue<T> {
    type Task = T;

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn next_delayed_wake_up(&self) -> Option<WakeUp> {
        self.delayed.peek().map(|front| WakeUp {
            time: front.run_time,
            resolution: front.resolution,
        })
    }

    fn remove_all_canceled_delayed_tasks_from_front(&mut self, _now: &mut LazyNow<'_>) -> bool {
        let mut removed = false;
        while let Some(front) = self.delayed.peek_mut() {
            if !front.is_canceled() {
                break;
            }
            PeekMut::pop(front);
            removed = true;
        }
        removed
    }

    fn move_ready_delayed_tasks_to_work_queue(&mut self, now: &mut LazyNow<'_>) {
        while let Some(due) = self.pop_due(now) {
            if !due.is_canceled() {
                self.work_queue.push_back(due.task);
            }
        }
    }

    fn take_ready_delayed_tasks(&mut self, now: &mut LazyNow<'_>, sink: &mut ReadyTaskSink<'_, T>) {
        while let Some(due) = self.pop_due(now) {
            if !due.is_canceled() {
                sink.push(due.run_time, due.sequence_num, due.task);
            }
        }
    }

    fn move_ready_delayed_task_to_work_queue(&mut self, task: T) {
        self.work_queue.push_back(task);
    }
}
