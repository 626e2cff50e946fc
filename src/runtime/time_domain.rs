//! The time domain: one shared notion of "next relevant time" across queues.
//!
//! A [`TimeDomain`] owns a set of registered [`TaskQueue`]s and a
//! [`WakeUpHeap`] holding at most one pending wake-up per queue. It keeps the
//! [`UnderlyingScheduler`] informed of the earliest deadline and, when that
//! deadline arrives, drains every due queue in a deterministic cross-queue
//! order.
//!
//! # Single writer
//!
//! All methods must be invoked from the run loop that owns the domain. The
//! owner thread is bound by [`TimeDomain::on_register`]; in debug builds
//! every mutating call from another thread panics.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use timedomain::lab::RecordingScheduler;
//! use timedomain::runtime::{DelayedTaskQueue, TimeDomain, TimeDomainConfig};
//! use timedomain::time::{LazyNow, TimeSource, VirtualClock};
//! use timedomain::types::{Time, WakeUpResolution};
//!
//! let clock = Arc::new(VirtualClock::new());
//! let source: Arc<dyn TimeSource> = clock.clone();
//! let mut domain = TimeDomain::new(&TimeDomainConfig::default(), source);
//! let (scheduler, log) = RecordingScheduler::new();
//! domain.on_register(scheduler);
//!
//! let mut queue = DelayedTaskQueue::new(domain.sequence_source());
//! queue.post_delayed("tick", Time::from_millis(10), WakeUpResolution::Low);
//! let id = domain.register_queue(queue);
//!
//! let mut now = LazyNow::at(Time::ZERO);
//! domain.update_delayed_wake_up(id, &mut now);
//! assert_eq!(log.last_deadline(), Some(Time::from_millis(10)));
//!
//! clock.set(Time::from_millis(10));
//! let mut now = LazyNow::at(Time::from_millis(10));
//! domain.move_ready_delayed_tasks_to_work_queues(&mut now);
//! assert_eq!(domain.queue(id).map(|q| q.ready_tasks()), Some(vec!["tick"]));
//! ```

use super::affinity::ThreadAffinity;
use super::config::TimeDomainConfig;
use super::scheduler::UnderlyingScheduler;
use super::snapshot::TimeDomainSnapshot;
use super::task_queue::{
    ReadyDelayedTask, ReadyTaskSink, SequenceSource, TaskQueue, WakeUpRegistration,
};
use super::wake_up_heap::{HeapEntry, HeapHandle, WakeUpHeap};
use crate::time::{LazyNow, TimeSource};
use crate::tracing_compat::{debug, debug_span, trace, warn};
use crate::types::{DomainId, QueueId, Time, WakeUp, WakeUpResolution};
use crate::util::Arena;
use smallvec::SmallVec;
use std::sync::Arc;

/// Heap, high-resolution counter and scheduler: everything a wake-up change
/// touches. Kept apart from the queue slots so a queue callback can hold a
/// [`WakeUpRegistration`] while the queue itself is mutably borrowed.
pub(crate) struct WakeUpState {
    heap: WakeUpHeap,
    pending_high_res_count: usize,
    scheduler: Option<Box<dyn UnderlyingScheduler>>,
}

impl WakeUpState {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: WakeUpHeap::with_capacity(capacity),
            pending_high_res_count: 0,
            scheduler: None,
        }
    }

    pub(crate) fn wake_up_for(&self, heap_handle: Option<HeapHandle>) -> Option<WakeUp> {
        heap_handle
            .and_then(|handle| self.heap.get(handle))
            .map(|entry| entry.wake_up)
    }

    #[track_caller]
    pub(crate) fn set_next_wake_up(
        &mut self,
        queue: QueueId,
        heap_handle: &mut Option<HeapHandle>,
        queue_enabled: bool,
        wake_up: Option<WakeUp>,
        now: &mut LazyNow<'_>,
    ) {
        debug_assert!(
            queue_enabled || wake_up.is_none(),
            "wake-up requested for disabled queue {queue}"
        );

        let previous_min = self.heap.peek_min().map(|entry| entry.wake_up.time);
        let previous_resolution = heap_handle.map(|handle| match self.heap.get(handle) {
            Some(entry) => entry.wake_up.resolution,
            None => panic!("queue {queue} holds stale {handle:?}"),
        });

        match (wake_up, *heap_handle) {
            (Some(wake_up), Some(handle)) => {
                self.heap.replace(handle, HeapEntry { wake_up, queue });
                trace!(queue = %queue, wake_up = %wake_up, "moved wake-up");
            }
            (Some(wake_up), None) => {
                *heap_handle = Some(self.heap.insert(HeapEntry { wake_up, queue }));
                trace!(queue = %queue, wake_up = %wake_up, "inserted wake-up");
            }
            (None, Some(handle)) => {
                self.heap.erase(handle);
                *heap_handle = None;
                trace!(queue = %queue, "erased wake-up");
            }
            (None, None) => {}
        }

        if previous_resolution == Some(WakeUpResolution::High) {
            assert!(
                self.pending_high_res_count > 0,
                "pending high resolution count underflow"
            );
            self.pending_high_res_count -= 1;
        }
        if wake_up.is_some_and(|wake_up| wake_up.is_high_resolution()) {
            self.pending_high_res_count += 1;
        }

        let new_min = self.heap.peek_min().map(|entry| entry.wake_up.time);
        if new_min == previous_min {
            return;
        }

        let deadline = new_min.unwrap_or(Time::MAX);
        if deadline != Time::MAX && deadline <= now.now() {
            self.request_do_work();
        } else {
            trace!(deadline = %deadline, "arming delayed do-work");
            self.scheduler_mut().set_next_delayed_do_work(now, deadline);
        }
    }

    #[track_caller]
    fn request_do_work(&mut self) {
        trace!("requesting immediate do-work");
        self.scheduler_mut().request_do_work();
    }

    #[track_caller]
    fn scheduler_mut(&mut self) -> &mut dyn UnderlyingScheduler {
        match self.scheduler.as_deref_mut() {
            Some(scheduler) => scheduler,
            None => panic!("time domain used before on_register"),
        }
    }
}

struct QueueSlot<Q> {
    queue: Q,
    heap_handle: Option<HeapHandle>,
}

/// Coordinates delayed wake-ups for a set of task queues sharing one clock.
pub struct TimeDomain<Q> {
    id: DomainId,
    name: String,
    queues: Arena<QueueSlot<Q>>,
    state: WakeUpState,
    clock: Arc<dyn TimeSource>,
    affinity: ThreadAffinity,
    sequence: SequenceSource,
}

#[track_caller]
fn slot_mut<Q>(
    queues: &mut Arena<QueueSlot<Q>>,
    domain: DomainId,
    queue: QueueId,
) -> &mut QueueSlot<Q> {
    assert_eq!(
        queue.time_domain(),
        domain,
        "queue {queue} is registered with another time domain"
    );
    match queues.get_mut(queue.slot()) {
        Some(slot) => slot,
        None => panic!("queue {queue} is not registered with time domain {domain}"),
    }
}

impl<Q: TaskQueue> TimeDomain<Q> {
    /// Creates a domain reading time from `clock`.
    #[must_use]
    pub fn new(config: &TimeDomainConfig, clock: Arc<dyn TimeSource>) -> Self {
        let id = DomainId::next();
        debug!(domain = %id, name = %config.name, "created time domain");
        Self {
            id,
            name: config.name.clone(),
            queues: Arena::with_capacity(config.queue_capacity),
            state: WakeUpState::with_capacity(config.heap_capacity),
            clock,
            affinity: ThreadAffinity::unbound(),
            sequence: SequenceSource::new(),
        }
    }

    /// Binds the domain to the scheduler that will run it, and to the calling
    /// thread.
    ///
    /// # Panics
    ///
    /// Panics if a scheduler is already registered.
    pub fn on_register<S: UnderlyingScheduler + 'static>(&mut self, scheduler: S) {
        assert!(
            self.state.scheduler.is_none(),
            "time domain {} registered with a second scheduler",
            self.id
        );
        self.state.scheduler = Some(Box::new(scheduler));
        self.affinity.bind();
        debug!(domain = %self.id, "registered with scheduler");
    }

    /// Takes ownership of `queue` and returns its id.
    ///
    /// The queue starts with no pending wake-up; call
    /// [`update_delayed_wake_up`](Self::update_delayed_wake_up) once it has
    /// delayed work.
    pub fn register_queue(&mut self, queue: Q) -> QueueId {
        self.affinity.assert_owner("register_queue");
        let slot = self.queues.insert(QueueSlot {
            queue,
            heap_handle: None,
        });
        let id = QueueId::new(self.id, slot);
        trace!(queue = %id, "registered queue");
        id
    }

    /// Clears the queue's wake-up and hands the queue back.
    ///
    /// Returns `None` if `queue` is not registered here.
    pub fn unregister_queue(&mut self, queue: QueueId) -> Option<Q> {
        self.affinity.assert_owner("unregister_queue");
        if queue.time_domain() != self.id || !self.queues.contains(queue.slot()) {
            return None;
        }
        let clock = Arc::clone(&self.clock);
        let mut now = LazyNow::new(&*clock);
        self.set_next_wake_up(queue, None, &mut now);
        let slot = self.queues.remove(queue.slot())?;
        trace!(queue = %queue, "unregistered queue");
        Some(slot.queue)
    }

    /// Registers, moves or clears `queue`'s pending wake-up and tells the
    /// scheduler if the earliest deadline changed.
    ///
    /// The scheduler is always driven off the heap minimum, which may belong
    /// to a different queue. Clearing an already clear wake-up does nothing.
    ///
    /// # Panics
    ///
    /// Panics if `queue` is not registered with this domain, if the domain
    /// has no scheduler and the deadline changes, or (debug builds) if
    /// `wake_up` is `Some` while the queue is disabled.
    #[track_caller]
    pub fn set_next_wake_up(
        &mut self,
        queue: QueueId,
        wake_up: Option<WakeUp>,
        now: &mut LazyNow<'_>,
    ) {
        self.affinity.assert_owner("set_next_wake_up");
        let slot = slot_mut(&mut self.queues, self.id, queue);
        let enabled = slot.queue.is_enabled();
        self.state
            .set_next_wake_up(queue, &mut slot.heap_handle, enabled, wake_up, now);
    }

    /// Moves the delayed tasks of every queue due at `now` into the queues'
    /// work queues.
    ///
    /// Each due queue is notified through
    /// [`TaskQueue::on_start_wake_up`]. A single due queue moves its tasks
    /// itself; with several, tasks from all of them are dispatched in
    /// `(run_time, sequence_num)` order. Each woken queue then recomputes its
    /// own next wake-up, and finally the queue on top of the heap is asked to
    /// recompute, repeatedly, until the top is stable.
    ///
    /// A queue that is still due after its own `on_start_wake_up` is left
    /// for the next pass and the scheduler is asked to come straight back.
    pub fn move_ready_delayed_tasks_to_work_queues(&mut self, now: &mut LazyNow<'_>) {
        self.affinity
            .assert_owner("move_ready_delayed_tasks_to_work_queues");
        let _span = debug_span!("drain", domain = %self.id).entered();

        let mut woken: SmallVec<[QueueId; 4]> = SmallVec::new();
        while let Some(top) = self.state.heap.peek_min().copied() {
            if top.wake_up.time > now.now() {
                break;
            }
            if woken.contains(&top.queue) {
                warn!(
                    queue = %top.queue,
                    wake_up = %top.wake_up,
                    "queue re-armed a due wake-up while starting; deferring to next pass"
                );
                self.state.request_do_work();
                break;
            }
            let slot = slot_mut(&mut self.queues, self.id, top.queue);
            let enabled = slot.queue.is_enabled();
            let mut registration =
                WakeUpRegistration::new(top.queue, enabled, &mut slot.heap_handle, &mut self.state);
            slot.queue.on_start_wake_up(&mut registration, now);
            woken.push(top.queue);
        }

        match woken.as_slice() {
            [] => return,
            [only] => {
                debug!(queue = %only, "draining single due queue");
                slot_mut(&mut self.queues, self.id, *only)
                    .queue
                    .move_ready_delayed_tasks_to_work_queue(now);
            }
            several => {
                let mut ready: Vec<ReadyDelayedTask<Q::Task>> = Vec::new();
                for &queue in several {
                    let slot = slot_mut(&mut self.queues, self.id, queue);
                    let mut sink = ReadyTaskSink::new(queue, &mut ready);
                    slot.queue.take_ready_delayed_tasks(now, &mut sink);
                }
                ready.sort_by_key(ReadyDelayedTask::sort_key);
                debug!(
                    queues = several.len(),
                    tasks = ready.len(),
                    "draining due queues in run-time order"
                );
                for task in ready {
                    slot_mut(&mut self.queues, self.id, task.queue)
                        .queue
                        .move_ready_delayed_task_to_work_queue(task.task);
                }
            }
        }

        // Woken queues re-register only now that every due task has moved.
        for &queue in &woken {
            self.update_queue_wake_up(queue, now);
        }
        self.update_wake_ups_from_top(now);
    }

    /// Prunes canceled tasks from the front of whichever queue holds the
    /// earliest wake-up, until the earliest wake-up belongs to a live task.
    pub fn remove_all_canceled_delayed_tasks_from_front(&mut self, now: &mut LazyNow<'_>) {
        self.affinity
            .assert_owner("remove_all_canceled_delayed_tasks_from_front");
        while let Some(top) = self.state.heap.peek_min().map(|entry| entry.queue) {
            let slot = slot_mut(&mut self.queues, self.id, top);
            if !slot.queue.remove_all_canceled_delayed_tasks_from_front(now) {
                break;
            }
            debug!(queue = %top, "pruned canceled tasks");
            self.update_queue_wake_up(top, now);
        }
    }

    /// Asks `queue` to recompute and re-register its own wake-up.
    ///
    /// Call after posting delayed work into a queue through
    /// [`queue_mut`](Self::queue_mut).
    pub fn update_delayed_wake_up(&mut self, queue: QueueId, now: &mut LazyNow<'_>) {
        self.affinity.assert_owner("update_delayed_wake_up");
        self.update_queue_wake_up(queue, now);
    }

    /// Enables or disables `queue`. Disabling clears its wake-up; enabling
    /// recomputes it.
    pub fn set_queue_enabled(&mut self, queue: QueueId, enabled: bool, now: &mut LazyNow<'_>) {
        self.affinity.assert_owner("set_queue_enabled");
        slot_mut(&mut self.queues, self.id, queue)
            .queue
            .set_enabled(enabled);
        if enabled {
            self.update_queue_wake_up(queue, now);
        } else {
            self.set_next_wake_up(queue, None, now);
        }
    }

    fn update_queue_wake_up(&mut self, queue: QueueId, now: &mut LazyNow<'_>) {
        let slot = slot_mut(&mut self.queues, self.id, queue);
        let enabled = slot.queue.is_enabled();
        let mut registration =
            WakeUpRegistration::new(queue, enabled, &mut slot.heap_handle, &mut self.state);
        slot.queue.update_delayed_wake_up(&mut registration, now);
    }

    fn update_wake_ups_from_top(&mut self, now: &mut LazyNow<'_>) {
        let mut last_updated: Option<QueueId> = None;
        while let Some(top) = self.state.heap.peek_min().map(|entry| entry.queue) {
            if last_updated == Some(top) {
                break;
            }
            self.update_queue_wake_up(top, now);
            last_updated = Some(top);
        }
    }
}

impl<Q> TimeDomain<Q> {
    /// The domain's identity, recorded in every [`QueueId`] it hands out.
    #[must_use]
    pub const fn id(&self) -> DomainId {
        self.id
    }

    /// Name reported in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The clock this domain reads.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn TimeSource> {
        Arc::clone(&self.clock)
    }

    /// Sequence numbers shared by every queue in this domain.
    #[must_use]
    pub fn sequence_source(&self) -> SequenceSource {
        self.sequence.clone()
    }

    /// Returns true once [`on_register`](Self::on_register) has been called.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.state.scheduler.is_some()
    }

    /// Number of registered queues.
    #[must_use]
    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    /// The registered queue named by `queue`.
    #[must_use]
    pub fn queue(&self, queue: QueueId) -> Option<&Q> {
        if queue.time_domain() != self.id {
            return None;
        }
        self.queues.get(queue.slot()).map(|slot| &slot.queue)
    }

    /// Mutable access to a registered queue.
    ///
    /// Changing the queue's delayed work does not touch the heap; follow up
    /// with [`update_delayed_wake_up`](TimeDomain::update_delayed_wake_up).
    /// Use [`set_queue_enabled`](TimeDomain::set_queue_enabled) rather than
    /// toggling the queue directly.
    pub fn queue_mut(&mut self, queue: QueueId) -> Option<&mut Q> {
        if queue.time_domain() != self.id {
            return None;
        }
        self.queues.get_mut(queue.slot()).map(|slot| &mut slot.queue)
    }

    /// The queue's live heap handle, if it has a pending wake-up.
    #[must_use]
    pub fn heap_handle(&self, queue: QueueId) -> Option<HeapHandle> {
        if queue.time_domain() != self.id {
            return None;
        }
        self.queues.get(queue.slot()).and_then(|slot| slot.heap_handle)
    }

    /// The queue's pending wake-up.
    #[must_use]
    pub fn wake_up_of(&self, queue: QueueId) -> Option<WakeUp> {
        self.state.wake_up_for(self.heap_handle(queue))
    }

    /// The earliest pending wake-up across all queues.
    #[must_use]
    pub fn next_delayed_wake_up(&self) -> Option<WakeUp> {
        self.state.heap.peek_min().map(|entry| entry.wake_up)
    }

    /// Returns true if any pending wake-up asked for high resolution.
    #[must_use]
    pub fn has_pending_high_resolution_tasks(&self) -> bool {
        self.state.pending_high_res_count > 0
    }

    /// Number of pending high resolution wake-ups.
    #[must_use]
    pub fn pending_high_res_count(&self) -> usize {
        self.state.pending_high_res_count
    }

    /// Read-only view of the wake-up heap.
    #[must_use]
    pub fn wake_up_heap(&self) -> &WakeUpHeap {
        &self.state.heap
    }

    /// Diagnostics snapshot. Reads the clock only when a wake-up is pending.
    #[must_use]
    pub fn as_value(&self) -> TimeDomainSnapshot {
        let next_delay_ms = self
            .state
            .heap
            .peek_min()
            .map(|entry| entry.wake_up.time.millis_since_f64(self.clock.now()));
        TimeDomainSnapshot {
            name: self.name.clone(),
            registered_delay_count: self.state.heap.len(),
            next_delay_ms,
        }
    }
}

impl<Q> std::fmt::Debug for TimeDomain<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeDomain")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("queues", &self.queues.len())
            .field("pending", &self.state.heap.len())
            .field("pending_high_res_count", &self.state.pending_high_res_count)
            .field("registered", &self.state.scheduler.is_some())
            .finish_non_exhaustive()
    }
}
