//! A scripted task queue that records every callback the domain makes.

use parking_lot::Mutex;
use std::sync::Arc;
use timedomain::runtime::{ReadyTaskSink, SequenceSource, TaskQueue, WakeUpRegistration};
use timedomain::time::LazyNow;
use timedomain::types::{Time, WakeUp, WakeUpResolution};

/// One callback observed on a [`ProbeQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeEvent {
    /// `on_start_wake_up`.
    StartWakeUp(&'static str),
    /// `update_delayed_wake_up`.
    UpdateWakeUp(&'static str),
    /// `remove_all_canceled_delayed_tasks_from_front`.
    Prune(&'static str),
    /// `move_ready_delayed_tasks_to_work_queue` (single-queue path).
    MoveAll(&'static str),
    /// `take_ready_delayed_tasks` (multi-queue path).
    Take(&'static str),
    /// A task landed in the queue's work list.
    Dispatch(&'static str, &'static str),
}

/// Event log shared by several probes.
pub type ProbeLog = Arc<Mutex<Vec<ProbeEvent>>>;

/// Test queue with scripted misbehaviour.
#[derive(Debug)]
pub struct ProbeQueue {
    name: &'static str,
    sequence: SequenceSource,
    events: ProbeLog,
    /// Pending delayed tasks: run time, sequence number, task.
    pub delayed: Vec<(Time, u64, &'static str)>,
    /// Tasks moved to the work list, in arrival order.
    pub work: Vec<&'static str>,
    /// Resolution reported for the queue's wake-up.
    pub resolution: WakeUpResolution,
    /// Registered from `on_start_wake_up` instead of clearing the wake-up.
    pub rearm_on_start: Option<WakeUp>,
    /// Whether the queue is enabled.
    pub enabled: bool,
}

impl ProbeQueue {
    /// An enabled, empty probe.
    pub fn new(name: &'static str, sequence: SequenceSource, events: &ProbeLog) -> Self {
        Self {
            name,
            sequence,
            events: Arc::clone(events),
            delayed: Vec::new(),
            work: Vec::new(),
            resolution: WakeUpResolution::Low,
            rearm_on_start: None,
            enabled: true,
        }
    }

    /// Posts a delayed task, drawing the next global sequence number.
    pub fn post(&mut self, run_time: Time, task: &'static str) -> u64 {
        let sequence_num = self.sequence.next();
        self.delayed.push((run_time, sequence_num, task));
        self.delayed.sort_by_key(|&(time, seq, _)| (time, seq));
        sequence_num
    }

    /// Sets the resolution reported for the queue's wake-up.
    pub fn with_resolution(mut self, resolution: WakeUpResolution) -> Self {
        self.resolution = resolution;
        self
    }

    fn record(&self, event: ProbeEvent) {
        self.events.lock().push(event);
    }

    fn split_due(&mut self, now: &mut LazyNow<'_>) -> Vec<(Time, u64, &'static str)> {
        if self.delayed.is_empty() {
            return Vec::new();
        }
        let now = now.now();
        let due = self.delayed.iter().take_while(|(time, _, _)| *time <= now).count();
        self.delayed.drain(..due).collect()
    }
}

impl TaskQueue for ProbeQueue {
    type Task = &'static str;

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn next_delayed_wake_up(&self) -> Option<WakeUp> {
        self.delayed.first().map(|&(time, _, _)| WakeUp {
            time,
            resolution: self.resolution,
        })
    }

    fn remove_all_canceled_delayed_tasks_from_front(&mut self, _now: &mut LazyNow<'_>) -> bool {
        self.record(ProbeEvent::Prune(self.name));
        false
    }

    fn on_start_wake_up(&mut self, registration: &mut WakeUpRegistration<'_>, now: &mut LazyNow<'_>) {
        self.record(ProbeEvent::StartWakeUp(self.name));
        registration.set_next_wake_up(self.rearm_on_start, now);
    }

    fn move_ready_delayed_tasks_to_work_queue(&mut self, now: &mut LazyNow<'_>) {
        self.record(ProbeEvent::MoveAll(self.name));
        for (_, _, task) in self.split_due(now) {
            self.record(ProbeEvent::Dispatch(self.name, task));
            self.work.push(task);
        }
    }

    fn take_ready_delayed_tasks(&mut self, now: &mut LazyNow<'_>, sink: &mut ReadyTaskSink<'_, Self::Task>) {
        self.record(ProbeEvent::Take(self.name));
        for (time, seq, task) in self.split_due(now) {
            sink.push(time, seq, task);
        }
    }

    fn move_ready_delayed_task_to_work_queue(&mut self, task: Self::Task) {
        self.record(ProbeEvent::Dispatch(self.name, task));
        self.work.push(task);
    }

    fn update_delayed_wake_up(&mut self, registration: &mut WakeUpRegistration<'_>, now: &mut LazyNow<'_>) {
        self.record(ProbeEvent::UpdateWakeUp(self.name));
        let wake_up = if self.enabled {
            self.next_delayed_wake_up()
        } else {
            None
        };
        registration.set_next_wake_up(wake_up, now);
    }
}
