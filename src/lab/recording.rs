//! A scheduler that records what a time domain asked of it.

use crate::runtime::UnderlyingScheduler;
use crate::time::LazyNow;
use crate::types::Time;
use parking_lot::Mutex;
use std::sync::Arc;

/// One request made by a time domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCall {
    /// `request_do_work()`.
    DoWork,
    /// `set_next_delayed_do_work(now, deadline)`, with `now` as observed
    /// through the pass's [`LazyNow`].
    DelayedDoWork {
        /// The pass's captured instant.
        now: Time,
        /// Requested deadline; [`Time::MAX`] cancels.
        deadline: Time,
    },
}

/// Shared, cloneable view of a [`RecordingScheduler`]'s calls.
#[derive(Debug, Clone, Default)]
pub struct SchedulerLog {
    calls: Arc<Mutex<Vec<SchedulerCall>>>,
}

impl SchedulerLog {
    /// Every call so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<SchedulerCall> {
        self.calls.lock().clone()
    }

    /// Number of calls so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    /// The most recent call.
    #[must_use]
    pub fn last(&self) -> Option<SchedulerCall> {
        self.calls.lock().last().copied()
    }

    /// Deadline of the most recent delayed do-work request.
    #[must_use]
    pub fn last_deadline(&self) -> Option<Time> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            SchedulerCall::DelayedDoWork { deadline, .. } => Some(*deadline),
            SchedulerCall::DoWork => None,
        })
    }

    /// Number of immediate do-work requests.
    #[must_use]
    pub fn do_work_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, SchedulerCall::DoWork))
            .count()
    }

    /// Returns and forgets every recorded call.
    pub fn take(&self) -> Vec<SchedulerCall> {
        std::mem::take(&mut *self.calls.lock())
    }

    fn push(&self, call: SchedulerCall) {
        self.calls.lock().push(call);
    }
}

/// Records calls into a [`SchedulerLog`].
#[derive(Debug)]
pub struct RecordingScheduler {
    log: SchedulerLog,
}

impl RecordingScheduler {
    /// A scheduler plus the log it writes to.
    #[must_use]
    pub fn new() -> (Self, SchedulerLog) {
        let log = SchedulerLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl UnderlyingScheduler for RecordingScheduler {
    fn request_do_work(&mut self) {
        self.log.push(SchedulerCall::DoWork);
    }

    fn set_next_delayed_do_work(&mut self, now: &mut LazyNow<'_>, deadline: Time) {
        let now = now.now();
        self.log.push(SchedulerCall::DelayedDoWork { now, deadline });
    }
}
