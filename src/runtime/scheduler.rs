//! The run loop a time domain reports its deadlines to.

use crate::time::LazyNow;
use crate::types::Time;

/// External owner of the real timer / run loop.
///
/// A [`TimeDomain`](super::TimeDomain) calls exactly one of these methods each
/// time the earliest pending wake-up across its queues changes. The
/// implementation is expected to invoke
/// [`TimeDomain::move_ready_delayed_tasks_to_work_queues`](super::TimeDomain::move_ready_delayed_tasks_to_work_queues)
/// once the requested moment arrives.
pub trait UnderlyingScheduler: Send {
    /// Run the domain's owner as soon as possible.
    fn request_do_work(&mut self);

    /// Run the domain's owner at `deadline`.
    ///
    /// A deadline of [`Time::MAX`] means nothing is pending and any armed
    /// timer should be cancelled.
    fn set_next_delayed_do_work(&mut self, now: &mut LazyNow<'_>, deadline: Time);
}

impl<S: UnderlyingScheduler + ?Sized> UnderlyingScheduler for Box<S> {
    fn request_do_work(&mut self) {
        (**self).request_do_work();
    }

    fn set_next_delayed_do_work(&mut self, now: &mut LazyNow<'_>, deadline: Time) {
        (**self).set_next_delayed_do_work(now, deadline);
    }
}
