//! Property tests for the wake-up heap and the time domain's bookkeeping.
//!
//! # Properties
//!
//! - `peek_min` always returns the smallest live wake-up time
//! - handles stay valid until erased and go stale afterwards
//! - `pending_high_res_count` equals the number of live high resolution
//!   entries after every domain operation, drains included
//! - each queue holds at most one heap entry

#[macro_use]
mod common;

use common::*;
use proptest::prelude::*;
use timedomain::runtime::{DelayedTaskQueue, HeapEntry, HeapHandle, TimeDomain, WakeUpHeap};
use timedomain::time::LazyNow;
use timedomain::types::{QueueId, WakeUp, WakeUpResolution};

const QUEUES: usize = 6;

fn wake_up(time: u64, high: bool) -> WakeUp {
    if high {
        WakeUp::high(ms(time))
    } else {
        WakeUp::low(ms(time))
    }
}

fn queue_ids() -> (TimeDomain<DelayedTaskQueue<u32>>, Vec<QueueId>) {
    let (mut domain, _clock, _log) = lab_domain::<DelayedTaskQueue<u32>>("ids");
    let ids = (0..QUEUES)
        .map(|_| domain.register_queue(DelayedTaskQueue::new(domain.sequence_source())))
        .collect();
    (domain, ids)
}

// ============================================================================
// Heap operations
// ============================================================================

#[derive(Debug, Clone)]
enum HeapOp {
    Insert { time: u64, high: bool },
    Replace { pick: usize, time: u64, high: bool },
    Erase { pick: usize },
}

fn arb_heap_op() -> impl Strategy<Value = HeapOp> {
    prop_oneof![
        (0u64..500, any::<bool>()).prop_map(|(time, high)| HeapOp::Insert { time, high }),
        (any::<usize>(), 0u64..500, any::<bool>())
            .prop_map(|(pick, time, high)| HeapOp::Replace { pick, time, high }),
        any::<usize>().prop_map(|pick| HeapOp::Erase { pick }),
    ]
}

fn check_heap(heap: &WakeUpHeap, live: &[(HeapHandle, HeapEntry)], dead: &[HeapHandle]) {
    assert_eq!(heap.len(), live.len());
    let expected_min = live.iter().map(|(_, entry)| entry.wake_up.time).min();
    assert_eq!(heap.peek_min().map(|entry| entry.wake_up.time), expected_min);
    for (handle, entry) in live {
        assert_eq!(heap.get(*handle), Some(entry));
    }
    for handle in dead {
        assert!(!heap.contains(*handle));
    }
}

proptest! {
    #![proptest_config(test_proptest_config(200))]

    #[test]
    fn peek_min_is_global_minimum(ops in proptest::collection::vec(arb_heap_op(), 1..80)) {
        init_test_logging();
        let (_domain, ids) = queue_ids();
        let mut heap = WakeUpHeap::new();
        let mut live: Vec<(HeapHandle, HeapEntry)> = Vec::new();
        let mut dead: Vec<HeapHandle> = Vec::new();

        for (step, op) in ops.into_iter().enumerate() {
            let queue = ids[step % ids.len()];
            match op {
                HeapOp::Insert { time, high } => {
                    let entry = HeapEntry { wake_up: wake_up(time, high), queue };
                    let handle = heap.insert(entry);
                    live.push((handle, entry));
                }
                HeapOp::Replace { pick, time, high } => {
                    if live.is_empty() {
                        continue;
                    }
                    let slot = pick % live.len();
                    let entry = HeapEntry { wake_up: wake_up(time, high), queue: live[slot].1.queue };
                    heap.replace(live[slot].0, entry);
                    live[slot].1 = entry;
                }
                HeapOp::Erase { pick } => {
                    if live.is_empty() {
                        continue;
                    }
                    let (handle, entry) = live.swap_remove(pick % live.len());
                    prop_assert_eq!(heap.erase(handle), entry);
                    dead.push(handle);
                }
            }
            check_heap(&heap, &live, &dead);
        }
    }
}

// ============================================================================
// Domain operations
// ============================================================================

#[derive(Debug, Clone)]
enum DomainOp {
    Post { queue: usize, at: u64, high: bool },
    Set { queue: usize, wake: Option<(u64, bool)> },
    Drain { at: u64 },
    Prune,
    Toggle { queue: usize },
}

fn arb_domain_op() -> impl Strategy<Value = DomainOp> {
    prop_oneof![
        3 => (0..QUEUES, 0u64..300, any::<bool>())
            .prop_map(|(queue, at, high)| DomainOp::Post { queue, at, high }),
        2 => (0..QUEUES, proptest::option::of((0u64..300, any::<bool>())))
            .prop_map(|(queue, wake)| DomainOp::Set { queue, wake }),
        2 => (0u64..300).prop_map(|at| DomainOp::Drain { at }),
        1 => Just(DomainOp::Prune),
        1 => (0..QUEUES).prop_map(|queue| DomainOp::Toggle { queue }),
    ]
}

fn check_domain(domain: &TimeDomain<DelayedTaskQueue<u32>>, ids: &[QueueId]) {
    let heap = domain.wake_up_heap();
    let high = heap.iter().filter(|entry| entry.wake_up.is_high_resolution()).count();
    assert_eq!(domain.pending_high_res_count(), high);
    assert_eq!(domain.has_pending_high_resolution_tasks(), high > 0);

    let min = heap.iter().map(|entry| entry.wake_up.time).min();
    assert_eq!(domain.next_delayed_wake_up().map(|w| w.time), min);

    for &id in ids {
        let entries = heap.iter().filter(|entry| entry.queue == id).count();
        assert!(entries <= 1, "queue {id} has {entries} heap entries");
        assert_eq!(domain.heap_handle(id).is_some(), entries == 1);
        if domain.queue(id).is_some_and(|queue| !timedomain::TaskQueue::is_enabled(queue)) {
            assert_eq!(entries, 0, "disabled queue {id} holds a wake-up");
        }
    }
    assert_eq!(domain.as_value().registered_delay_count, heap.len());
}

proptest! {
    #![proptest_config(test_proptest_config(200))]

    #[test]
    fn high_resolution_count_matches_heap(ops in proptest::collection::vec(arb_domain_op(), 1..60)) {
        init_test_logging();
        let (mut domain, ids) = queue_ids();
        let mut clock_ms = 0_u64;
        let mut task = 0_u32;

        for op in ops {
            let mut now = LazyNow::at(ms(clock_ms));
            match op {
                DomainOp::Post { queue, at, high } => {
                    let id = ids[queue];
                    let resolution = if high { WakeUpResolution::High } else { WakeUpResolution::Low };
                    if let Some(q) = domain.queue_mut(id) {
                        q.post_delayed(task, ms(clock_ms + at), resolution);
                        task += 1;
                    }
                    domain.update_delayed_wake_up(id, &mut now);
                }
                DomainOp::Set { queue, wake } => {
                    let id = ids[queue];
                    let enabled = domain.queue(id).is_some_and(timedomain::TaskQueue::is_enabled);
                    let wake = wake.filter(|_| enabled).map(|(at, high)| wake_up(clock_ms + at, high));
                    domain.set_next_wake_up(id, wake, &mut now);
                }
                DomainOp::Drain { at } => {
                    clock_ms += at;
                    let mut now = LazyNow::at(ms(clock_ms));
                    domain.move_ready_delayed_tasks_to_work_queues(&mut now);
                }
                DomainOp::Prune => domain.remove_all_canceled_delayed_tasks_from_front(&mut now),
                DomainOp::Toggle { queue } => {
                    let id = ids[queue];
                    let enabled = domain.queue(id).is_some_and(timedomain::TaskQueue::is_enabled);
                    domain.set_queue_enabled(id, !enabled, &mut now);
                }
            }
            check_domain(&domain, &ids);
        }
    }
}
