//! Min-heap of pending wake-ups with stable, generation-checked handles.
//!
//! [`WakeUpHeap`] keeps at most one entry per queue ordered by wake-up time
//! and gives O(1) access to the earliest one. Each inserted entry is named by
//! a [`HeapHandle`] which stays valid across every sift until the entry is
//! erased, so a queue can move its wake-up in place instead of erasing and
//! reinserting.
//!
//! # Layout
//!
//! ```text
//! order: Vec<ArenaIndex>        nodes: Arena<Node>
//! [n3, n0, n7, ...]  ───────▶   n0 { entry: Q2@50,  position: 1 }
//!   ▲ heap backbone             n3 { entry: Q4@20,  position: 0 }
//!   │                           n7 { entry: Q1@100, position: 2 }
//!   └── sift_up / sift_down keep `position` in sync
//! ```
//!
//! The backbone is a compact array of arena indices; the entries themselves
//! never move. A handle is the node's arena index, so erasing a node bumps
//! its slot generation and every copy of the old handle goes stale.
//!
//! # Invariants
//!
//! - For every `i`, `nodes[order[i]].position == i`
//! - For every `i > 0`, `time(order[(i - 1) / 2]) <= time(order[i])`
//! - `nodes.len() == order.len()`
//!
//! # Complexity
//!
//! | Operation | Time     |
//! |-----------|----------|
//! | insert    | O(log n) |
//! | replace   | O(log n) |
//! | erase     | O(log n) |
//! | peek_min  | O(1)     |
//! | get       | O(1)     |

use crate::types::{QueueId, Time, WakeUp};
use crate::util::{Arena, ArenaIndex};
use core::fmt;

/// Token naming one live heap entry.
///
/// Becomes stale when its entry is erased. Using a stale handle with
/// [`WakeUpHeap::replace`] or [`WakeUpHeap::erase`] panics.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapHandle(ArenaIndex);

impl fmt::Debug for HeapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HeapHandle({}:{})", self.0.index(), self.0.generation())
    }
}

/// A queue's pending wake-up as stored in the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapEntry {
    /// When and how precisely the queue wants to be woken.
    pub wake_up: WakeUp,
    /// The queue to notify.
    pub queue: QueueId,
}

#[derive(Debug)]
struct Node {
    entry: HeapEntry,
    position: u32,
}

/// Mutable min-heap of [`HeapEntry`] keyed by `wake_up.time`.
///
/// Entries with equal times are not ordered relative to each other.
#[derive(Debug, Default)]
pub struct WakeUpHeap {
    nodes: Arena<Node>,
    order: Vec<ArenaIndex>,
}

impl WakeUpHeap {
    /// Creates an empty heap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty heap with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
        }
    }

    /// Number of live entries.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if there are no live entries.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The entry with the earliest wake-up time.
    #[must_use]
    #[inline]
    pub fn peek_min(&self) -> Option<&HeapEntry> {
        let first = *self.order.first()?;
        self.nodes.get(first).map(|node| &node.entry)
    }

    /// The entry named by `handle`, or `None` if the handle is stale.
    #[must_use]
    pub fn get(&self, handle: HeapHandle) -> Option<&HeapEntry> {
        self.nodes.get(handle.0).map(|node| &node.entry)
    }

    /// Returns true if `handle` names a live entry.
    #[must_use]
    pub fn contains(&self, handle: HeapHandle) -> bool {
        self.nodes.contains(handle.0)
    }

    /// Iterates over live entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &HeapEntry> {
        self.nodes.iter().map(|(_, node)| &node.entry)
    }

    /// Adds `entry` and returns the handle that names it.
    pub fn insert(&mut self, entry: HeapEntry) -> HeapHandle {
        let position = self.order.len();
        let index = self.nodes.insert(Node {
            entry,
            position: position as u32,
        });
        self.order.push(index);
        self.sift_up(position);
        HeapHandle(index)
    }

    /// Overwrites the entry named by `handle` and restores heap order.
    ///
    /// The handle stays valid.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is stale.
    #[track_caller]
    pub fn replace(&mut self, handle: HeapHandle, entry: HeapEntry) {
        let Some(node) = self.nodes.get_mut(handle.0) else {
            panic!("replace through stale {handle:?}");
        };
        let earlier = entry.wake_up.time < node.entry.wake_up.time;
        node.entry = entry;
        let position = node.position as usize;

        if earlier {
            self.sift_up(position);
        } else {
            self.sift_down(position);
        }
    }

    /// Removes the entry named by `handle` and returns it.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is stale.
    #[track_caller]
    pub fn erase(&mut self, handle: HeapHandle) -> HeapEntry {
        let Some(node) = self.nodes.remove(handle.0) else {
            panic!("erase through stale {handle:?}");
        };
        let position = node.position as usize;

        self.order.swap_remove(position);
        if position < self.order.len() {
            self.set_position(position);
            if self.sift_up(position) == position {
                self.sift_down(position);
            }
        }
        node.entry
    }

    /// Removes every entry, invalidating all handles.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
    }

    fn time_at(&self, position: usize) -> Time {
        self.nodes
            .get(self.order[position])
            .map_or(Time::MAX, |node| node.entry.wake_up.time)
    }

    fn set_position(&mut self, position: usize) {
        if let Some(node) = self.nodes.get_mut(self.order[position]) {
            node.position = position as u32;
        }
    }

    fn swap_positions(&mut self, a: usize, b: usize) {
        self.order.swap(a, b);
        self.set_position(a);
        self.set_position(b);
    }

    /// Moves the entry at `position` towards the root. Returns where it settled.
    fn sift_up(&mut self, mut position: usize) -> usize {
        while position > 0 {
            let parent = (position - 1) / 2;
            if self.time_at(position) >= self.time_at(parent) {
                break;
            }
            self.swap_positions(position, parent);
            position = parent;
        }
        position
    }

    fn sift_down(&mut self, mut position: usize) {
        let len = self.order.len();
        loop {
            let left = 2 * position + 1;
            let right = left + 1;
            let mut earliest = position;

            if left < len && self.time_at(left) < self.time_at(earliest) {
                earliest = left;
            }
            if right < len && self.time_at(right) < self.time_at(earliest) {
                earliest = right;
            }
            if earliest == position {
                break;
            }

            self.swap_positions(position, earliest);
            position = earliest;
        }
    }
}
