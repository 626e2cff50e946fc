//! Generation-checked slot arena.
//!
//! Backs both the wake-up heap's node storage and the time domain's queue
//! slots. Every slot carries a generation counter that is bumped when the slot
//! is vacated, so an [`ArenaIndex`] minted for an earlier occupant can never
//! reach a later one: lookups through a stale index simply miss.
//!
//! # Design
//!
//! - Elements live in a `Vec` of slots; vacated slots form an intrusive free list
//! - Indices are `(slot, generation)` pairs, compared and hashed as a unit
//! - No unsafe code; relies on bounds checking and generation validation

use core::fmt;
use core::hash::{Hash, Hasher};

/// A slot position plus the generation it was minted for.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArenaIndex {
    index: u32,
    generation: u32,
}

impl ArenaIndex {
    /// Creates an arena index from raw parts (primarily for testing).
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot position.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the generation counter.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ArenaIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArenaIndex({}:{})", self.index, self.generation)
    }
}

impl Hash for ArenaIndex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64((u64::from(self.index) << 32) | u64::from(self.generation));
    }
}

#[derive(Debug)]
enum Slot<T> {
    Occupied { value: T, generation: u32 },
    Vacant { next_free: Option<u32>, generation: u32 },
}

/// Slot arena handing out generation-checked [`ArenaIndex`] values.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    /// Creates an empty arena with room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: None,
            len: 0,
        }
    }

    /// Number of occupied slots.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no slot is occupied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores `value` and returns the index that now names it.
    ///
    /// Vacant slots are reused before the backing vector grows; a reused slot
    /// keeps the generation it was bumped to on removal.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` slots would be needed.
    pub fn insert(&mut self, value: T) -> ArenaIndex {
        self.len += 1;

        let Some(free) = self.free_head else {
            let index = u32::try_from(self.slots.len()).expect("arena overflow");
            self.slots.push(Slot::Occupied {
                value,
                generation: 0,
            });
            return ArenaIndex::new(index, 0);
        };

        let slot = &mut self.slots[free as usize];
        let Slot::Vacant {
            next_free,
            generation,
        } = *slot
        else {
            unreachable!("free list pointed to occupied slot {free}");
        };
        self.free_head = next_free;
        *slot = Slot::Occupied { value, generation };
        ArenaIndex::new(free, generation)
    }

    /// Removes and returns the value named by `index`.
    ///
    /// Returns `None` if the index is out of range or stale.
    pub fn remove(&mut self, index: ArenaIndex) -> Option<T> {
        let slot = self.slots.get_mut(index.index as usize)?;
        match slot {
            Slot::Occupied { generation, .. } if *generation == index.generation => {}
            _ => return None,
        }

        let vacant = Slot::Vacant {
            next_free: self.free_head,
            generation: index.generation.wrapping_add(1),
        };
        let Slot::Occupied { value, .. } = core::mem::replace(slot, vacant) else {
            unreachable!();
        };
        self.free_head = Some(index.index);
        self.len -= 1;
        Some(value)
    }

    /// Returns the value named by `index`, if it is still live.
    #[must_use]
    pub fn get(&self, index: ArenaIndex) -> Option<&T> {
        match self.slots.get(index.index as usize)? {
            Slot::Occupied { value, generation } if *generation == index.generation => Some(value),
            _ => None,
        }
    }

    /// Returns the value named by `index` mutably, if it is still live.
    pub fn get_mut(&mut self, index: ArenaIndex) -> Option<&mut T> {
        match self.slots.get_mut(index.index as usize)? {
            Slot::Occupied { value, generation } if *generation == index.generation => Some(value),
            _ => None,
        }
    }

    /// Returns true if `index` names a live value.
    #[must_use]
    pub fn contains(&self, index: ArenaIndex) -> bool {
        self.get(index).is_some()
    }

    /// Iterates over live values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ArenaIndex, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Slot::Occupied { value, generation } => {
                    Some((ArenaIndex::new(i as u32, *generation), value))
                }
                Slot::Vacant { .. } => None,
            })
    }

    /// Vacates every slot, invalidating all outstanding indices.
    pub fn clear(&mut self) {
        let indices: Vec<ArenaIndex> = self.iter().map(|(index, _)| index).collect();
        for index in indices {
            self.remove(index);
        }
    }
}
