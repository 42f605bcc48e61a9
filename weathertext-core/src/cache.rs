//! Fixed-capacity ring of the most recent fetch results.
//!
//! A single cursor hands out slots in order and wraps around, silently
//! reusing the oldest slot. Each allocation bumps a generation counter so a
//! request holding a [`SlotHandle`] never writes into a slot that has since
//! been handed to a newer request.

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;

use crate::{error::WeatherError, model::Snapshot};

pub const DEFAULT_CAPACITY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SlotIndex(usize);

impl SlotIndex {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ownership token for one allocation of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotHandle {
    index: SlotIndex,
    generation: u64,
}

impl SlotHandle {
    pub fn index(&self) -> SlotIndex {
        self.index
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    snapshot: Option<Snapshot>,
}

#[derive(Debug)]
struct Ring {
    slots: Vec<Slot>,
    cursor: usize,
    generation: u64,
}

#[derive(Debug)]
pub struct SnapshotCache {
    ring: Mutex<Ring>,
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl SnapshotCache {
    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity.max(1)).map(|_| Slot::default()).collect();
        Self {
            ring: Mutex::new(Ring { slots, cursor: 0, generation: 0 }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.ring.lock().slots.len()
    }

    /// Claim the next slot, clearing whatever it held.
    pub fn allocate(&self) -> SlotHandle {
        let mut ring = self.ring.lock();
        let index = ring.cursor;
        ring.cursor = (index + 1) % ring.slots.len();
        ring.generation += 1;

        let generation = ring.generation;
        ring.slots[index] = Slot { generation, snapshot: None };

        SlotHandle { index: SlotIndex(index), generation }
    }

    /// Write `snapshot` into the handle's slot. Returns `false` when the slot
    /// has been re-allocated since the handle was issued.
    pub fn store(&self, handle: SlotHandle, snapshot: Snapshot) -> bool {
        self.with_owned_slot(handle, |slot| *slot = Some(snapshot))
    }

    /// Mutate the stored snapshot in place. Returns `false` when the handle is
    /// stale or nothing was stored yet.
    pub fn update(&self, handle: SlotHandle, f: impl FnOnce(&mut Snapshot)) -> bool {
        let mut updated = false;
        self.with_owned_slot(handle, |slot| {
            if let Some(snapshot) = slot.as_mut() {
                f(snapshot);
                updated = true;
            }
        });
        updated
    }

    /// Copy of the snapshot currently held by `index`.
    pub fn get(&self, index: SlotIndex) -> Result<Snapshot, WeatherError> {
        self.ring
            .lock()
            .slots
            .get(index.0)
            .and_then(|slot| slot.snapshot.clone())
            .ok_or(WeatherError::SlotNotFound(index.0))
    }

    fn with_owned_slot(&self, handle: SlotHandle, f: impl FnOnce(&mut Option<Snapshot>)) -> bool {
        let mut ring = self.ring.lock();
        match ring.slots.get_mut(handle.index.0) {
            Some(slot) if slot.generation == handle.generation => {
                f(&mut slot.snapshot);
                true
            }
            _ => false,
        }
    }
}
