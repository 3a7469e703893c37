//! `AgentUidMap<V>` — a UID-keyed map with lock-free-on-distinct-keys access.
//!
//! Represented as parallel arrays indexed by `uid.index()`: the value, the
//! "currently live" reused-counter, and (never cleared by `remove`, only
//! overwritten by the next `insert`) the *last* reused-counter observed at
//! that slot. The third array is what lets [`AgentUidGenerator`] recover the
//! correct next `reused` value for a vacated slot without needing the
//! removing thread to still be holding the retiring `AgentUid` around.
//!
//! Growth takes the map's single `RwLock`; everything else only takes a
//! *read* guard, so concurrent `insert`/`lookup` calls at distinct indices
//! never block each other — only a resize excludes them, and only for as
//! long as the resize itself takes.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;
use rayon::prelude::*;

use crate::AgentUid;

const VACANT: u32 = u32::MAX;

struct Cells<V> {
    data: Vec<UnsafeCell<V>>,
    reused: Vec<AtomicU32>,
    last_reused: Vec<AtomicU32>,
}

// SAFETY: every write to `data[i]` happens through `insert`, and the caller
// contract (enforced by `ResourceManager`) is that distinct threads only
// ever write distinct indices within one logical step. `reused`/`last_reused`
// are already `Sync` via their own atomics.
unsafe impl<V: Send> Sync for Cells<V> {}

pub struct AgentUidMap<V> {
    cells: RwLock<Cells<V>>,
}

impl<V: Copy + Default> AgentUidMap<V> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            cells: RwLock::new(Cells {
                data: (0..n).map(|_| UnsafeCell::new(V::default())).collect(),
                reused: (0..n).map(|_| AtomicU32::new(VACANT)).collect(),
                last_reused: (0..n).map(|_| AtomicU32::new(VACANT)).collect(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grow the map to hold at least `n` slots. Takes the resize lock.
    pub fn resize(&self, n: usize) {
        let mut cells = self.cells.write();
        if cells.data.len() < n {
            cells.data.resize_with(n, || UnsafeCell::new(V::default()));
            cells.reused.resize_with(n, || AtomicU32::new(VACANT));
            cells.last_reused.resize_with(n, || AtomicU32::new(VACANT));
        }
    }

    /// Mark every slot vacant in parallel, without touching capacity.
    pub fn parallel_clear(&self) {
        let cells = self.cells.read();
        cells.reused.par_iter().for_each(|r| r.store(VACANT, Ordering::Relaxed));
    }

    pub fn contains(&self, uid: AgentUid) -> bool {
        let cells = self.cells.read();
        let idx = uid.index() as usize;
        idx < cells.reused.len() && cells.reused[idx].load(Ordering::Acquire) == uid.reused()
    }

    /// Store `value` at `uid`'s slot. Caller must ensure the slot is not
    /// currently owned by a different live UID; the `ResourceManager` upholds
    /// this by construction (it is the only writer of live slots).
    pub fn insert(&self, uid: AgentUid, value: V) {
        let cells = self.cells.read();
        let idx = uid.index() as usize;
        debug_assert!(idx < cells.data.len(), "AgentUidMap::insert: call resize() first");
        // SAFETY: distinct `idx` values are written by distinct threads only
        // (see module docs); this thread owns `idx` exclusively for this call.
        unsafe {
            *cells.data[idx].get() = value;
        }
        cells.reused[idx].store(uid.reused(), Ordering::Release);
        cells.last_reused[idx].store(uid.reused(), Ordering::Release);
    }

    /// Undefined result if `!contains(uid)` — callers always probe first.
    pub fn lookup(&self, uid: AgentUid) -> V {
        let cells = self.cells.read();
        unsafe { *cells.data[uid.index() as usize].get() }
    }

    pub fn remove(&self, uid: AgentUid) {
        let cells = self.cells.read();
        let idx = uid.index() as usize;
        if idx < cells.reused.len() {
            cells.reused[idx].store(VACANT, Ordering::Release);
        }
    }

    /// Indices below `below` that are currently vacant, for the generator's
    /// defragmentation scan.
    pub(crate) fn vacant_indices_below(&self, below: u32) -> Vec<u32> {
        let cells = self.cells.read();
        cells
            .reused
            .iter()
            .enumerate()
            .take(below as usize)
            .filter(|(_, r)| r.load(Ordering::Acquire) == VACANT)
            .map(|(i, _)| i as u32)
            .collect()
    }

    /// The last `reused` value ever stored at `index`, or `0` if the slot
    /// was never occupied (so the next issue for it starts at generation 0).
    pub(crate) fn last_reused_at(&self, index: u32) -> u32 {
        let cells = self.cells.read();
        match cells.last_reused.get(index as usize) {
            Some(r) => {
                let v = r.load(Ordering::Acquire);
                if v == VACANT { 0 } else { v }
            }
            None => 0,
        }
    }
}

impl<V: Copy + Default> Default for AgentUidMap<V> {
    fn default() -> Self {
        Self::new()
    }
}
