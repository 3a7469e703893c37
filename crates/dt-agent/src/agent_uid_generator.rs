//! `AgentUidGenerator` — issues fresh `AgentUid`s, normal or defragmenting.
//!
//! Normal mode is an atomic fetch-add over `index`. Defragmentation mode is
//! driven by per-worker reuse queues: when the `ResourceManager` retires a
//! UID it hands it back here via [`reuse`](Self::reuse); the next
//! [`generate`](Self::generate) call on that same worker pops it and bumps
//! `reused` by one before handing it back out. `enter_defrag_mode` seeds
//! those queues from an `AgentUidMap`'s currently-vacant slots, for the case
//! where a caller wants to recycle indices that were vacated by some path
//! other than a normal per-step removal (e.g. restoring from a snapshot).
//! Once every worker's queue is drained the generator is back to issuing
//! fresh indices — there is no separate "mode" flag, the queues simply run
//! dry.

use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use dt_core::WorkerId;

use crate::{AgentHandle, AgentUid, AgentUidMap};

pub struct AgentUidGenerator {
    counter: AtomicU32,
    reuse_queues: Vec<Mutex<Vec<AgentUid>>>,
}

impl AgentUidGenerator {
    pub fn new(num_workers: usize) -> Self {
        let n = num_workers.max(1);
        Self {
            counter: AtomicU32::new(0),
            reuse_queues: (0..n).map(|_| Mutex::new(Vec::new())).collect(),
        }
    }

    /// Resize the per-worker queue set, e.g. when the thread pool changes
    /// size. Existing queued vacancies are preserved, redistributed evenly.
    pub fn update_worker_count(&mut self, num_workers: usize) {
        let n = num_workers.max(1);
        let mut drained: Vec<AgentUid> =
            self.reuse_queues.iter().flat_map(|q| q.lock().drain(..).collect::<Vec<_>>()).collect();
        self.reuse_queues = (0..n).map(|_| Mutex::new(Vec::new())).collect();
        for (i, uid) in drained.drain(..).enumerate() {
            self.reuse_queues[i % n].lock().push(uid);
        }
    }

    fn queue_for(&self, worker: WorkerId) -> &Mutex<Vec<AgentUid>> {
        &self.reuse_queues[worker.index() % self.reuse_queues.len()]
    }

    /// Generate a UID with an increasing index (normal mode), or reuse a
    /// vacated index with `reused` incremented by one if this worker's reuse
    /// queue is non-empty (defragmentation mode).
    pub fn generate(&self, worker: WorkerId) -> AgentUid {
        if let Some(uid) = self.queue_for(worker).lock().pop() {
            return AgentUid::with_reused(uid.index(), uid.reused() + 1);
        }
        AgentUid::new(self.counter.fetch_add(1, Ordering::Relaxed))
    }

    /// Offer `uid` back for reuse after its owning agent has been removed.
    pub fn reuse(&self, worker: WorkerId, uid: AgentUid) {
        self.queue_for(worker).lock().push(uid);
    }

    /// The highest index ever handed out in normal mode.
    pub fn highest_index(&self) -> u32 {
        self.counter.load(Ordering::Relaxed)
    }

    /// Scan `map` for vacant slots below the highest issued index and queue
    /// them for reuse on worker 0. Serialized: callers should not issue UIDs
    /// concurrently with this scan.
    pub fn enter_defrag_mode(&self, map: &AgentUidMap<AgentHandle>) {
        let highest = self.highest_index();
        let vacancies: Vec<AgentUid> = map
            .vacant_indices_below(highest)
            .into_iter()
            .map(|idx| AgentUid::with_reused(idx, map.last_reused_at(idx)))
            .collect();
        self.reuse_queues[0].lock().extend(vacancies);
    }

    /// True while any worker still has a queued vacancy to recycle.
    pub fn is_defragmenting(&self) -> bool {
        self.reuse_queues.iter().any(|q| !q.lock().is_empty())
    }
}
