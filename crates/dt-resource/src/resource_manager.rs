//! `ResourceManager` — canonical agent storage plus the UID↔handle registry.

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, Mutex, RwLock, RwLockReadGuard,
    RwLockWriteGuard,
};
use rayon::prelude::*;

use dt_agent::{AgentHandle, AgentUid, AgentUidGenerator, AgentUidMap, AgentVector};
use dt_behavior::Agent;
use dt_core::WorkerId;
use dt_spatial::AgentSource;

/// Owns the canonical `AgentVector<Box<dyn Agent>>` and the `AgentUidMap`
/// that lets any UID be resolved to its current handle. Every public method
/// takes `&self`: storage is interior-mutable (an `RwLock` around the
/// vector, a `Mutex` around the pending-removal list) so that agent-facing
/// queries and the environment's `AgentSource` contract — which requires
/// `&self` — can be served without a second storage type. This trades the
/// fully per-partition-independent concurrent writes the external interface
/// contract describes for a single write-lock serializing structural
/// mutation; read-mostly access (`get_agent`, `for_each_agent`) only takes a
/// read lock and never blocks other readers.
pub struct ResourceManager {
    agents: RwLock<AgentVector<Box<dyn Agent>>>,
    uid_map: AgentUidMap<AgentHandle>,
    generator: AgentUidGenerator,
    pending_remove: Mutex<Vec<AgentUid>>,
}

impl ResourceManager {
    pub fn new(num_partitions: usize) -> Self {
        Self {
            agents: RwLock::new(AgentVector::new(num_partitions)),
            uid_map: AgentUidMap::new(),
            generator: AgentUidGenerator::new(num_partitions),
            pending_remove: Mutex::new(Vec::new()),
        }
    }

    pub fn agent_count(&self) -> usize {
        self.agents.read().len()
    }

    /// Append `agent` to `worker`'s partition, issuing it a fresh UID and
    /// registering the resulting handle. Panics if the generator somehow
    /// hands back a UID that is already live — reuse of a live UID is a
    /// programming-error invariant violation, not a recoverable one.
    pub fn add_agent(&self, worker: WorkerId, mut agent: Box<dyn Agent>) -> AgentUid {
        let uid = self.generator.generate(worker);
        assert!(!self.uid_map.contains(uid), "generator issued a UID that is already live: {uid}");
        agent.set_uid(uid);
        let handle = self.agents.write().push(worker, agent);
        self.uid_map.resize(uid.index() as usize + 1);
        self.uid_map.insert(uid, handle);
        uid
    }

    /// Issue a UID for `worker` without inserting any storage yet. Used by an
    /// execution context that needs to hand a brand-new agent a stable
    /// identity immediately (so same-iteration lookups can find it by UID)
    /// while deferring the actual `AgentVector` insertion to
    /// [`commit_new`](Self::commit_new) at the end of the iteration.
    pub fn reserve_uid(&self, worker: WorkerId) -> AgentUid {
        self.generator.generate(worker)
    }

    /// Insert `agent` — already carrying the UID [`reserve_uid`](Self::reserve_uid)
    /// handed out for it — into `worker`'s partition and register the
    /// resulting handle. Panics if `uid` is somehow already live.
    pub fn commit_new(&self, worker: WorkerId, uid: AgentUid, mut agent: Box<dyn Agent>) {
        assert!(!self.uid_map.contains(uid), "commit_new: UID already live: {uid}");
        agent.set_uid(uid);
        let handle = self.agents.write().push(worker, agent);
        self.uid_map.resize(uid.index() as usize + 1);
        self.uid_map.insert(uid, handle);
    }

    /// Overwrite the storage slot `uid` currently occupies with `agent`,
    /// without changing its handle or UID-map entry. Used by the
    /// copy-on-write execution context to atomically swap in a committed
    /// copy at the end of an iteration. Panics if `uid` is not live.
    pub fn replace_agent(&self, uid: AgentUid, mut agent: Box<dyn Agent>) {
        let handle = self.uid_map.lookup(uid);
        agent.set_uid(uid);
        let mut guard = self.agents.write();
        let slot = guard.get_mut(handle).unwrap_or_else(|| panic!("replace_agent: no live agent at {uid}"));
        *slot = agent;
    }

    /// Defer `uid` for removal; the agent stays visible to lookups until
    /// `end_of_iteration` compacts it out. A `uid` that is not currently
    /// live is surfaced as a warning and otherwise ignored.
    pub fn remove(&self, uid: AgentUid) {
        if !self.uid_map.contains(uid) {
            tracing::warn!(%uid, "remove() called for a UID that is not live");
            return;
        }
        self.pending_remove.lock().push(uid);
    }

    pub fn get_agent(&self, uid: AgentUid) -> Option<MappedRwLockReadGuard<'_, dyn Agent>> {
        if !self.uid_map.contains(uid) {
            return None;
        }
        self.get_agent_by_handle(self.uid_map.lookup(uid))
    }

    pub fn get_agent_by_handle(
        &self,
        handle: AgentHandle,
    ) -> Option<MappedRwLockReadGuard<'_, dyn Agent>> {
        let guard = self.agents.read();
        guard.get(handle)?;
        Some(RwLockReadGuard::map(guard, |agents| {
            agents.get(handle).expect("checked present above").as_ref()
        }))
    }

    pub fn get_agent_mut(&self, uid: AgentUid) -> Option<MappedRwLockWriteGuard<'_, dyn Agent>> {
        if !self.uid_map.contains(uid) {
            return None;
        }
        let handle = self.uid_map.lookup(uid);
        let guard = self.agents.write();
        guard.get(handle)?;
        Some(RwLockWriteGuard::map(guard, |agents| {
            agents.get_mut(handle).expect("checked present above").as_mut()
        }))
    }

    /// Visit every live agent once, in partition-then-slot order.
    pub fn for_each_agent(&self, mut visit: impl FnMut(AgentHandle, &dyn Agent)) {
        let guard = self.agents.read();
        for (handle, agent) in guard.iter() {
            visit(handle, agent.as_ref());
        }
    }

    /// Visit every live agent exactly once in parallel (one Rayon task per
    /// NUMA partition), optionally skipping agents `filter` rejects.
    pub fn for_each_agent_parallel(
        &self,
        visit: &(dyn Fn(AgentHandle, &mut dyn Agent) + Sync),
        filter: Option<&(dyn Fn(&dyn Agent) -> bool + Sync)>,
    ) {
        self.agents.write().par_for_each_mut(|handle, agent| {
            if filter.map_or(true, |pred| pred(agent.as_ref())) {
                visit(handle, agent.as_mut());
            }
        });
    }

    /// Reorder agents across NUMA partitions for locality, keyed by each
    /// agent's current box index as a proxy for Morton order — the box
    /// index is itself a row-major flattening of 3D box coordinates, so
    /// sorting by it already clusters spatially close agents, without this
    /// crate needing to know the grid's dimensions to decode full 3D
    /// coordinates back out of it. Invalidates every outstanding
    /// `AgentHandle`; UIDs are unaffected and the UID map is rebuilt.
    pub fn sort_and_balance_numa(&self) {
        let mut guard = self.agents.write();
        let num_partitions = guard.num_partitions().max(1);
        let mut all = guard.drain_all();
        all.sort_by_key(|agent| agent.handle_box_idx().0);

        let mut rebuilt = AgentVector::new(num_partitions);
        let chunk_size = all.len().div_ceil(num_partitions).max(1);
        let new_handles: Vec<(AgentUid, AgentHandle)> = all
            .into_iter()
            .enumerate()
            .map(|(i, agent)| {
                let uid = agent.uid();
                let partition = (i / chunk_size).min(num_partitions - 1) as u16;
                let handle = rebuilt.push(WorkerId(partition), agent);
                (uid, handle)
            })
            .collect();
        *guard = rebuilt;
        drop(guard);

        new_handles.par_iter().for_each(|(uid, handle)| self.uid_map.insert(*uid, *handle));
    }

    /// Compact deferred removals out of storage, fix up the UID map for any
    /// agent a swap-remove relocated, and hand the freed UIDs to the
    /// generator's defragmentation path.
    pub fn end_of_iteration(&self) {
        let mut removed = self.pending_remove.lock();
        if removed.is_empty() {
            return;
        }
        let removed = std::mem::take(&mut *removed);

        let mut guard = self.agents.write();
        for uid in removed {
            if !self.uid_map.contains(uid) {
                continue;
            }
            let handle = self.uid_map.lookup(uid);
            let (_, relocated) = guard.swap_remove(handle);
            self.uid_map.remove(uid);
            if let Some(relocated_handle) = relocated {
                if let Some(relocated_agent) = guard.get(relocated_handle) {
                    self.uid_map.insert(relocated_agent.uid(), relocated_handle);
                }
            }
        }
        drop(guard);

        self.generator.enter_defrag_mode(&self.uid_map);
    }
}

impl AgentSource for ResourceManager {
    fn agent_count(&self) -> usize {
        ResourceManager::agent_count(self)
    }

    fn num_partitions(&self) -> usize {
        self.agents.read().num_partitions()
    }

    fn partition_len(&self, partition: usize) -> usize {
        self.agents.read().partition_len(WorkerId(partition as u16))
    }

    fn for_each_agent_mut(&self, visit: &(dyn Fn(AgentHandle, &mut dyn Agent) + Sync)) {
        self.for_each_agent_parallel(visit, None);
    }
}
