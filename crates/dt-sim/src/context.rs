//! Execution contexts — per-worker staging areas for agent creation/removal
//! and neighbor-query caching during a single timestep.
//!
//! Two variants exist, an "in-place" and a "copy-on-write" execution mode:
//! [`InPlaceExecutionContext`] runs each operation directly against
//! the live agent, so a later operation in the same pipeline sees an
//! earlier one's effects; [`CopyOnWriteExecutionContext`] runs the pipeline
//! against a private copy and only swaps it into storage at commit, so every
//! agent a step processes observes its neighbors exactly as they were at the
//! start of the step.
//!
//! **Cross-thread new-agent visibility.** Ideally any
//! worker's lookup would resolve a brand-new agent another worker created this
//! same iteration, including its live field values. Sharing a `Box<dyn
//! Agent>` still under construction by another thread without `unsafe` code
//! means either an `Arc<Mutex<Box<dyn Agent>>>` per pending agent or a
//! similarly heavy allocation on every single `add_agent` call. This
//! implementation takes a narrower, safe path instead: a lookup originating
//! from the *same* context that created the agent gets full field access
//! ([`AgentLookup::PendingLocal`]); a lookup from a different context gets
//! existence only ([`AgentLookup::PendingElsewhere`]), via the shared
//! [`NewAgentRegistry`]. The common case — an operation creating an agent
//! and immediately consulting it again within the same pipeline call — is
//! fully supported; cross-context field access degrades to "it exists, ask
//! again next step."

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, MappedRwLockReadGuard};

use dt_agent::{AgentHandle, AgentUid};
use dt_behavior::Agent;
use dt_core::WorkerId;
use dt_resource::ResourceManager;
use dt_schedule::Operation;
use dt_spatial::{Environment, Query};

use crate::config::ThreadSafetyMode;

/// The result of looking up a UID during the current iteration.
pub enum AgentLookup<'a> {
    /// Already committed to the resource manager (created in an earlier
    /// step, or this step but already merged in — never true mid-iteration).
    Committed(MappedRwLockReadGuard<'a, dyn Agent>),
    /// Staged by this same context earlier in the current iteration; full
    /// field access via a reference into this context's own pending list.
    PendingLocal(&'a dyn Agent),
    /// Staged by a *different* context this iteration. Known to exist, but
    /// its fields are not reachable until next step's commit.
    PendingElsewhere,
    /// Not live, not pending anywhere this iteration.
    NotFound,
}

/// Announces UIDs staged for creation so other workers' [`AgentLookup`]
/// calls can at least confirm existence this iteration. Cleared once per
/// iteration, after commit.
pub struct NewAgentRegistry {
    announced: Mutex<HashSet<AgentUid>>,
}

impl NewAgentRegistry {
    pub fn new() -> Self {
        Self { announced: Mutex::new(HashSet::new()) }
    }

    fn announce(&self, uid: AgentUid) {
        self.announced.lock().insert(uid);
    }

    pub fn contains(&self, uid: AgentUid) -> bool {
        self.announced.lock().contains(&uid)
    }

    pub fn clear(&self) {
        self.announced.lock().clear();
    }
}

impl Default for NewAgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// One call's worth of cached `(neighbor, squared_distance)` hits, tagged
/// with the squared radius it was populated for.
///
/// The literal design calls for a cache cleared once per agent-processing
/// call and populated on first use; repopulating only when a later call in
/// the same pass asks for a *larger* radius than the cache was built for is
/// an addition beyond that text, to avoid silently returning a
/// radius-truncated neighbor set to a caller that grew its query mid-pass.
#[derive(Default)]
struct NeighborCache {
    squared_radius: f64,
    hits: Vec<(AgentHandle, f64)>,
    populated: bool,
}

impl NeighborCache {
    fn clear(&mut self) {
        self.populated = false;
        self.hits.clear();
    }
}

/// Runs an agent's operation pipeline directly against its live storage
/// slot, so operation `i+1` sees operation `i`'s effects on the same agent.
pub struct InPlaceExecutionContext {
    worker: WorkerId,
    pending_new: Vec<(AgentUid, Box<dyn Agent>)>,
    pending_remove: Vec<AgentUid>,
    registry: Arc<NewAgentRegistry>,
    cache: NeighborCache,
}

impl InPlaceExecutionContext {
    pub fn new(worker: WorkerId, registry: Arc<NewAgentRegistry>) -> Self {
        Self { worker, pending_new: Vec::new(), pending_remove: Vec::new(), registry, cache: NeighborCache::default() }
    }

    /// Stage `agent` for insertion at commit, reserving its UID immediately
    /// so same-iteration lookups (at least from this context) can find it.
    pub fn add_agent(&mut self, resources: &ResourceManager, agent: Box<dyn Agent>) -> AgentUid {
        let uid = resources.reserve_uid(self.worker);
        self.registry.announce(uid);
        self.pending_new.push((uid, agent));
        uid
    }

    /// Stage `uid` for removal at commit; it stays visible to lookups until
    /// then.
    pub fn remove(&mut self, uid: AgentUid) {
        self.pending_remove.push(uid);
    }

    /// Resolve `uid` against the resource manager, then this context's own
    /// pending creations, then the shared registry.
    pub fn get_agent<'a>(&'a self, resources: &'a ResourceManager, uid: AgentUid) -> AgentLookup<'a> {
        if let Some(guard) = resources.get_agent(uid) {
            return AgentLookup::Committed(guard);
        }
        if let Some((_, agent)) = self.pending_new.iter().find(|(u, _)| *u == uid) {
            return AgentLookup::PendingLocal(agent.as_ref());
        }
        if self.registry.contains(uid) {
            return AgentLookup::PendingElsewhere;
        }
        AgentLookup::NotFound
    }

    fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Invoke `callback(handle, squared_distance)` for every neighbor of
    /// `query` within `squared_radius`, backed by the one-call cache: the
    /// first query against a fresh (or radius-grown) cache delegates to
    /// `environment` and records the hits; later calls this same pass replay
    /// the cache, filtered down to the caller's own radius.
    pub fn for_each_neighbor(
        &mut self,
        environment: &dyn Environment,
        query: Query,
        squared_radius: f64,
        callback: &mut dyn FnMut(AgentHandle, f64),
    ) {
        if !self.cache.populated || squared_radius > self.cache.squared_radius {
            self.cache.hits.clear();
            let hits = &mut self.cache.hits;
            environment.for_each_neighbor(query, squared_radius, &mut |handle, d2| hits.push((handle, d2)));
            self.cache.squared_radius = squared_radius;
            self.cache.populated = true;
        }
        for &(handle, d2) in &self.cache.hits {
            if d2 <= squared_radius {
                callback(handle, d2);
            }
        }
    }

    /// Run `ops` against `agent` in declared order, acquiring whatever lock
    /// `thread_safety_mode` calls for first and clearing the neighbor cache
    /// before the first operation runs.
    ///
    /// `UserSpecified` mode has no agent-declared lock set in this design
    /// (see [`ThreadSafetyMode::UserSpecified`]); it falls back to the same
    /// Moore-neighborhood box lock `Automatic` takes, which is a superset of
    /// any lock set an agent could declare against its own neighborhood.
    pub fn execute(
        &mut self,
        environment: &dyn Environment,
        thread_safety_mode: ThreadSafetyMode,
        handle: AgentHandle,
        agent: &mut dyn Agent,
        ops: &mut [&mut Operation],
    ) {
        let _guard = match thread_safety_mode {
            ThreadSafetyMode::None => None,
            ThreadSafetyMode::Automatic | ThreadSafetyMode::UserSpecified => {
                Some(environment.lock_moore_neighborhood(agent.handle_box_idx()))
            }
        };
        self.clear_cache();
        for op in ops.iter_mut() {
            if let Some(agent_op) = op.as_agent_op_mut() {
                agent_op.call(handle, agent);
            }
        }
    }

    /// Drain staged creations and removals into `resources`. Called once per
    /// worker at the end of an iteration, before `tear_down_iteration`
    /// fires.
    pub fn commit(&mut self, resources: &ResourceManager) {
        for (uid, agent) in self.pending_new.drain(..) {
            resources.commit_new(self.worker, uid, agent);
        }
        for uid in self.pending_remove.drain(..) {
            resources.remove(uid);
        }
    }
}

/// Runs an agent's operation pipeline against a private copy, committing the
/// copy in place of the original only at the end of the iteration. Every
/// agent a step processes therefore observes its neighbors exactly as they
/// stood at the start of the step — the pipeline never mutates a neighbor
/// mid-pass, since neighbor queries only ever hand back `(handle,
/// squared_distance)` pairs, never a mutable reference.
pub struct CopyOnWriteExecutionContext {
    worker: WorkerId,
    pending_new: Vec<(AgentUid, Box<dyn Agent>)>,
    pending_remove: Vec<AgentUid>,
    pending_replace: Vec<(AgentUid, Box<dyn Agent>)>,
    registry: Arc<NewAgentRegistry>,
    cache: NeighborCache,
}

impl CopyOnWriteExecutionContext {
    pub fn new(worker: WorkerId, registry: Arc<NewAgentRegistry>) -> Self {
        Self {
            worker,
            pending_new: Vec::new(),
            pending_remove: Vec::new(),
            pending_replace: Vec::new(),
            registry,
            cache: NeighborCache::default(),
        }
    }

    pub fn add_agent(&mut self, resources: &ResourceManager, agent: Box<dyn Agent>) -> AgentUid {
        let uid = resources.reserve_uid(self.worker);
        self.registry.announce(uid);
        self.pending_new.push((uid, agent));
        uid
    }

    pub fn remove(&mut self, uid: AgentUid) {
        self.pending_remove.push(uid);
    }

    pub fn get_agent<'a>(&'a self, resources: &'a ResourceManager, uid: AgentUid) -> AgentLookup<'a> {
        if let Some(guard) = resources.get_agent(uid) {
            return AgentLookup::Committed(guard);
        }
        if let Some((_, agent)) = self.pending_new.iter().find(|(u, _)| *u == uid) {
            return AgentLookup::PendingLocal(agent.as_ref());
        }
        if self.registry.contains(uid) {
            return AgentLookup::PendingElsewhere;
        }
        AgentLookup::NotFound
    }

    fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn for_each_neighbor(
        &mut self,
        environment: &dyn Environment,
        query: Query,
        squared_radius: f64,
        callback: &mut dyn FnMut(AgentHandle, f64),
    ) {
        if !self.cache.populated || squared_radius > self.cache.squared_radius {
            self.cache.hits.clear();
            let hits = &mut self.cache.hits;
            environment.for_each_neighbor(query, squared_radius, &mut |handle, d2| hits.push((handle, d2)));
            self.cache.squared_radius = squared_radius;
            self.cache.populated = true;
        }
        for &(handle, d2) in &self.cache.hits {
            if d2 <= squared_radius {
                callback(handle, d2);
            }
        }
    }

    /// Build a fresh copy of `original` (same UID), run `ops` against the
    /// copy, and stage it for an atomic swap-in at commit. Returns the UID
    /// so the caller can track which copy belongs to which original.
    pub fn execute(&mut self, handle: AgentHandle, original: &dyn Agent, ops: &mut [&mut Operation]) -> AgentUid {
        self.clear_cache();
        let uid = original.uid();
        let mut copy = original.new_copy();
        copy.set_uid(uid);
        for op in ops.iter_mut() {
            if let Some(agent_op) = op.as_agent_op_mut() {
                agent_op.call(handle, copy.as_mut());
            }
        }
        self.pending_replace.push((uid, copy));
        uid
    }

    /// Drain staged creations, removals, and committed copies into
    /// `resources`.
    pub fn commit(&mut self, resources: &ResourceManager) {
        for (uid, agent) in self.pending_new.drain(..) {
            resources.commit_new(self.worker, uid, agent);
        }
        for uid in self.pending_remove.drain(..) {
            resources.remove(uid);
        }
        for (uid, agent) in self.pending_replace.drain(..) {
            resources.replace_agent(uid, agent);
        }
    }
}
