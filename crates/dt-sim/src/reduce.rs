//! One-pass parallel reductions over the live agent population.
//!
//! A single rayon task per NUMA partition accumulates into its own
//! cache-line-padded slot (no inter-partition contention, matching how
//! [`ResourceManager::for_each_agent_parallel`](dt_resource::ResourceManager::for_each_agent_parallel)
//! already shards work), then the per-partition results fold together with
//! `combine` in a final, deterministic, sequential step.

use parking_lot::Mutex;

use crossbeam_utils::CachePadded;

use dt_behavior::Agent;
use dt_resource::ResourceManager;
use dt_spatial::AgentSource;

fn reduce_filtered<T, M, C>(
    resources: &ResourceManager,
    identity: T,
    map: &M,
    combine: &C,
    filter: Option<&(dyn Fn(&dyn Agent) -> bool + Sync)>,
) -> T
where
    T: Clone + Send,
    M: Fn(&dyn Agent) -> T + Sync,
    C: Fn(&T, &T) -> T + Sync,
{
    let num_partitions = AgentSource::num_partitions(resources).max(1);
    let slots: Vec<CachePadded<Mutex<T>>> =
        (0..num_partitions).map(|_| CachePadded::new(Mutex::new(identity.clone()))).collect();

    resources.for_each_agent_parallel(
        &|handle, agent| {
            let value = map(agent);
            let mut slot = slots[handle.partition()].lock();
            *slot = combine(&slot, &value);
        },
        filter,
    );

    slots.into_iter().map(|slot| slot.into_inner().into_inner()).fold(identity, |acc, v| combine(&acc, &v))
}

/// One-shot parallel reduction: apply `map` to every live agent (optionally
/// skipping those `filter` rejects), fold the results with `combine` from
/// `identity`.
pub fn reduce<T, M, C>(resources: &ResourceManager, identity: T, map: M, combine: C) -> T
where
    T: Clone + Send,
    M: Fn(&dyn Agent) -> T + Sync,
    C: Fn(&T, &T) -> T + Sync,
{
    reduce_filtered(resources, identity, &map, &combine, None)
}

/// A reusable reduction: holds its `map`/`combine`/`identity` so the same
/// accumulation can be re-run every step without the caller re-stating them.
///
/// Rebalancing (`sort_and_balance_numa`) changes agent-to-partition
/// assignment but carries no handle-keyed state into a `Reducer` — each
/// `run` starts from `identity` fresh — so, unlike handle-caching consumers,
/// nothing here needs re-initializing after a rebalance.
pub struct Reducer<T, M, C> {
    identity: T,
    map: M,
    combine: C,
}

impl<T, M, C> Reducer<T, M, C>
where
    T: Clone + Send,
    M: Fn(&dyn Agent) -> T + Sync,
    C: Fn(&T, &T) -> T + Sync,
{
    pub fn new(identity: T, map: M, combine: C) -> Self {
        Self { identity, map, combine }
    }

    pub fn run(&self, resources: &ResourceManager) -> T {
        reduce_filtered(resources, self.identity.clone(), &self.map, &self.combine, None)
    }

    pub fn run_filtered(&self, resources: &ResourceManager, filter: &(dyn Fn(&dyn Agent) -> bool + Sync)) -> T {
        reduce_filtered(resources, self.identity.clone(), &self.map, &self.combine, Some(filter))
    }
}

/// Specialization of [`Reducer`] that counts agents matching `predicate`.
pub struct Counter<P> {
    predicate: P,
}

impl<P> Counter<P>
where
    P: Fn(&dyn Agent) -> bool + Sync,
{
    pub fn new(predicate: P) -> Self {
        Self { predicate }
    }

    pub fn count(&self, resources: &ResourceManager) -> usize {
        reduce(resources, 0usize, |agent| usize::from((self.predicate)(agent)), |a, b| a + b)
    }
}
