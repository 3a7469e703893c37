//! The `Environment` trait and the agent-source contract it queries against.

use dt_agent::AgentHandle;
use dt_behavior::Agent;
use dt_core::{BoxIndex, GridBounds, Point3};

use crate::SpatialResult;

/// Opaque RAII handle released on drop. Blanket-implemented for every type
/// so [`Environment::lock_moore_neighborhood`] can return "whatever guards
/// this implementation happens to hold" without the trait needing to name
/// them.
pub trait LockGuard {}
impl<T> LockGuard for T {}

/// A non-owning view onto agent storage that an [`Environment`] rebuilds its
/// index from. Implemented by the resource manager; the environment never
/// owns agent data, only cached `(handle, position)` pairs copied out during
/// [`Environment::update`].
pub trait AgentSource: Send + Sync {
    fn agent_count(&self) -> usize;

    /// Number of NUMA partitions backing storage is split across.
    fn num_partitions(&self) -> usize;

    /// Number of live agents in `partition`, used to size parallel slot
    /// arrays that mirror the resource manager's own partitioning.
    fn partition_len(&self, partition: usize) -> usize;

    /// Visit every live agent. `visit` must be safe to call concurrently
    /// across distinct calls (the resource manager drives this in parallel
    /// across NUMA partitions); a single call is never reentered.
    fn for_each_agent_mut(&self, visit: &(dyn Fn(AgentHandle, &mut dyn Agent) + Sync));
}

/// What to center a neighbor search on.
pub enum Query {
    /// Center on a live agent; its own handle is excluded from results and
    /// its cached `box_idx` is used directly instead of being recomputed.
    Agent { handle: AgentHandle, position: Point3 },
    /// Center on an arbitrary point; no handle is excluded.
    Point(Point3),
}

impl Query {
    pub fn position(&self) -> Point3 {
        match self {
            Query::Agent { position, .. } => *position,
            Query::Point(p) => *p,
        }
    }
}

/// Maintains the structure needed to answer "which agents lie within
/// squared distance r² of this point or agent", rebuilt on each [`update`].
///
/// [`update`]: Environment::update
pub trait Environment: Send + Sync {
    /// Rebuild the index from every agent `source` currently holds. Fatal
    /// as a config error if the underlying [`SimulationSpace`](crate::SimulationSpace)
    /// cannot be derived (see its own `update`).
    fn update(&mut self, source: &dyn AgentSource) -> SpatialResult<()>;

    /// Invoke `callback(handle, squared_distance)` for every agent within
    /// `squared_radius` of `query`, excluding the query agent itself when
    /// `query` is [`Query::Agent`].
    ///
    /// Panics if `squared_radius` exceeds the square of the box edge length
    /// (a uniform-grid implementation would need to search beyond its
    /// immediate Moore neighborhood, which is a programming error, not a
    /// recoverable one).
    fn for_each_neighbor(
        &self,
        query: Query,
        squared_radius: f64,
        callback: &mut dyn FnMut(AgentHandle, f64),
    );

    /// The current padded, edge-aligned bounding box.
    fn dimensions(&self) -> GridBounds;

    fn interaction_radius(&self) -> f64;

    /// Acquire whatever internal locks cover `home`'s box plus its 26 Moore
    /// neighbors, in box-index order (deadlock-free lock ordering), for the
    /// `Automatic` thread-safety mode. Released when the returned guard
    /// drops. The default is a no-op guard, for implementations with no
    /// internal per-box locking to offer.
    fn lock_moore_neighborhood<'a>(&'a self, _home: BoxIndex) -> Box<dyn LockGuard + 'a> {
        Box::new(())
    }
}
