//! `RTreeEnvironment` — an alternative spatial index over the same
//! [`Environment`] contract, backed by an R*-tree instead of a uniform grid.
//!
//! Built on `rstar` rather than a hand-rolled kd-tree since that is the
//! spatial-indexing crate already present in this workspace's dependency
//! tree. Full rebuild on every [`update`](Environment::update), same as the
//! uniform grid; no incremental maintenance.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use dt_agent::AgentHandle;
use dt_core::GridBounds;

use crate::environment::{AgentSource, Query};
use crate::{Environment, SimulationSpace, SpatialError, SpatialResult};

#[derive(Clone, Copy)]
struct Entry {
    point: [f64; 3],
    handle: AgentHandle,
}

impl RTreeObject for Entry {
    type Envelope = AABB<[f64; 3]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for Entry {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        let dz = self.point[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

pub struct RTreeEnvironment {
    space: SimulationSpace,
    tree: RTree<Entry>,
}

impl RTreeEnvironment {
    pub fn new(space: SimulationSpace) -> Self {
        Self { space, tree: RTree::new() }
    }
}

impl Environment for RTreeEnvironment {
    fn update(&mut self, source: &dyn AgentSource) -> SpatialResult<()> {
        let count = source.agent_count();
        if count == 0 {
            if self.space.is_bounds_fixed() && self.space.is_radius_fixed() {
                return Ok(());
            }
            return Err(SpatialError::Config(
                "cannot update a derived R-tree environment with zero agents".to_string(),
            ));
        }

        let mut entries = Vec::with_capacity(count);
        let mut samples = Vec::with_capacity(count);
        // Single-threaded: rstar's bulk_load wants the whole set collected
        // up front, so there is no benefit to a parallel visit here.
        source.for_each_agent_mut(&|handle, agent| {
            let p = agent.position();
            samples.push((p, agent.diameter()));
            entries.push(Entry { point: [p.x, p.y, p.z], handle });
        });

        self.space.update(samples.into_iter())?;
        self.tree = RTree::bulk_load(entries);
        Ok(())
    }

    fn for_each_neighbor(
        &self,
        query: Query,
        squared_radius: f64,
        callback: &mut dyn FnMut(AgentHandle, f64),
    ) {
        let exclude = match &query {
            Query::Agent { handle, .. } => Some(*handle),
            Query::Point(_) => None,
        };
        let qpos = query.position();
        let point = [qpos.x, qpos.y, qpos.z];
        for entry in self.tree.locate_within_distance(point, squared_radius) {
            if Some(entry.handle) == exclude {
                continue;
            }
            callback(entry.handle, entry.distance_2(&point));
        }
    }

    fn dimensions(&self) -> GridBounds {
        self.space.whole_space()
    }

    fn interaction_radius(&self) -> f64 {
        self.space.interaction_radius()
    }
}
