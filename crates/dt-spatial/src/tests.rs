//! Unit tests for `SimulationSpace` and the spatial environments.

use parking_lot::Mutex;

use dt_agent::{AgentHandle, AgentUid};
use dt_behavior::{Agent, TestAgent};
use dt_core::Point3;

use crate::{AgentSource, Environment, Query, SimulationSpace, UniformGridEnvironment};

struct FakeSource(Mutex<Vec<Box<dyn Agent>>>);

impl FakeSource {
    fn new(agents: Vec<Box<dyn Agent>>) -> Self {
        Self(Mutex::new(agents))
    }

    fn handle_of(&self, index: usize) -> AgentHandle {
        AgentHandle::new(0, index as u32)
    }
}

impl AgentSource for FakeSource {
    fn agent_count(&self) -> usize {
        self.0.lock().len()
    }

    fn num_partitions(&self) -> usize {
        1
    }

    fn partition_len(&self, _partition: usize) -> usize {
        self.0.lock().len()
    }

    fn for_each_agent_mut(&self, visit: &(dyn Fn(AgentHandle, &mut dyn Agent) + Sync)) {
        let mut guard = self.0.lock();
        for (i, agent) in guard.iter_mut().enumerate() {
            visit(AgentHandle::new(0, i as u32), agent.as_mut());
        }
    }
}

fn agent(uid: u32, position: Point3, diameter: f64) -> Box<dyn Agent> {
    Box::new(TestAgent::new(AgentUid::new(uid), position, diameter))
}

#[cfg(test)]
mod simulation_space {
    use super::*;

    #[test]
    fn fixed_update_is_a_no_op_with_zero_agents() {
        let mut space = SimulationSpace::fixed([0, 10, 0, 10, 0, 10], 1.0);
        assert!(space.update(std::iter::empty()).is_ok());
        assert_eq!(space.whole_space(), [0, 10, 0, 10, 0, 10]);
    }

    #[test]
    fn derived_update_fails_with_zero_agents() {
        let mut space = SimulationSpace::derived();
        assert!(space.update(std::iter::empty()).is_err());
    }

    #[test]
    fn derived_update_tracks_agent_extent() {
        let mut space = SimulationSpace::derived();
        let samples = vec![(Point3::new(-1.0, 0.0, 0.0), 2.0), (Point3::new(3.0, 4.0, 5.0), 1.0)];
        space.update(samples).unwrap();
        assert_eq!(space.whole_space(), [-1, 3, 0, 4, 0, 5]);
        assert_eq!(space.interaction_radius(), 2.0);
    }
}

#[cfg(test)]
mod uniform_grid {
    use super::*;

    #[test]
    fn empty_fixed_grid_keeps_configured_bounds() {
        let space = SimulationSpace::fixed([0, 10, 0, 10, 0, 10], 1.0);
        let mut env = UniformGridEnvironment::new(space, Some(5.0));
        let source = FakeSource::new(vec![]);
        assert!(env.update(&source).is_ok());
    }

    #[test]
    fn empty_derived_grid_is_fatal() {
        let space = SimulationSpace::derived();
        let mut env = UniformGridEnvironment::new(space, None);
        let source = FakeSource::new(vec![]);
        assert!(env.update(&source).is_err());
    }

    #[test]
    fn corner_agent_lands_in_first_non_padding_box() {
        let space = SimulationSpace::fixed([0, 20, 0, 20, 0, 20], 1.0);
        let mut env = UniformGridEnvironment::new(space, Some(20.0));
        let source = FakeSource::new(vec![agent(0, Point3::ORIGIN, 1.0)]);
        env.update(&source).unwrap();

        let mut seen = vec![];
        env.for_each_neighbor(Query::Point(Point3::ORIGIN), 1.0, &mut |h, d2| seen.push((h, d2)));
        // Box padding keeps the corner agent out of box 0 (all padding); a
        // point query at its own position should still find it with
        // distance 0, since a point query excludes nothing.
        assert_eq!(seen, vec![(source.handle_of(0), 0.0)]);
    }

    #[test]
    fn identical_positions_report_zero_distance() {
        let space = SimulationSpace::fixed([-10, 10, -10, 10, -10, 10], 1.0);
        let mut env = UniformGridEnvironment::new(space, Some(4.0));
        let source =
            FakeSource::new(vec![agent(0, Point3::ORIGIN, 1.0), agent(1, Point3::ORIGIN, 1.0)]);
        env.update(&source).unwrap();

        let mut found = vec![];
        env.for_each_neighbor(
            Query::Agent { handle: source.handle_of(0), position: Point3::ORIGIN },
            4.0,
            &mut |h, d2| found.push((h, d2)),
        );
        assert_eq!(found, vec![(source.handle_of(1), 0.0)]);
    }

    /// 4x4x4 lattice, spacing 20, diameter 30 (so the box edge, undriven by
    /// any override, is 30), query radius² 900 — the literal scenario.
    /// `uid = i*16 + j*4 + k` with `position = (k*20, j*20, i*20)`, and the
    /// expected neighbor sets below are the ground truth against which this
    /// was checked: of a query point's 7 same-sub-cube lattice neighbors,
    /// the one at the opposite corner of the sub-cube is squared-distance
    /// 1200 away, past the 900 cutoff, so only 6 come back, not all 7.
    fn lattice_agents() -> Vec<Box<dyn Agent>> {
        let mut agents = vec![];
        for i in 0..4i64 {
            for j in 0..4i64 {
                for k in 0..4i64 {
                    let pos = Point3::new((k * 20) as f64, (j * 20) as f64, (i * 20) as f64);
                    agents.push(agent((i * 16 + j * 4 + k) as u32, pos, 30.0));
                }
            }
        }
        agents
    }

    /// `lattice_agents()` assigns `uid == insertion index == handle slot`,
    /// so a found handle's slot doubles as the neighbor's uid.
    fn neighbor_uids(env: &UniformGridEnvironment, handle: AgentHandle, position: Point3) -> Vec<u32> {
        let mut found = vec![];
        env.for_each_neighbor(Query::Agent { handle, position }, 900.0, &mut |h, _d2| found.push(h.slot() as u32));
        found.sort();
        found
    }

    #[test]
    fn moore_neighborhood_covers_adjacent_lattice_points() {
        let space = SimulationSpace::fixed([0, 60, 0, 60, 0, 60], 1.0);
        let mut env = UniformGridEnvironment::new(space, None);

        let agents = lattice_agents();
        let source = FakeSource::new(agents);
        env.update(&source).unwrap();

        assert_eq!(neighbor_uids(&env, source.handle_of(0), Point3::new(0.0, 0.0, 0.0)), vec![1, 4, 5, 16, 17, 20]);
        assert_eq!(
            neighbor_uids(&env, source.handle_of(4), Point3::new(0.0, 20.0, 0.0)),
            vec![0, 1, 5, 8, 9, 16, 20, 21, 24]
        );
        assert_eq!(
            neighbor_uids(&env, source.handle_of(42), Point3::new(40.0, 40.0, 40.0)),
            vec![22, 25, 26, 27, 30, 37, 38, 39, 41, 43, 45, 46, 47, 54, 57, 58, 59, 62]
        );
        assert_eq!(
            neighbor_uids(&env, source.handle_of(63), Point3::new(60.0, 60.0, 60.0)),
            vec![43, 46, 47, 58, 59, 62]
        );
    }

    #[test]
    fn cross_axis_point_probe() {
        let space = SimulationSpace::fixed([-10, 10, -10, 10, -10, 10], 2.0);
        let mut env = UniformGridEnvironment::new(space, None);
        let source = FakeSource::new(vec![
            agent(0, Point3::new(0.0, 0.0, 0.0), 2.0),
            agent(1, Point3::new(5.0, 0.0, 0.0), 4.0),
            agent(2, Point3::new(0.0, -2.5, 0.0), 2.0),
        ]);
        env.update(&source).unwrap();

        let mut hits = vec![];
        env.for_each_neighbor(Query::Point(Point3::new(0.0, -0.8, 0.0)), 4.0, &mut |h, _| {
            hits.push(h)
        });
        assert_eq!(hits.len(), 2);

        let mut far = vec![];
        env.for_each_neighbor(Query::Point(Point3::new(2.5, 0.99, 3.99)), 4.0, &mut |h, _| {
            far.push(h)
        });
        assert!(far.is_empty());
    }

    #[test]
    #[should_panic]
    fn query_radius_larger_than_box_edge_panics() {
        let space = SimulationSpace::fixed([0, 20, 0, 20, 0, 20], 1.0);
        let mut env = UniformGridEnvironment::new(space, Some(5.0));
        let source = FakeSource::new(vec![agent(0, Point3::ORIGIN, 1.0)]);
        env.update(&source).unwrap();
        env.for_each_neighbor(Query::Point(Point3::ORIGIN), 1000.0, &mut |_, _| {});
    }
}

#[cfg(test)]
mod rtree {
    use super::*;
    use crate::RTreeEnvironment;

    #[test]
    fn matches_uniform_grid_on_the_same_agents() {
        let grid_space = SimulationSpace::fixed([-10, 10, -10, 10, -10, 10], 2.0);
        let mut grid = UniformGridEnvironment::new(grid_space, None);

        let tree_space = SimulationSpace::fixed([-10, 10, -10, 10, -10, 10], 2.0);
        let mut tree = RTreeEnvironment::new(tree_space);

        let make_agents = || {
            vec![
                agent(0, Point3::new(0.0, 0.0, 0.0), 2.0),
                agent(1, Point3::new(5.0, 0.0, 0.0), 4.0),
                agent(2, Point3::new(0.0, -2.5, 0.0), 2.0),
            ]
        };
        let grid_source = FakeSource::new(make_agents());
        let tree_source = FakeSource::new(make_agents());
        grid.update(&grid_source).unwrap();
        tree.update(&tree_source).unwrap();

        let mut from_grid = vec![];
        grid.for_each_neighbor(Query::Point(Point3::new(0.0, -0.8, 0.0)), 4.0, &mut |h, d2| {
            from_grid.push((h, d2))
        });
        from_grid.sort_by_key(|(h, _)| *h);

        let mut from_tree = vec![];
        tree.for_each_neighbor(Query::Point(Point3::new(0.0, -0.8, 0.0)), 4.0, &mut |h, d2| {
            from_tree.push((h, d2))
        });
        from_tree.sort_by_key(|(h, _)| *h);

        assert_eq!(from_grid, from_tree);
    }

    #[test]
    fn empty_fixed_update_succeeds() {
        let space = SimulationSpace::fixed([0, 10, 0, 10, 0, 10], 1.0);
        let mut env = RTreeEnvironment::new(space);
        let source = FakeSource::new(vec![]);
        assert!(env.update(&source).is_ok());
    }

    #[test]
    fn empty_derived_update_is_fatal() {
        let space = SimulationSpace::derived();
        let mut env = RTreeEnvironment::new(space);
        let source = FakeSource::new(vec![]);
        assert!(env.update(&source).is_err());
    }
}
