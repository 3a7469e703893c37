//! Unit tests for operations, the registry, and the default catalogue.

use dt_agent::{AgentHandle, AgentUid};
use dt_behavior::{Agent, Behavior, Shape, TestAgent};
use dt_core::{BoxIndex, Point3, Step, WorkerId};
use dt_resource::ResourceManager;
use dt_spatial::{SimulationSpace, UniformGridEnvironment};

use crate::operation::{AgentOperation, OpComputeTarget, Operation, StandaloneContext, StandaloneOperation};
use crate::registry::OperationRegistry;

// ── Operation ─────────────────────────────────────────────────────────────────

mod operation {
    use super::*;

    struct CountingAgentOp {
        calls: usize,
    }

    impl AgentOperation for CountingAgentOp {
        fn call(&mut self, _handle: AgentHandle, _agent: &mut dyn Agent) {
            self.calls += 1;
        }
        fn clone_box(&self) -> Box<dyn AgentOperation> {
            Box::new(CountingAgentOp { calls: self.calls })
        }
    }

    #[test]
    fn fires_respects_frequency() {
        let op = Operation::new_agent("counting", 2, Box::new(CountingAgentOp { calls: 0 }));
        assert!(op.fires(Step(0)));
        assert!(!op.fires(Step(1)));
        assert!(op.fires(Step(2)));
        assert!(!op.fires(Step(3)));
    }

    #[test]
    fn load_balancing_default_frequency_fires_only_at_step_zero() {
        let op = OperationRegistry::global().new_operation("load_balancing");
        assert!(op.fires(Step(0)));
        assert!(!op.fires(Step(1)));
        assert!(!op.fires(Step(1_000_000)));
    }

    #[test]
    fn clone_is_independent_of_the_original() {
        let mut op = Operation::new_agent("counting", 1, Box::new(CountingAgentOp { calls: 0 }));
        let mut cloned = op.clone();
        cloned.set_frequency(5);
        assert_eq!(op.frequency(), 1);
        assert_eq!(cloned.frequency(), 5);
    }

    #[test]
    fn accessor_kind_matches_what_was_registered() {
        let agent_op = Operation::new_agent("a", 1, Box::new(CountingAgentOp { calls: 0 }));
        let mut agent_op = agent_op;
        assert!(agent_op.as_agent_op_mut().is_some());
        assert!(agent_op.as_standalone_op_mut().is_none());
    }

    #[test]
    fn unsupported_compute_target_selection_is_fatal() {
        let mut op = Operation::new_agent("a", 1, Box::new(CountingAgentOp { calls: 0 }));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            op.select_compute_target(OpComputeTarget::Cuda);
        }));
        assert!(result.is_err());
    }
}

// ── OperationRegistry ─────────────────────────────────────────────────────────

mod registry {
    use super::*;

    struct NoopStandaloneOp;

    impl StandaloneOperation for NoopStandaloneOp {
        fn call(&mut self, _ctx: &mut StandaloneContext<'_>) {}
        fn clone_box(&self) -> Box<dyn StandaloneOperation> {
            Box::new(NoopStandaloneOp)
        }
    }

    #[test]
    fn new_operation_returns_independent_clones() {
        let registry = OperationRegistry::empty();
        registry.add_operation_impl("noop", OpComputeTarget::Cpu, Box::new(NoopStandaloneOp) as Box<dyn StandaloneOperation>, 1);

        let mut a = registry.new_operation("noop");
        let b = registry.new_operation("noop");
        a.set_frequency(7);
        assert_eq!(a.frequency(), 7);
        assert_eq!(b.frequency(), 1);
    }

    #[test]
    #[should_panic(expected = "operation not found in registry")]
    fn unknown_name_lookup_is_fatal() {
        let registry = OperationRegistry::empty();
        registry.new_operation("does_not_exist");
    }

    #[test]
    #[should_panic(expected = "already has a")]
    fn re_registering_a_taken_target_is_fatal() {
        let registry = OperationRegistry::empty();
        registry.add_operation_impl("noop", OpComputeTarget::Cpu, Box::new(NoopStandaloneOp) as Box<dyn StandaloneOperation>, 1);
        registry.add_operation_impl("noop", OpComputeTarget::Cpu, Box::new(NoopStandaloneOp) as Box<dyn StandaloneOperation>, 1);
    }

    #[test]
    fn global_registry_carries_the_default_catalogue() {
        for name in [
            "set_up_iteration",
            "tear_down_iteration",
            "update_environment",
            "load_balancing",
            "update_staticness",
            "propagate_staticness",
            "behavior",
            "discretization",
        ] {
            assert!(OperationRegistry::global().contains(name), "missing default op: {name}");
        }
        for name in ["bound_space", "diffusion", "visualization", "mechanical_forces"] {
            assert!(!OperationRegistry::global().contains(name), "should not ship a built-in: {name}");
        }
    }
}

// ── Default catalogue behavior ────────────────────────────────────────────────

mod default_ops {
    use super::*;

    struct RecordingBehavior {
        copy_mask: u64,
        remove_mask: u64,
        calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    impl Behavior for RecordingBehavior {
        fn copy_mask(&self) -> u64 {
            self.copy_mask
        }
        fn set_copy_mask(&mut self, mask: u64) {
            self.copy_mask = mask;
        }
        fn remove_mask(&self) -> u64 {
            self.remove_mask
        }
        fn set_remove_mask(&mut self, mask: u64) {
            self.remove_mask = mask;
        }
        fn run(&mut self, _agent: &mut dyn Agent) {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
        fn new_default(&self) -> Box<dyn Behavior> {
            Box::new(RecordingBehavior { copy_mask: 0, remove_mask: 0, calls: self.calls.clone() })
        }
        fn new_copy(&self) -> Box<dyn Behavior> {
            self.new_default()
        }
    }

    /// Delegates every accessor to an inner `TestAgent` but counts calls to
    /// the staticness/discretization hooks, so the default catalogue's
    /// per-agent ops can be checked for the right forwarding without
    /// reaching into `TestAgent`'s (deliberately no-op) internals.
    struct ProbeAgent {
        inner: TestAgent,
        update_staticness_calls: usize,
        propagate_staticness_calls: usize,
        discretization_calls: usize,
    }

    impl Agent for ProbeAgent {
        fn uid(&self) -> AgentUid {
            self.inner.uid()
        }
        fn set_uid(&mut self, uid: AgentUid) {
            self.inner.set_uid(uid);
        }
        fn handle_box_idx(&self) -> BoxIndex {
            self.inner.handle_box_idx()
        }
        fn set_box_idx(&mut self, idx: BoxIndex) {
            self.inner.set_box_idx(idx);
        }
        fn position(&self) -> Point3 {
            self.inner.position()
        }
        fn set_position(&mut self, position: Point3) {
            self.inner.set_position(position);
        }
        fn diameter(&self) -> f64 {
            self.inner.diameter()
        }
        fn set_diameter(&mut self, diameter: f64) {
            self.inner.set_diameter(diameter);
        }
        fn is_static(&self) -> bool {
            self.inner.is_static()
        }
        fn set_static(&mut self, is_static: bool) {
            self.inner.set_static(is_static);
        }
        fn behaviors(&self) -> &[Box<dyn Behavior>] {
            self.inner.behaviors()
        }
        fn add_behavior(&mut self, behavior: Box<dyn Behavior>) {
            self.inner.add_behavior(behavior);
        }
        fn remove_behavior(&mut self, index: usize) -> Option<Box<dyn Behavior>> {
            self.inner.remove_behavior(index)
        }
        fn run_behaviors(&mut self) {
            self.inner.run_behaviors();
        }
        fn lock(&self) -> &parking_lot::Mutex<()> {
            self.inner.lock()
        }
        fn new_default(&self) -> Box<dyn Agent> {
            self.inner.new_default()
        }
        fn new_copy(&self) -> Box<dyn Agent> {
            self.inner.new_copy()
        }
        fn get_shape(&self) -> Shape {
            self.inner.get_shape()
        }
        fn calculate_displacement(&self, force: Point3, squared_radius: f64, dt: f64) -> Point3 {
            self.inner.calculate_displacement(force, squared_radius, dt)
        }
        fn apply_displacement(&mut self, displacement: Point3) {
            self.inner.apply_displacement(displacement);
        }
        fn run_discretization(&mut self) {
            self.discretization_calls += 1;
        }
        fn update_staticness(&mut self) {
            self.update_staticness_calls += 1;
        }
        fn propagate_staticness(&mut self) {
            self.propagate_staticness_calls += 1;
        }
    }

    #[test]
    fn behavior_op_runs_every_attached_behavior() {
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut agent: Box<dyn Agent> = Box::new(TestAgent::new(AgentUid::new(0), Point3::ORIGIN, 1.0));
        agent.add_behavior(Box::new(RecordingBehavior { copy_mask: 0, remove_mask: 0, calls: calls.clone() }));
        agent.add_behavior(Box::new(RecordingBehavior { copy_mask: 0, remove_mask: 0, calls: calls.clone() }));

        let mut op = OperationRegistry::global().new_operation("behavior");
        op.as_agent_op_mut().unwrap().call(AgentHandle::new(0, 0), agent.as_mut());

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn staticness_and_discretization_ops_forward_to_the_named_hook() {
        let mut agent = ProbeAgent {
            inner: TestAgent::new(AgentUid::new(0), Point3::ORIGIN, 1.0),
            update_staticness_calls: 0,
            propagate_staticness_calls: 0,
            discretization_calls: 0,
        };
        let handle = AgentHandle::new(0, 0);

        OperationRegistry::global().new_operation("update_staticness").as_agent_op_mut().unwrap().call(handle, &mut agent);
        OperationRegistry::global().new_operation("propagate_staticness").as_agent_op_mut().unwrap().call(handle, &mut agent);
        OperationRegistry::global().new_operation("discretization").as_agent_op_mut().unwrap().call(handle, &mut agent);

        assert_eq!(agent.update_staticness_calls, 1);
        assert_eq!(agent.propagate_staticness_calls, 1);
        assert_eq!(agent.discretization_calls, 1);
    }

    fn grid_environment() -> UniformGridEnvironment {
        let space = SimulationSpace::fixed([-50, 50, -50, 50, -50, 50], 4.0);
        UniformGridEnvironment::new(space, None)
    }

    #[test]
    fn update_environment_op_rebuilds_the_index() {
        let rm = ResourceManager::new(1);
        rm.add_agent(WorkerId(0), Box::new(TestAgent::new(AgentUid::INVALID, Point3::ORIGIN, 1.0)));
        let mut env = grid_environment();

        let mut ctx = StandaloneContext { resources: &rm, environment: &mut env, step: Step(0) };
        OperationRegistry::global().new_operation("update_environment").as_standalone_op_mut().unwrap().call(&mut ctx);

        assert!(env.dimensions()[1] - env.dimensions()[0] > 0);
    }

    #[test]
    fn tear_down_iteration_op_compacts_pending_removals() {
        let rm = ResourceManager::new(1);
        let uid = rm.add_agent(WorkerId(0), Box::new(TestAgent::new(AgentUid::INVALID, Point3::ORIGIN, 1.0)));
        rm.remove(uid);
        let mut env = grid_environment();

        let mut ctx = StandaloneContext { resources: &rm, environment: &mut env, step: Step(0) };
        OperationRegistry::global().new_operation("tear_down_iteration").as_standalone_op_mut().unwrap().call(&mut ctx);

        assert_eq!(rm.agent_count(), 0);
    }

    #[test]
    fn load_balancing_op_preserves_every_uid() {
        let rm = ResourceManager::new(2);
        let uids: Vec<_> = (0..6)
            .map(|i| rm.add_agent(WorkerId((i % 2) as u16), Box::new(TestAgent::new(AgentUid::INVALID, Point3::ORIGIN, 1.0))))
            .collect();
        let mut env = grid_environment();

        let mut ctx = StandaloneContext { resources: &rm, environment: &mut env, step: Step(0) };
        OperationRegistry::global().new_operation("load_balancing").as_standalone_op_mut().unwrap().call(&mut ctx);

        for uid in uids {
            assert!(rm.get_agent(uid).is_some());
        }
    }

    #[test]
    fn pipeline_correctness_frequency_two_fires_five_times_in_ten_steps() {
        struct SharedCountingOp(std::sync::Arc<std::sync::atomic::AtomicUsize>);
        impl AgentOperation for SharedCountingOp {
            fn call(&mut self, _handle: AgentHandle, _agent: &mut dyn Agent) {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
            fn clone_box(&self) -> Box<dyn AgentOperation> {
                Box::new(SharedCountingOp(self.0.clone()))
            }
        }

        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut op = Operation::new_agent("counting", 2, Box::new(SharedCountingOp(calls.clone())));
        let mut agent: Box<dyn Agent> = Box::new(TestAgent::new(AgentUid::new(0), Point3::ORIGIN, 1.0));
        let handle = AgentHandle::new(0, 0);

        for s in 0..10u64 {
            if op.fires(Step(s)) {
                op.as_agent_op_mut().unwrap().call(handle, agent.as_mut());
            }
        }

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 5);
    }
}
