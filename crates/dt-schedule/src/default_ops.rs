//! The default operation catalogue, registered into the process-wide
//! [`OperationRegistry`] the first time it is accessed.
//!
//! Each implementation here is a thin forward onto an `Agent` method or a
//! `ResourceManager`/`Environment` call, mirroring `default_ops.cc`'s
//! `*Op::operator()` bodies. `bound_space`, `diffusion`, `visualization`,
//! and `mechanical_forces` are deliberately absent — they are named slots a
//! caller fills with its own implementation, not built-ins.

use dt_agent::AgentHandle;
use dt_behavior::Agent;

use crate::operation::{AgentOperation, OpComputeTarget, StandaloneContext, StandaloneOperation};
use crate::registry::OperationRegistry;

pub(crate) fn register_defaults(registry: &OperationRegistry) {
    registry.add_operation_impl("set_up_iteration", OpComputeTarget::Cpu, Box::new(SetUpIterationOp) as Box<dyn StandaloneOperation>, 1);
    registry.add_operation_impl("tear_down_iteration", OpComputeTarget::Cpu, Box::new(TearDownIterationOp) as Box<dyn StandaloneOperation>, 1);
    registry.add_operation_impl("update_environment", OpComputeTarget::Cpu, Box::new(UpdateEnvironmentOp) as Box<dyn StandaloneOperation>, 1);
    registry.add_operation_impl("load_balancing", OpComputeTarget::Cpu, Box::new(LoadBalancingOp) as Box<dyn StandaloneOperation>, u64::MAX);
    registry.add_operation_impl("update_staticness", OpComputeTarget::Cpu, Box::new(UpdateStaticnessOp) as Box<dyn AgentOperation>, 1);
    registry.add_operation_impl("propagate_staticness", OpComputeTarget::Cpu, Box::new(PropagateStaticnessOp) as Box<dyn AgentOperation>, 1);
    registry.add_operation_impl("behavior", OpComputeTarget::Cpu, Box::new(BehaviorOp) as Box<dyn AgentOperation>, 1);
    registry.add_operation_impl("discretization", OpComputeTarget::Cpu, Box::new(DiscretizationOp) as Box<dyn AgentOperation>, 1);
}

// ── Standalone ops ──────────────────────────────────────────────────────────

/// Marks the start of an iteration. Per-worker execution-context setup
/// (draining the previous iteration's neighbor cache, resetting pending
/// creation/removal buffers) is the scheduler's job, not this op's — there
/// is nothing left at the resource-manager layer for it to do, so this is a
/// logging-only marker.
struct SetUpIterationOp;

impl StandaloneOperation for SetUpIterationOp {
    fn call(&mut self, ctx: &mut StandaloneContext<'_>) {
        tracing::debug!(step = %ctx.step, "set_up_iteration");
    }

    fn clone_box(&self) -> Box<dyn StandaloneOperation> {
        Box::new(SetUpIterationOp)
    }
}

/// Marks the end of an iteration and compacts deferred removals out of
/// storage. Per-worker commit (merging each execution context's pending new
/// agents into the resource manager) happens in the scheduler immediately
/// before this op fires, mirroring the pseudocode's separate
/// "commit all contexts" step.
struct TearDownIterationOp;

impl StandaloneOperation for TearDownIterationOp {
    fn call(&mut self, ctx: &mut StandaloneContext<'_>) {
        ctx.resources.end_of_iteration();
        tracing::debug!(step = %ctx.step, "tear_down_iteration");
    }

    fn clone_box(&self) -> Box<dyn StandaloneOperation> {
        Box::new(TearDownIterationOp)
    }
}

/// Rebuilds the spatial index from current agent positions. A shape
/// mismatch (or any other reported failure) is a transient warning, not a
/// rolled-back timestep: it is logged and the simulation proceeds with
/// whatever index state `update` managed to leave behind.
struct UpdateEnvironmentOp;

impl StandaloneOperation for UpdateEnvironmentOp {
    fn call(&mut self, ctx: &mut StandaloneContext<'_>) {
        if let Err(err) = ctx.environment.update(ctx.resources) {
            tracing::warn!(step = %ctx.step, %err, "environment update reported an error; continuing");
        }
    }

    fn clone_box(&self) -> Box<dyn StandaloneOperation> {
        Box::new(UpdateEnvironmentOp)
    }
}

/// Reorders agents across NUMA partitions for locality. Registered with
/// `frequency = u64::MAX` so it fires only at step 0 unless a caller
/// re-registers it with a finite frequency.
struct LoadBalancingOp;

impl StandaloneOperation for LoadBalancingOp {
    fn call(&mut self, ctx: &mut StandaloneContext<'_>) {
        ctx.resources.sort_and_balance_numa();
    }

    fn clone_box(&self) -> Box<dyn StandaloneOperation> {
        Box::new(LoadBalancingOp)
    }
}

// ── Agent ops ───────────────────────────────────────────────────────────────

struct UpdateStaticnessOp;

impl AgentOperation for UpdateStaticnessOp {
    fn call(&mut self, _handle: AgentHandle, agent: &mut dyn Agent) {
        agent.update_staticness();
    }

    fn clone_box(&self) -> Box<dyn AgentOperation> {
        Box::new(UpdateStaticnessOp)
    }
}

struct PropagateStaticnessOp;

impl AgentOperation for PropagateStaticnessOp {
    fn call(&mut self, _handle: AgentHandle, agent: &mut dyn Agent) {
        agent.propagate_staticness();
    }

    fn clone_box(&self) -> Box<dyn AgentOperation> {
        Box::new(PropagateStaticnessOp)
    }
}

struct BehaviorOp;

impl AgentOperation for BehaviorOp {
    fn call(&mut self, _handle: AgentHandle, agent: &mut dyn Agent) {
        agent.run_behaviors();
    }

    fn clone_box(&self) -> Box<dyn AgentOperation> {
        Box::new(BehaviorOp)
    }
}

struct DiscretizationOp;

impl AgentOperation for DiscretizationOp {
    fn call(&mut self, _handle: AgentHandle, agent: &mut dyn Agent) {
        agent.run_discretization();
    }

    fn clone_box(&self) -> Box<dyn AgentOperation> {
        Box::new(DiscretizationOp)
    }
}
