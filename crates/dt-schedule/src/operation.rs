//! `Operation`, `OpComputeTarget`, and the `AgentOperation`/`StandaloneOperation`
//! implementation traits.

use std::collections::HashMap;

use dt_agent::AgentHandle;
use dt_behavior::Agent;
use dt_core::Step;
use dt_resource::ResourceManager;
use dt_spatial::Environment;

/// Which compute backend an operation implementation targets. Only `Cpu` is
/// ever backed by a concrete implementation here; `Cuda`/`OpenCl` exist as
/// enum variants so the same `Operation`/scheduler plumbing could one day
/// dispatch to a GPU kernel without a redesign — no kernel ships with this
/// crate.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum OpComputeTarget {
    Cpu,
    Cuda,
    OpenCl,
}

/// An implementation invoked once per agent, per firing, for every live
/// agent the execution context hands it.
pub trait AgentOperation: Send + Sync {
    fn set_up(&mut self) {}
    fn call(&mut self, handle: AgentHandle, agent: &mut dyn Agent);
    fn tear_down(&mut self) {}
    fn clone_box(&self) -> Box<dyn AgentOperation>;
}

/// Everything a standalone operation needs to do its work: the agent
/// storage it may query or rebalance, the spatial index it may rebuild, and
/// the step currently executing.
pub struct StandaloneContext<'a> {
    pub resources: &'a ResourceManager,
    pub environment: &'a mut dyn Environment,
    pub step: Step,
}

/// An implementation invoked once per firing with no agent argument —
/// environment updates, load balancing, diffusion, visualization.
///
/// `initialize_gpu_data`/`update_cpu_data` bracket `call` only for `Cuda`/
/// `OpenCl`-targeted implementations (the GPU operation shape named in the
/// operation catalogue); the default no-ops mean a CPU-only implementation
/// never has to think about them.
pub trait StandaloneOperation: Send + Sync {
    fn set_up(&mut self, _ctx: &mut StandaloneContext<'_>) {}
    fn initialize_gpu_data(&mut self) {}
    fn call(&mut self, ctx: &mut StandaloneContext<'_>);
    fn update_cpu_data(&mut self) {}
    fn tear_down(&mut self, _ctx: &mut StandaloneContext<'_>) {}
    fn clone_box(&self) -> Box<dyn StandaloneOperation>;
}

enum Body {
    Agent(Box<dyn AgentOperation>),
    Standalone(Box<dyn StandaloneOperation>),
}

impl Body {
    fn clone_body(&self) -> Body {
        match self {
            Body::Agent(op) => Body::Agent(op.clone_box()),
            Body::Standalone(op) => Body::Standalone(op.clone_box()),
        }
    }
}

/// A named, frequency-scheduled unit of work, bundling one implementation
/// per supported [`OpComputeTarget`]. Fires on step `s` iff
/// `s % frequency == 0`.
pub struct Operation {
    name: String,
    frequency: u64,
    active_target: OpComputeTarget,
    implementations: HashMap<OpComputeTarget, Body>,
}

impl Operation {
    /// Build a fresh operation around a single implementation targeting
    /// `target`, which also becomes the active target.
    pub fn new(name: impl Into<String>, frequency: u64, target: OpComputeTarget, body: AnyBody) -> Self {
        let mut implementations = HashMap::new();
        implementations.insert(target, body.0);
        Self { name: name.into(), frequency, active_target: target, implementations }
    }

    pub fn new_agent(name: impl Into<String>, frequency: u64, implementation: Box<dyn AgentOperation>) -> Self {
        Self::new(name, frequency, OpComputeTarget::Cpu, implementation.into())
    }

    pub fn new_standalone(
        name: impl Into<String>,
        frequency: u64,
        implementation: Box<dyn StandaloneOperation>,
    ) -> Self {
        Self::new(name, frequency, OpComputeTarget::Cpu, implementation.into())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    pub fn set_frequency(&mut self, frequency: u64) {
        self.frequency = frequency;
    }

    /// Whether this operation fires on `step`, per its current frequency.
    pub fn fires(&self, step: Step) -> bool {
        step.fires(self.frequency)
    }

    pub fn active_target(&self) -> OpComputeTarget {
        self.active_target
    }

    pub fn is_compute_target_supported(&self, target: OpComputeTarget) -> bool {
        self.implementations.contains_key(&target)
    }

    /// Switch which target's implementation is active. Fatal if that target
    /// has no registered implementation — selecting an unsupported target
    /// is a configuration mistake, not a runtime condition to recover from.
    pub fn select_compute_target(&mut self, target: OpComputeTarget) {
        assert!(
            self.is_compute_target_supported(target),
            "operation '{}' has no implementation for {target:?}",
            self.name
        );
        self.active_target = target;
    }

    /// Register an additional per-target implementation on an
    /// already-constructed operation (e.g. a CUDA implementation alongside
    /// the CPU one). Panics if `target` is already taken.
    pub fn add_implementation(&mut self, target: OpComputeTarget, body: AnyBody) {
        assert!(
            !self.is_compute_target_supported(target),
            "operation '{}' already has a {target:?} implementation",
            self.name
        );
        self.implementations.insert(target, body.0);
    }

    pub fn as_agent_op_mut(&mut self) -> Option<&mut dyn AgentOperation> {
        match self.implementations.get_mut(&self.active_target)? {
            Body::Agent(op) => Some(op.as_mut()),
            Body::Standalone(_) => None,
        }
    }

    pub fn as_standalone_op_mut(&mut self) -> Option<&mut dyn StandaloneOperation> {
        match self.implementations.get_mut(&self.active_target)? {
            Body::Standalone(op) => Some(op.as_mut()),
            Body::Agent(_) => None,
        }
    }

    pub fn is_row_wise(&self) -> bool {
        matches!(self.implementations.get(&self.active_target), Some(Body::Agent(_)))
    }
}

impl Clone for Operation {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            frequency: self.frequency,
            active_target: self.active_target,
            implementations: self.implementations.iter().map(|(t, b)| (*t, b.clone_body())).collect(),
        }
    }
}

/// Opaque wrapper so [`Operation::add_implementation`] takes either
/// implementation kind without exposing the private [`Body`] enum.
pub struct AnyBody(Body);

impl From<Box<dyn AgentOperation>> for AnyBody {
    fn from(op: Box<dyn AgentOperation>) -> Self {
        AnyBody(Body::Agent(op))
    }
}

impl From<Box<dyn StandaloneOperation>> for AnyBody {
    fn from(op: Box<dyn StandaloneOperation>) -> Self {
        AnyBody(Body::Standalone(op))
    }
}
