//! `Scheduler` — drives standalone and per-agent operations through a
//! simulation, one call to [`Scheduler::simulate`] per requested step.

use std::sync::Arc;

use parking_lot::Mutex;

use dt_agent::{AgentHandle, AgentUid};
use dt_behavior::Agent;
use dt_core::{Step, WorkerId, WorkerRng};
use dt_resource::ResourceManager;
use dt_schedule::{Operation, OperationRegistry, StandaloneContext};
use dt_spatial::Environment;

use crate::config::{ExecutionContextKind, ExecutionOrder, SimulationConfig, ThreadSafetyMode};
use crate::context::{CopyOnWriteExecutionContext, InPlaceExecutionContext, NewAgentRegistry};
use crate::error::SimResult;

const DEFAULT_PRE_STANDALONE_OPS: &[&str] =
    &["set_up_iteration", "update_environment", "load_balancing", "bound_space", "diffusion", "visualization"];
const DEFAULT_AGENT_OPS: &[&str] =
    &["update_staticness", "behavior", "discretization", "mechanical_forces", "propagate_staticness"];
const DEFAULT_POST_STANDALONE_OPS: &[&str] = &["tear_down_iteration"];

/// Every per-worker execution context owns its own full clone of the agent
/// op list, cloned once at build time. `Operation::call` takes `&mut self`,
/// and an op's state (a counter, say) must not be shared unsynchronized
/// across the parallel per-agent region — giving each worker its own clone
/// keeps every `call()` single-threaded. `set_up`/`tear_down` run once per
/// firing op on the scheduler's canonical list instead (matching the
/// pseudocode's single call); an op that resets state its `call` depends on
/// across workers would not see that reset reflected in the worker clones,
/// a deliberate, documented simplification of the literal pseudocode.
enum WorkerContext {
    InPlace(InPlaceExecutionContext, Vec<Operation>),
    CopyOnWrite(CopyOnWriteExecutionContext, Vec<Operation>),
}

impl WorkerContext {
    fn run_agent(&mut self, environment: &dyn Environment, mode: ThreadSafetyMode, handle: AgentHandle, agent: &mut dyn Agent, step: Step) {
        match self {
            WorkerContext::InPlace(ctx, ops) => {
                let firing: Vec<usize> =
                    ops.iter().enumerate().filter(|(_, op)| op.fires(step)).map(|(i, _)| i).collect();
                let mut slice: Vec<&mut Operation> =
                    ops.iter_mut().enumerate().filter(|(i, _)| firing.contains(i)).map(|(_, op)| op).collect();
                ctx.execute(environment, mode, handle, agent, &mut slice);
            }
            WorkerContext::CopyOnWrite(ctx, ops) => {
                let firing: Vec<usize> =
                    ops.iter().enumerate().filter(|(_, op)| op.fires(step)).map(|(i, _)| i).collect();
                let mut slice: Vec<&mut Operation> =
                    ops.iter_mut().enumerate().filter(|(i, _)| firing.contains(i)).map(|(_, op)| op).collect();
                ctx.execute(handle, agent, &mut slice);
            }
        }
    }

    fn commit(&mut self, resources: &ResourceManager) {
        match self {
            WorkerContext::InPlace(ctx, _) => ctx.commit(resources),
            WorkerContext::CopyOnWrite(ctx, _) => ctx.commit(resources),
        }
    }

    /// Run a single op (by its index in this worker's cloned op list) against
    /// one agent. Used by the per-op-outermost traversal, which only ever
    /// runs against an in-place context — `SimulationConfig::validate`
    /// rejects `ForEachOpForEachAgent` paired with a copy-on-write context
    /// before a `Scheduler` can be built.
    fn run_agent_single_op(
        &mut self,
        environment: &dyn Environment,
        mode: ThreadSafetyMode,
        handle: AgentHandle,
        agent: &mut dyn Agent,
        op_index: usize,
    ) {
        match self {
            WorkerContext::InPlace(ctx, ops) => {
                let mut slice: Vec<&mut Operation> = vec![&mut ops[op_index]];
                ctx.execute(environment, mode, handle, agent, &mut slice);
            }
            WorkerContext::CopyOnWrite(..) => {
                unreachable!("ForEachOpForEachAgent is rejected for copy-on-write contexts by SimulationConfig::validate")
            }
        }
    }
}

fn resolve_ops(names: Vec<String>) -> Vec<Operation> {
    let registry = OperationRegistry::global();
    names.into_iter().filter(|name| registry.contains(name)).map(|name| registry.new_operation(&name)).collect()
}

fn default_names(defaults: &[&str]) -> Vec<String> {
    defaults.iter().map(|s| s.to_string()).collect()
}

fn run_standalone_ops(ops: &mut [Operation], resources: &ResourceManager, environment: &mut dyn Environment, step: Step) {
    for op in ops.iter_mut() {
        if !op.fires(step) {
            continue;
        }
        if let Some(standalone) = op.as_standalone_op_mut() {
            let mut ctx = StandaloneContext { resources, environment: &mut *environment, step };
            standalone.set_up(&mut ctx);
            standalone.call(&mut ctx);
            standalone.tear_down(&mut ctx);
        }
    }
}

/// Fluent builder for [`Scheduler`]: required inputs are a validated
/// [`SimulationConfig`] and a spatial [`Environment`]; the three operation
/// lists default to the catalogue named in the operation-list design,
/// skipping any default name with no registered implementation (so
/// `bound_space`/`diffusion`/`visualization`/`mechanical_forces`, which ship
/// with no built-in body, are silently absent unless a caller registers
/// one).
pub struct SchedulerBuilder {
    config: SimulationConfig,
    environment: Box<dyn Environment>,
    pre_standalone_ops: Option<Vec<String>>,
    agent_ops: Option<Vec<String>>,
    post_standalone_ops: Option<Vec<String>>,
}

impl SchedulerBuilder {
    pub fn new(config: SimulationConfig, environment: Box<dyn Environment>) -> Self {
        Self { config, environment, pre_standalone_ops: None, agent_ops: None, post_standalone_ops: None }
    }

    /// Override the pre-agent standalone op names (default:
    /// [`DEFAULT_PRE_STANDALONE_OPS`]).
    pub fn pre_standalone_ops(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.pre_standalone_ops = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Override the per-agent op names (default: [`DEFAULT_AGENT_OPS`]).
    pub fn agent_ops(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.agent_ops = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Override the post-agent standalone op names (default:
    /// [`DEFAULT_POST_STANDALONE_OPS`]).
    pub fn post_standalone_ops(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.post_standalone_ops = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Validate the config and assemble a ready-to-run [`Scheduler`].
    pub fn build(self) -> SimResult<Scheduler> {
        self.config.validate()?;

        let pre_standalone_ops =
            resolve_ops(self.pre_standalone_ops.unwrap_or_else(|| default_names(DEFAULT_PRE_STANDALONE_OPS)));
        let agent_ops = resolve_ops(self.agent_ops.unwrap_or_else(|| default_names(DEFAULT_AGENT_OPS)));
        let post_standalone_ops =
            resolve_ops(self.post_standalone_ops.unwrap_or_else(|| default_names(DEFAULT_POST_STANDALONE_OPS)));

        let num_workers = self.config.resolved_num_threads();
        let resources = ResourceManager::new(num_workers);
        let new_agent_registry = Arc::new(NewAgentRegistry::new());

        let contexts = (0..num_workers)
            .map(|i| {
                let worker = WorkerId(i as u16);
                let local_ops = agent_ops.clone();
                let ctx = match self.config.execution_context_kind {
                    ExecutionContextKind::InPlace => {
                        WorkerContext::InPlace(InPlaceExecutionContext::new(worker, new_agent_registry.clone()), local_ops)
                    }
                    ExecutionContextKind::CopyOnWrite => WorkerContext::CopyOnWrite(
                        CopyOnWriteExecutionContext::new(worker, new_agent_registry.clone()),
                        local_ops,
                    ),
                };
                Mutex::new(ctx)
            })
            .collect();

        Ok(Scheduler {
            rng: dt_core::SimRng::new(self.config.seed),
            config: self.config,
            resources,
            environment: self.environment,
            pre_standalone_ops,
            agent_ops,
            post_standalone_ops,
            contexts,
            new_agent_registry,
            simulated_steps: 0,
        })
    }
}

/// Drives a simulation: standalone ops, then the parallel per-agent
/// pipeline, then a commit barrier, once per requested step.
pub struct Scheduler {
    config: SimulationConfig,
    resources: ResourceManager,
    environment: Box<dyn Environment>,
    pre_standalone_ops: Vec<Operation>,
    agent_ops: Vec<Operation>,
    post_standalone_ops: Vec<Operation>,
    contexts: Vec<Mutex<WorkerContext>>,
    new_agent_registry: Arc<NewAgentRegistry>,
    rng: dt_core::SimRng,
    simulated_steps: u64,
}

impl Scheduler {
    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn environment(&self) -> &dyn Environment {
        self.environment.as_ref()
    }

    pub fn simulated_steps(&self) -> u64 {
        self.simulated_steps
    }

    /// Insert `agent` directly, outside of any iteration — used to seed a
    /// simulation before the first `simulate` call.
    pub fn add_agent(&self, worker: WorkerId, agent: Box<dyn Agent>) -> AgentUid {
        self.resources.add_agent(worker, agent)
    }

    /// A deterministic RNG for `worker`, derived from this run's seed.
    pub fn worker_rng(&self, worker: WorkerId) -> WorkerRng {
        self.rng.worker_rng(self.config.seed, worker)
    }

    /// Run `n_steps` iterations of:
    ///
    /// 1. pre-agent standalone ops (`set_up_iteration`, `update_environment`,
    ///    `load_balancing`, ...) that fire this step,
    /// 2. the per-agent pipeline, in parallel across NUMA partitions,
    /// 3. a commit barrier draining every worker's staged creations/removals
    ///    into the resource manager,
    /// 4. post-agent standalone ops (`tear_down_iteration`) that fire this
    ///    step.
    pub fn simulate(&mut self, n_steps: u64) -> SimResult<()> {
        for _ in 0..n_steps {
            let step = Step(self.simulated_steps);

            {
                let _span = tracing::debug_span!("standalone_ops", %step, phase = "pre").entered();
                run_standalone_ops(&mut self.pre_standalone_ops, &self.resources, self.environment.as_mut(), step);
            }

            {
                let _span = tracing::debug_span!("agent_pipeline", %step).entered();
                self.run_agent_ops(step);
            }

            {
                let _span = tracing::debug_span!("commit", %step).entered();
                for ctx in &self.contexts {
                    ctx.lock().commit(&self.resources);
                }
                self.new_agent_registry.clear();
            }

            {
                let _span = tracing::debug_span!("standalone_ops", %step, phase = "post").entered();
                run_standalone_ops(&mut self.post_standalone_ops, &self.resources, self.environment.as_mut(), step);
            }

            self.simulated_steps += 1;
        }
        Ok(())
    }

    fn run_agent_ops(&mut self, step: Step) {
        match self.config.execution_order {
            ExecutionOrder::ForEachAgentForEachOp => self.run_agent_ops_agent_outer(step),
            ExecutionOrder::ForEachOpForEachAgent => self.run_agent_ops_op_outer(step),
        }
    }

    /// Per-agent loop outermost: every firing op runs against an agent
    /// before moving to the next agent. Required by the copy-on-write
    /// execution context, since it needs every op in a pipeline call to see
    /// the same agent snapshot.
    fn run_agent_ops_agent_outer(&mut self, step: Step) {
        for op in self.agent_ops.iter_mut() {
            if op.fires(step) {
                if let Some(agent_op) = op.as_agent_op_mut() {
                    agent_op.set_up();
                }
            }
        }

        let environment = self.environment.as_ref();
        let mode = self.config.thread_safety_mode;
        let contexts = &self.contexts;
        self.resources.for_each_agent_parallel(
            &|handle, agent| {
                contexts[handle.partition()].lock().run_agent(environment, mode, handle, agent, step);
            },
            None,
        );

        for op in self.agent_ops.iter_mut() {
            if op.fires(step) {
                if let Some(agent_op) = op.as_agent_op_mut() {
                    agent_op.tear_down();
                }
            }
        }
    }

    /// Per-op loop outermost: a firing op runs against every agent before
    /// the next op starts. Better cache behavior when the agent op list is
    /// homogeneous; unsupported by the copy-on-write context (rejected at
    /// `SimulationConfig::validate` time, so `op_index` always resolves to
    /// an in-place clone here).
    fn run_agent_ops_op_outer(&mut self, step: Step) {
        let environment = self.environment.as_ref();
        let mode = self.config.thread_safety_mode;
        let contexts = &self.contexts;

        for op_index in 0..self.agent_ops.len() {
            if !self.agent_ops[op_index].fires(step) {
                continue;
            }
            if let Some(agent_op) = self.agent_ops[op_index].as_agent_op_mut() {
                agent_op.set_up();
            }

            self.resources.for_each_agent_parallel(
                &|handle, agent| {
                    contexts[handle.partition()].lock().run_agent_single_op(environment, mode, handle, agent, op_index);
                },
                None,
            );

            if let Some(agent_op) = self.agent_ops[op_index].as_agent_op_mut() {
                agent_op.tear_down();
            }
        }
    }
}
