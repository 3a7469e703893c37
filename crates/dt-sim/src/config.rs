//! `SimulationConfig` — immutable run-wide settings validated once, before
//! the scheduler's first step.

use crate::{SimError, SimResult};

/// Which of the two agent-pipeline traversal orders the scheduler uses.
///
/// `ForEachAgentForEachOp` (the default) is required by
/// [`CopyOnWriteExecutionContext`][crate::CopyOnWriteExecutionContext];
/// `ForEachOpForEachAgent` gives better cache behavior for a homogeneous
/// operation list but is unsupported by that context.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionOrder {
    #[default]
    ForEachAgentForEachOp,
    ForEachOpForEachAgent,
}

/// How the per-agent pipeline synchronizes access across threads.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ThreadSafetyMode {
    /// No locking; the caller guarantees operations never touch another
    /// agent's mutable state.
    None,
    /// The context locks the environment's Moore neighborhood around each
    /// agent's home box before running its pipeline.
    #[default]
    Automatic,
    /// The agent declares the locks it needs; not implemented by this
    /// scheduler (no agent-declared lock set exists in this design) — kept
    /// as a named variant so a future agent-level API has somewhere to
    /// plug in without a `ThreadSafetyMode` redesign.
    UserSpecified,
}

/// Which execution context kind the scheduler drives agent operations
/// through.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum ExecutionContextKind {
    #[default]
    InPlace,
    CopyOnWrite,
}

/// Immutable run-wide configuration, validated once by
/// [`SchedulerBuilder::build`][crate::SchedulerBuilder::build] before any
/// step runs.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Worker count; `None` resolves to the available parallelism at
    /// startup.
    pub num_threads: Option<usize>,
    pub execution_order: ExecutionOrder,
    pub thread_safety_mode: ThreadSafetyMode,
    pub execution_context_kind: ExecutionContextKind,
    /// Seeds the per-worker deterministic RNGs handed to operations that
    /// need randomness.
    pub seed: u64,
    /// User override for the uniform grid's box edge length.
    pub box_edge_override: Option<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            execution_order: ExecutionOrder::default(),
            thread_safety_mode: ThreadSafetyMode::default(),
            execution_context_kind: ExecutionContextKind::default(),
            seed: 0,
            box_edge_override: None,
        }
    }
}

impl SimulationConfig {
    /// Resolved worker count: `num_threads` if set, else the available
    /// parallelism (falling back to 1 if that can't be read).
    pub fn resolved_num_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
    }

    /// Reject combinations the scheduler cannot honor. Called once by
    /// [`SchedulerBuilder::build`][crate::SchedulerBuilder::build]; never
    /// invoked lazily mid-run.
    pub fn validate(&self) -> SimResult<()> {
        if self.execution_order == ExecutionOrder::ForEachOpForEachAgent
            && self.execution_context_kind == ExecutionContextKind::CopyOnWrite
        {
            return Err(SimError::Config(
                "ForEachOpForEachAgent execution order is not supported by the copy-on-write execution context"
                    .to_string(),
            ));
        }
        if let Some(0) = self.num_threads {
            return Err(SimError::Config("num_threads must be at least 1 when set".to_string()));
        }
        Ok(())
    }
}
