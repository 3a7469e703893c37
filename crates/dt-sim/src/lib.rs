//! `dt-sim` — the scheduler that drives standalone and per-agent operations
//! through a simulation.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                    |
//! |---------------|--------------------------------------------------------------|
//! | [`config`]   | `SimulationConfig`, `ExecutionOrder`, `ThreadSafetyMode`, `ExecutionContextKind` |
//! | [`context`]  | `InPlaceExecutionContext`, `CopyOnWriteExecutionContext`, `AgentLookup`, `NewAgentRegistry` |
//! | [`reduce`]   | `reduce`, `Reducer`, `Counter` — one-pass parallel reductions |
//! | [`scheduler`]| `Scheduler`, `SchedulerBuilder`                               |
//! | [`error`]    | `SimError`, `SimResult`                                       |
//!
//! # Iteration
//!
//! ```text
//! for s in 0..n_steps:
//!     for op in pre_standalone_ops:
//!         if s % op.frequency == 0: op.set_up(); op.call(); op.tear_down()
//!     for op in agent_ops:
//!         if s % op.frequency == 0: op.set_up()
//!     in parallel over all agents a with handle h:
//!         ctx = per_worker_context()
//!         ctx.execute(a, h, ops_firing_this_step)
//!     for op in agent_ops:
//!         if s % op.frequency == 0: op.tear_down()
//!     commit all contexts
//!     for op in post_standalone_ops:
//!         if s % op.frequency == 0: op.set_up(); op.call(); op.tear_down()
//!     simulated_steps += 1
//! ```
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use dt_core::WorkerId;
//! use dt_sim::{SchedulerBuilder, SimulationConfig};
//! use dt_spatial::{SimulationSpace, UniformGridEnvironment};
//!
//! let space = SimulationSpace::fixed([-100, 100, -100, 100, -100, 100], 10.0);
//! let environment = Box::new(UniformGridEnvironment::new(space, None));
//! let mut scheduler = SchedulerBuilder::new(SimulationConfig::default(), environment).build()?;
//! scheduler.add_agent(WorkerId(0), Box::new(my_agent));
//! scheduler.simulate(100)?;
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod reduce;
pub mod scheduler;


pub use config::{ExecutionContextKind, ExecutionOrder, SimulationConfig, ThreadSafetyMode};
pub use context::{AgentLookup, CopyOnWriteExecutionContext, InPlaceExecutionContext, NewAgentRegistry};
pub use error::{SimError, SimResult};
pub use reduce::{reduce, Counter, Reducer};
pub use scheduler::{Scheduler, SchedulerBuilder};
