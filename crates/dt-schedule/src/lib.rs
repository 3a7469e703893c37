//! `dt-schedule` — the `Operation` abstraction and its default catalogue.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                      |
//! |-----------------|----------------------------------------------------------------|
//! | [`operation`]  | `OpComputeTarget`, `AgentOperation`, `StandaloneOperation`, `Operation` |
//! | [`registry`]   | `OperationRegistry` — the process-wide name → prototype map    |
//! | [`default_ops`]| The built-in catalogue: `set_up_iteration`, `behavior`, ...     |
//!
//! Every failure mode this crate has is a registry-lookup/registration
//! mistake (an unknown name, a re-registered `(name, target)` pair) — a
//! programming error with nothing a caller could recover from, not a
//! configuration error — so, like `dt-resource`, this crate carries no
//! `error` module of its own.
//!
//! The `Scheduler` that drives these operations through a simulation lives
//! in `dt-sim`, one layer up; this crate only defines what an operation
//! *is*.

pub mod default_ops;
pub mod operation;
pub mod registry;

#[cfg(test)]
mod tests;

pub use operation::{AgentOperation, AnyBody, OpComputeTarget, Operation, StandaloneContext, StandaloneOperation};
pub use registry::OperationRegistry;
