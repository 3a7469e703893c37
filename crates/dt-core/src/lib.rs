//! `dt-core` — foundational types for the agent-based simulation engine.
//!
//! This crate is a dependency of every other `dt-*` crate.  It intentionally
//! has no `dt-*` dependencies and minimal external ones (`rand`, `thiserror`,
//! `tracing`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                              |
//! |-------------|--------------------------------------------------------|
//! | [`ids`]     | `BoxIndex`, `WorkerId`                                |
//! | [`point`]   | `Point3`, `GridBounds`                                |
//! | [`step`]    | `Step`, the discrete timestep counter                 |
//! | [`rng`]     | `WorkerRng` (per-worker), `SimRng` (global)            |
//! | [`error`]   | `DtError`, `DtResult`                                 |
//! | [`logging`] | `init_tracing` — shared `tracing-subscriber` wiring   |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod ids;
pub mod logging;
pub mod point;
pub mod rng;
pub mod step;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{DtError, DtResult};
pub use ids::{BoxIndex, WorkerId};
pub use point::{GridBounds, Point3};
pub use rng::{SimRng, WorkerRng};
pub use step::Step;
