//! `dt-spatial` — simulation space bounds and pluggable spatial environments.
//!
//! # Crate layout
//!
//! | Module           | Contents                                               |
//! |-------------------|--------------------------------------------------------|
//! | [`space`]        | `SimulationSpace`, `Bound<T>`                           |
//! | [`environment`]  | `Environment` trait, `AgentSource` trait, `Query`       |
//! | [`uniform_grid`] | `UniformGridEnvironment` — mandatory reference index    |
//! | [`rtree`]        | `RTreeEnvironment` — R*-tree-backed alternative index   |
//! | [`error`]        | `SpatialError`, `SpatialResult<T>`                      |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to public value types. |

pub mod environment;
pub mod error;
pub mod rtree;
pub mod space;
pub mod uniform_grid;

#[cfg(test)]
mod tests;

pub use environment::{AgentSource, Environment, LockGuard, Query};
pub use error::{SpatialError, SpatialResult};
pub use rtree::RTreeEnvironment;
pub use space::{Bound, SimulationSpace};
pub use uniform_grid::UniformGridEnvironment;
