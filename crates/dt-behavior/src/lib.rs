//! `dt-behavior` — the `Agent` and `Behavior` capability traits.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                 |
//! |-------------|-----------------------------------------------------------|
//! | [`agent`]   | `Agent` trait, `Shape`, `AgentRef`                        |
//! | [`behavior`]| `Behavior` trait, `NewAgentEvent`                         |
//! | [`noop`]    | `NoopBehavior` — a behavior that never acts               |
//! | [`sample`]  | `TestAgent` — a minimal concrete `Agent` used by tests     |
//! | [`error`]   | `BehaviorError`, `BehaviorResult<T>`                       |
//!
//! # Design notes
//!
//! Polymorphism here is dynamic dispatch rather than the deep-inheritance-
//! plus-reflection approach it is grounded on: concrete agent and behavior
//! kinds are plain structs behind `Box<dyn Agent>` / `Box<dyn Behavior>`.
//! `new_copy`/`new_default` are explicit trait methods rather than reflected
//! constructors, which is what lets the copy-on-write execution context (in
//! `dt-sim`) clone an agent without knowing its concrete type.

pub mod agent;
pub mod behavior;
pub mod error;
pub mod noop;
pub mod sample;


pub use agent::{Agent, AgentRef, Shape};
pub use behavior::{Behavior, NewAgentEvent};
pub use error::{BehaviorError, BehaviorResult};
pub use noop::NoopBehavior;
pub use sample::TestAgent;
