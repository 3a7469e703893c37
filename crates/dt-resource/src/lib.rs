//! `dt-resource` — canonical agent storage and the UID↔handle registry.
//!
//! # Crate layout
//!
//! | Module              | Contents          |
//! |----------------------|-------------------|
//! | [`resource_manager`] | `ResourceManager` |
//!
//! Every `ResourceManager` operation is either infallible or a
//! programming-error panic (a UID collision, a reuse of a still-live UID);
//! there is no configuration-error path of its own, so this crate carries no
//! `error` module of its own.

pub mod resource_manager;

#[cfg(test)]
mod tests;

pub use resource_manager::ResourceManager;
