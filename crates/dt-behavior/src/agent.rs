//! The `Agent` trait — the capability set every simulated entity exposes.

use parking_lot::Mutex;

use dt_agent::{AgentHandle, AgentUid};
use dt_core::{BoxIndex, Point3};

use crate::Behavior;

/// Coarse shape hint an agent reports to downstream collaborators
/// (visualization, discretization). The core never interprets these beyond
/// passing them through.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Shape {
    #[default]
    Sphere,
    Cylinder,
}

/// The capability set every agent kind (cell, generic test agent,
/// user-defined kind) must expose.
///
/// Dynamic dispatch (`Box<dyn Agent>`) stands in for the reflection-driven
/// polymorphism of the source material this crate's behavior comes from:
/// concrete agent kinds are plain structs that implement this trait, and the
/// resource manager stores them behind a trait object.
pub trait Agent: Send + Sync {
    fn uid(&self) -> AgentUid;
    /// Assign the UID issued for this agent at commit time. Concrete kinds
    /// are constructed with [`AgentUid::INVALID`] (via `new_copy`/
    /// `new_default`); only the resource manager calls this, once, right
    /// after the generator hands out the real one.
    fn set_uid(&mut self, uid: AgentUid);

    fn handle_box_idx(&self) -> BoxIndex;
    fn set_box_idx(&mut self, idx: BoxIndex);

    fn position(&self) -> Point3;
    fn set_position(&mut self, position: Point3);

    fn diameter(&self) -> f64;
    fn set_diameter(&mut self, diameter: f64);

    fn is_static(&self) -> bool;
    fn set_static(&mut self, is_static: bool);

    fn behaviors(&self) -> &[Box<dyn Behavior>];
    fn add_behavior(&mut self, behavior: Box<dyn Behavior>);
    /// Remove and return the behavior at `index`, or `None` if out of range.
    ///
    /// If this is called from inside a behavior's own [`Behavior::run`] (one
    /// behavior removing another, or itself, mid-pass), an implementation
    /// must adjust whatever loop cursor [`run_behaviors`](Agent::run_behaviors)
    /// is using so the pass does not skip the behavior that shifted into the
    /// removed slot: decrement the cursor only when `index` is not after it.
    fn remove_behavior(&mut self, index: usize) -> Option<Box<dyn Behavior>>;

    /// Run every behavior once, in slot order. Implementations must tolerate
    /// a behavior calling [`remove_behavior`](Agent::remove_behavior) on
    /// itself or an earlier slot during its own `run` — the standard
    /// approach is to track a loop cursor, temporarily take ownership of the
    /// slot being run (so `self` isn't simultaneously borrowed by its own
    /// behavior list), and re-insert at the cursor's post-run position.
    fn run_behaviors(&mut self);

    /// Per-instance lock for opt-in user synchronization across threads.
    /// The core itself never takes this lock; the *Automatic* thread-safety
    /// mode uses the environment's box-level locks instead.
    fn lock(&self) -> &Mutex<()>;

    /// Create a new instance of the same concrete kind via its default
    /// constructor (a fresh UID, default field values).
    fn new_default(&self) -> Box<dyn Agent>;

    /// Create a deep copy of this agent, including its behaviors, but with a
    /// fresh UID.
    fn new_copy(&self) -> Box<dyn Agent>;

    fn get_shape(&self) -> Shape;

    /// Field names this agent kind would hand to a visualization adapter.
    /// The core never reads these itself.
    fn get_required_vis_data_members(&self) -> Vec<&'static str> {
        vec!["position", "diameter"]
    }

    /// Resolve a requested force into a displacement vector for this agent
    /// kind, given the squared interaction radius considered and the
    /// timestep length.
    fn calculate_displacement(&self, force: Point3, squared_radius: f64, dt: f64) -> Point3;

    fn apply_displacement(&mut self, displacement: Point3);

    /// Hook invoked by the `discretization` operation; default is a no-op
    /// for agent kinds with nothing to discretize.
    fn run_discretization(&mut self) {}

    /// Hook invoked by the `update_staticness` operation; decides whether
    /// this agent has stopped moving and can skip future mechanical/neighbor
    /// work. Default is a no-op — staticness is agent semantics, left to
    /// concrete kinds.
    fn update_staticness(&mut self) {}

    /// Hook invoked by the `propagate_staticness` operation, after
    /// `update_staticness` has run for every agent; lets an agent become
    /// non-static again in response to a neighbor that moved. Default is a
    /// no-op.
    fn propagate_staticness(&mut self) {}
}

/// Convenience used by `ResourceManager`/`Environment` plumbing that needs
/// both a handle and the agent behind it.
pub struct AgentRef<'a> {
    pub handle: AgentHandle,
    pub agent: &'a dyn Agent,
}
