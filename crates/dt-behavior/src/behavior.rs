//! The `Behavior` trait — a unit of per-step logic attached to an agent.

use crate::Agent;

/// Describes why a new agent is being created, so behaviors can decide
/// whether to carry themselves over to it (or remove themselves from the
/// agent that spawned it).
///
/// `event_uid` is a bitfield: a concrete event (cell division, agent
/// removal, a user-defined kind) owns one or more bits, and a behavior's
/// `copy_mask`/`remove_mask` are tested against it with a bitwise AND.
pub struct NewAgentEvent<'a> {
    pub event_uid: u64,
    /// The behavior instance on the agent that triggered this event, if any
    /// — `initialize`'s default implementation copies its masks from here.
    pub existing_behavior: Option<&'a dyn Behavior>,
}

/// A user-attached unit of per-step logic that runs inside an agent's
/// behavior pipeline slot.
///
/// `copy_mask`/`remove_mask` are bitfields tested against a `NewAgentEvent`'s
/// `event_uid`: if the AND is non-zero the behavior is copied to (resp.
/// removed from) the agent involved in that event. The all-zero default
/// means "never copy, never remove".
pub trait Behavior: Send + Sync {
    fn copy_mask(&self) -> u64;
    fn set_copy_mask(&mut self, mask: u64);

    fn remove_mask(&self) -> u64;
    fn set_remove_mask(&mut self, mask: u64);

    /// Always copy this behavior to new agents.
    fn copy_to_new_always(&mut self) {
        self.set_copy_mask(u64::MAX);
    }

    /// Never copy this behavior to new agents.
    fn copy_to_new_never(&mut self) {
        self.set_copy_mask(0);
    }

    /// Always remove this behavior from the existing agent once a new agent
    /// is created from it.
    fn remove_from_existing_always(&mut self) {
        self.set_remove_mask(u64::MAX);
    }

    /// Never remove this behavior from the existing agent.
    fn remove_from_existing_never(&mut self) {
        self.set_remove_mask(0);
    }

    fn will_be_copied(&self, event_uid: u64) -> bool {
        (event_uid & self.copy_mask()) != 0
    }

    fn will_be_removed(&self, event_uid: u64) -> bool {
        (event_uid & self.remove_mask()) != 0
    }

    /// Called once when a new agent carrying this behavior (copied or
    /// freshly attached) is created. Default behavior copies the masks from
    /// the triggering agent's existing instance of this behavior, if any.
    fn initialize(&mut self, event: &NewAgentEvent<'_>) {
        if let Some(existing) = event.existing_behavior {
            self.set_copy_mask(existing.copy_mask());
            self.set_remove_mask(existing.remove_mask());
        }
    }

    /// Called on the existing agent's behavior instance after a
    /// `NewAgentEvent` it was involved in has been processed. Default is a
    /// no-op.
    fn update(&mut self, _event: &NewAgentEvent<'_>) {}

    fn run(&mut self, agent: &mut dyn Agent);

    fn new_default(&self) -> Box<dyn Behavior>;
    fn new_copy(&self) -> Box<dyn Behavior>;
}
