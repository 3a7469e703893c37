//! A no-op behavior — never does anything, carries no state.

use crate::Behavior;

/// A [`Behavior`] that never acts and is never copied or removed by default.
///
/// Useful as a placeholder in tests or for agents that simply occupy space.
#[derive(Clone, Copy, Default)]
pub struct NoopBehavior {
    copy_mask: u64,
    remove_mask: u64,
}

impl Behavior for NoopBehavior {
    fn copy_mask(&self) -> u64 {
        self.copy_mask
    }

    fn set_copy_mask(&mut self, mask: u64) {
        self.copy_mask = mask;
    }

    fn remove_mask(&self) -> u64 {
        self.remove_mask
    }

    fn set_remove_mask(&mut self, mask: u64) {
        self.remove_mask = mask;
    }

    fn run(&mut self, _agent: &mut dyn crate::Agent) {}

    fn new_default(&self) -> Box<dyn Behavior> {
        Box::new(NoopBehavior::default())
    }

    fn new_copy(&self) -> Box<dyn Behavior> {
        Box::new(*self)
    }
}
