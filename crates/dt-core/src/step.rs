//! The simulation's discrete timestep counter.
//!
//! The engine advances in integer steps — there is no wall-clock mapping in
//! the core; a containing application that wants one layers it on top of
//! `Step` the same way it layers a behavior/biology DSL on top of `Agent`.

use std::fmt;

/// An absolute simulation step counter, incremented once per completed
/// iteration of the scheduler's `simulate` loop.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step(pub u64);

impl Step {
    pub const ZERO: Step = Step(0);

    #[inline]
    pub fn offset(self, n: u64) -> Step {
        Step(self.0 + n)
    }

    /// Steps elapsed from `earlier` to `self`.
    #[inline]
    pub fn since(self, earlier: Step) -> u64 {
        self.0 - earlier.0
    }

    /// Whether an operation with the given firing `frequency` fires on this step.
    #[inline]
    pub fn fires(self, frequency: u64) -> bool {
        frequency != 0 && self.0 % frequency == 0
    }
}

impl std::ops::Add<u64> for Step {
    type Output = Step;
    #[inline]
    fn add(self, rhs: u64) -> Step {
        Step(self.0 + rhs)
    }
}

impl std::ops::Sub for Step {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Step) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}
