//! `AgentUid` — a stable external identity that survives relocation.
//!
//! Two `u32` fields, `index` and `reused`, packed so the pair can be hashed
//! and printed as a single `u64`.  `index` is the slot an
//! [`AgentUidMap`](crate::AgentUidMap) stores the agent's handle at;
//! `reused` counts how many times that slot has been recycled.  Unlike the
//! single-field IDs in `dt-core::ids`, this one is deliberately *not*
//! generated by the `typed_id!` macro: its two-field equality and its
//! dedicated hand-rolled `Ord` (by `reused` first, so a recycled generation
//! always sorts after the one it replaced) don't fit that macro's shape.

use std::fmt;

/// Stable agent identity. See module docs.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentUid {
    index: u32,
    reused: u32,
}

impl AgentUid {
    pub const INVALID: AgentUid = AgentUid { index: u32::MAX, reused: u32::MAX };

    /// A fresh UID for `index`, never before reused.
    #[inline]
    pub fn new(index: u32) -> Self {
        Self { index, reused: 0 }
    }

    #[inline]
    pub fn with_reused(index: u32, reused: u32) -> Self {
        Self { index, reused }
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn reused(self) -> u32 {
        self.reused
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    /// `(reused << 32) | index`, used for hashing and printing.
    #[inline]
    pub fn as_u64(self) -> u64 {
        (u64::from(self.reused) << 32) | u64::from(self.index)
    }
}

impl Default for AgentUid {
    #[inline]
    fn default() -> Self {
        Self::INVALID
    }
}

impl PartialOrd for AgentUid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AgentUid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.reused, self.index).cmp(&(other.reused, other.index))
    }
}

impl fmt::Display for AgentUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.index, self.reused)
    }
}
