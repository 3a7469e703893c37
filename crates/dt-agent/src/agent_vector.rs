//! `AgentVector<T>` — a NUMA-partitioned parallel vector indexed by handle.
//!
//! One inner `Vec<T>` per partition; size per partition is tracked so bulk
//! reservation doesn't require walking every element first.

use rayon::prelude::*;

use dt_core::WorkerId;

use crate::AgentHandle;

pub struct AgentVector<T> {
    partitions: Vec<Vec<T>>,
}

impl<T> AgentVector<T> {
    /// One partition per worker/NUMA node.
    pub fn new(num_partitions: usize) -> Self {
        Self { partitions: (0..num_partitions.max(1)).map(|_| Vec::new()).collect() }
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn partition_len(&self, partition: WorkerId) -> usize {
        self.partitions[partition.index()].len()
    }

    pub fn reserve(&mut self, partition: WorkerId, additional: usize) {
        self.partitions[partition.index()].reserve(additional);
    }

    /// Push `value` into `partition`, returning the handle it now lives at.
    pub fn push(&mut self, partition: WorkerId, value: T) -> AgentHandle {
        let slot = &mut self.partitions[partition.index()];
        let idx = slot.len();
        slot.push(value);
        AgentHandle::new(partition.index() as u16, idx as u32)
    }

    pub fn get(&self, handle: AgentHandle) -> Option<&T> {
        self.partitions.get(handle.partition())?.get(handle.slot())
    }

    pub fn get_mut(&mut self, handle: AgentHandle) -> Option<&mut T> {
        self.partitions.get_mut(handle.partition())?.get_mut(handle.slot())
    }

    /// Remove and return the element at `handle` via swap-remove, returning
    /// the handle of whichever element now occupies the vacated slot (if
    /// any) so the caller can fix up its `AgentUidMap` entry.
    pub fn swap_remove(&mut self, handle: AgentHandle) -> (T, Option<AgentHandle>) {
        let partition = &mut self.partitions[handle.partition()];
        let removed = partition.swap_remove(handle.slot());
        let moved = if handle.slot() < partition.len() {
            Some(AgentHandle::new(handle.primary, handle.secondary))
        } else {
            None
        };
        (removed, moved)
    }

    pub fn clear(&mut self) {
        for p in &mut self.partitions {
            p.clear();
        }
    }

    /// Drain every partition into a single `Vec`, partition-then-slot order,
    /// leaving all partitions empty. Used by load-balancing to pull every
    /// element out before redistributing it across a fresh partition layout.
    pub fn drain_all(&mut self) -> Vec<T> {
        self.partitions.iter_mut().flat_map(|p| p.drain(..)).collect()
    }

    /// Iterate `(AgentHandle, &T)` across every partition, in partition-then-slot order.
    pub fn iter(&self) -> impl Iterator<Item = (AgentHandle, &T)> {
        self.partitions.iter().enumerate().flat_map(|(p, slots)| {
            slots.iter().enumerate().map(move |(i, v)| (AgentHandle::new(p as u16, i as u32), v))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (AgentHandle, &mut T)> {
        self.partitions.iter_mut().enumerate().flat_map(|(p, slots)| {
            slots.iter_mut().enumerate().map(move |(i, v)| (AgentHandle::new(p as u16, i as u32), v))
        })
    }

    /// Visit every element, one Rayon task per partition. `visit` must be
    /// safe to call concurrently from distinct partitions; within a
    /// partition, elements are visited sequentially in slot order.
    pub fn par_for_each_mut<F>(&mut self, visit: F)
    where
        T: Send,
        F: Fn(AgentHandle, &mut T) + Sync,
    {
        self.partitions.par_iter_mut().enumerate().for_each(|(p, slots)| {
            for (i, v) in slots.iter_mut().enumerate() {
                visit(AgentHandle::new(p as u16, i as u32), v);
            }
        });
    }

    pub fn len(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> std::ops::Index<AgentHandle> for AgentVector<T> {
    type Output = T;
    fn index(&self, handle: AgentHandle) -> &T {
        &self.partitions[handle.partition()][handle.slot()]
    }
}

impl<T> std::ops::IndexMut<AgentHandle> for AgentVector<T> {
    fn index_mut(&mut self, handle: AgentHandle) -> &mut T {
        &mut self.partitions[handle.partition()][handle.slot()]
    }
}
