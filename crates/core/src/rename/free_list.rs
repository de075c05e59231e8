//! Per-segment physical register free pools.

use std::collections::VecDeque;

use crate::common::{PhysReg, RenameError, SegmentId};

/// Free pools of physical registers, one FIFO per segment.
///
/// Physical ids are assigned contiguously across segments at construction:
/// segment 0 owns ids `0..cap0`, segment 1 owns `cap0..cap0+cap1`, and so
/// on. Allocation pops from the front and release pushes to the back, so a
/// register just released is the last to be reused — which keeps stale
/// readers (a modeling bug) loud instead of accidentally coherent.
#[derive(Clone, Debug)]
pub struct RegisterFreeList {
    segments: Vec<VecDeque<PhysReg>>,
    total_capacity: usize,
}

impl RegisterFreeList {
    /// Builds the pools from per-segment capacities, all registers free.
    pub fn new(capacities: &[u16]) -> Self {
        let mut segments = Vec::with_capacity(capacities.len());
        let mut next = 0_u16;
        for &capacity in capacities {
            let mut pool = VecDeque::with_capacity(capacity as usize);
            for _ in 0..capacity {
                pool.push_back(PhysReg(next));
                next += 1;
            }
            segments.push(pool);
        }
        Self {
            segments,
            total_capacity: next as usize,
        }
    }

    /// Number of segments.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Total physical registers across all segments, free or not.
    #[inline]
    pub const fn total_capacity(&self) -> usize {
        self.total_capacity
    }

    /// Free registers currently in `segment`'s pool.
    #[inline]
    pub fn free_count(&self, segment: SegmentId) -> usize {
        self.segments[segment.0 as usize].len()
    }

    /// Pops a free register from `segment`.
    pub fn allocate(&mut self, segment: SegmentId) -> Result<PhysReg, RenameError> {
        self.segments[segment.0 as usize]
            .pop_front()
            .ok_or(RenameError::FreeListExhausted { segment })
    }

    /// Returns `id` to `segment`'s pool.
    pub fn release(&mut self, segment: SegmentId, id: PhysReg) {
        debug_assert!(
            !self.segments[segment.0 as usize].contains(&id),
            "physical register {id} released while already free"
        );
        self.segments[segment.0 as usize].push_back(id);
    }
}
