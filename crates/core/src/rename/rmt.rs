//! Register map table — speculative logical→physical renaming.
//!
//! The RMT owns one checkpointed value (the allocation table) plus the free
//! list, and manages the full lifetime of every physical register:
//!
//! - `allocate_reg` pops a fresh physical register for a destination, maps
//!   it, and remembers the *previous* holder of that logical register.
//! - `release_reg` runs at commit and frees the remembered previous holder;
//!   at that point no older in-flight instruction can still read it.
//! - `deallocate_reg` runs at flush and frees the wrong-path allocation
//!   itself; the mapping is rewound separately by checkpoint recovery.
//!
//! Exactly one of release/deallocate fires per allocation. Together with
//! checkpoint recovery this maintains the core invariant: every physical
//! register is in exactly one of {free list, live mapping, backed-up
//! mapping} — never both, never neither.

use tracing::trace;

use crate::checkpoint::{CheckpointMaster, SlotId, ValueHandle};
use crate::common::{ConfigError, LogReg, PhysReg, RenameError, SegmentId};
use crate::config::RenameConfig;
use crate::op::{Op, OpStatus};
use crate::predictor::DepPred;
use crate::rename::free_list::RegisterFreeList;
use crate::stats::RenameStats;

/// The register map table and its free list.
#[derive(Debug)]
pub struct Rmt {
    /// Owning segment of each logical register.
    segment_of: Vec<SegmentId>,
    /// Logical→physical map; checkpointed, so it rewinds on misprediction.
    table: ValueHandle<Vec<PhysReg>>,
    free_list: RegisterFreeList,
    /// Indexed by the *newly allocated* physical register: the previous
    /// holder of the logical register, freed when the allocator commits.
    release_table: Vec<Option<PhysReg>>,
    stats: RenameStats,
}

impl Rmt {
    /// Builds the RMT, registering its allocation table in `slot`.
    ///
    /// Bootstraps the architectural state: every logical register gets one
    /// physical register up front, so `resolve_reg` is total from cycle
    /// zero.
    ///
    /// # Errors
    ///
    /// Rejects configurations where any segment cannot hold its
    /// architectural state plus at least one rename.
    pub fn new(
        master: &mut CheckpointMaster,
        slot: SlotId,
        config: &RenameConfig,
    ) -> Result<Self, ConfigError> {
        if config.segments.is_empty() {
            return Err(ConfigError::NoSegments);
        }

        let mut segment_of = Vec::new();
        let mut capacities = Vec::with_capacity(config.segments.len());
        for (index, seg) in config.segments.iter().enumerate() {
            let segment = SegmentId(index as u8);
            if seg.logical_count == 0 {
                return Err(ConfigError::EmptySegment { segment });
            }
            if seg.physical_count <= seg.logical_count {
                return Err(ConfigError::TooFewPhysicalRegisters {
                    segment,
                    logical: seg.logical_count,
                    physical: seg.physical_count,
                });
            }
            segment_of.extend(std::iter::repeat_n(segment, seg.logical_count as usize));
            capacities.push(seg.physical_count);
        }

        let mut free_list = RegisterFreeList::new(&capacities);

        // Initial mapping: one physical register per logical register. The
        // per-segment headroom check above guarantees these never fail.
        let mut table = Vec::with_capacity(segment_of.len());
        for &segment in &segment_of {
            match free_list.allocate(segment) {
                Ok(phys) => table.push(phys),
                Err(_) => {
                    return Err(ConfigError::TooFewPhysicalRegisters {
                        segment,
                        logical: config.segments[segment.0 as usize].logical_count,
                        physical: config.segments[segment.0 as usize].physical_count,
                    });
                }
            }
        }

        let release_table = vec![None; free_list.total_capacity()];
        let table = master.register(table, slot);

        Ok(Self {
            segment_of,
            table,
            free_list,
            release_table,
            stats: RenameStats::default(),
        })
    }

    /// Number of register segments.
    pub fn segment_count(&self) -> usize {
        self.free_list.segment_count()
    }

    /// Number of logical registers across all segments.
    pub fn logical_count(&self) -> usize {
        self.segment_of.len()
    }

    /// The segment owning a logical register.
    pub fn segment_of(&self, lno: LogReg) -> SegmentId {
        self.segment_of[lno.0 as usize]
    }

    /// Free physical registers in `segment`, for admission bookkeeping.
    pub fn free_count(&self, segment: SegmentId) -> usize {
        self.free_list.free_count(segment)
    }

    /// Current physical register mapped to `lno`. Pure read, no side
    /// effects; safe to call outside the rename flow (e.g. when capturing
    /// architectural state).
    pub fn peek_reg(&self, master: &CheckpointMaster, lno: LogReg) -> PhysReg {
        assert!(
            (lno.0 as usize) < self.segment_of.len(),
            "illegal logical register {lno}"
        );
        master.get(self.table)[lno.0 as usize]
    }

    /// Resolves a source operand to its producer's physical register.
    ///
    /// For a map-table scheme resolution has no side effects, so this
    /// simply delegates to [`peek_reg`](Self::peek_reg).
    pub fn resolve_reg(&self, master: &CheckpointMaster, lno: LogReg) -> PhysReg {
        self.peek_reg(master, lno)
    }

    /// Allocates a physical register for a destination operand.
    ///
    /// Pops from the logical register's segment pool, records the previous
    /// holder for deferred release, and updates the mapping. The caller has
    /// already backed the table up into the op's covering checkpoint, so
    /// the overwrite is recoverable.
    ///
    /// # Errors
    ///
    /// Returns [`RenameError::FreeListExhausted`] if the segment pool is
    /// empty — unreachable after a passing admission check; the error
    /// return (rather than a panic) lets an embedding dispatcher stall
    /// and retry instead.
    pub fn allocate_reg(
        &mut self,
        master: &mut CheckpointMaster,
        op: &Op,
        lno: LogReg,
    ) -> Result<PhysReg, RenameError> {
        assert!(
            (lno.0 as usize) < self.segment_of.len(),
            "illegal logical register {lno}"
        );
        let segment = self.segment_of(lno);
        let phys = self.free_list.allocate(segment)?;

        let table = master.get_mut(self.table);
        let previous = table[lno.0 as usize];
        table[lno.0 as usize] = phys;
        self.release_table[phys.0 as usize] = Some(previous);

        self.stats.allocations += 1;
        trace!(op = %op.serial, %lno, %phys, %previous, "register allocated");
        Ok(phys)
    }

    /// Commit path: frees the previous holder recorded when `phys` was
    /// allocated. `op` is the instruction whose commit triggers the
    /// release, not the owner of the freed register.
    ///
    /// # Panics
    ///
    /// Panics if `phys` has no recorded previous holder — a release
    /// without a matching allocation, or a double release.
    pub fn release_reg(&mut self, op: &Op, lno: LogReg, phys: PhysReg) {
        let segment = self.segment_of(lno);
        let Some(previous) = self.release_table[phys.0 as usize].take() else {
            panic!("release of {phys} without a matching allocation (op {})", op.serial)
        };
        self.free_list.release(segment, previous);
        self.stats.releases += 1;
        trace!(op = %op.serial, %lno, released = %previous, "previous mapping released");
    }

    /// Flush path: returns the wrong-path allocation `phys` itself to the
    /// free list. The mapping is rewound by checkpoint recovery, not here.
    pub fn deallocate_reg(&mut self, op: &Op, lno: LogReg, phys: PhysReg) {
        let segment = self.segment_of(lno);
        self.release_table[phys.0 as usize] = None;
        self.free_list.release(segment, phys);
        self.stats.deallocations += 1;
        trace!(op = %op.serial, %lno, %phys, "wrong-path allocation returned");
    }

    /// Aggregate rename counters.
    pub const fn stats(&self) -> &RenameStats {
        &self.stats
    }
}

impl DepPred for Rmt {
    /// Resolves every source operand, recording the physical registers on
    /// the op in operand order.
    fn resolve(&mut self, master: &CheckpointMaster, op: &mut Op) {
        op.src_phys.clear();
        for index in 0..op.srcs.len() {
            let phys = self.resolve_reg(master, op.srcs[index]);
            op.src_phys.push(phys);
        }
    }

    /// Allocates every destination operand, recording the pairs on the op
    /// for the commit/flush paths.
    fn allocate(&mut self, master: &mut CheckpointMaster, op: &mut Op) -> Result<(), RenameError> {
        for index in 0..op.dsts.len() {
            let logical = op.dsts[index];
            let phys = self.allocate_reg(master, op, logical)?;
            op.renamed_dsts.push(crate::op::RenamedDst { logical, phys });
        }
        Ok(())
    }

    /// Frees the previous holder of every destination the op renamed.
    fn commit(&mut self, _master: &mut CheckpointMaster, op: &mut Op) {
        for index in 0..op.renamed_dsts.len() {
            let renamed = op.renamed_dsts[index];
            self.release_reg(op, renamed.logical, renamed.phys);
        }
    }

    /// Returns every destination the op renamed; a no-op for ops squashed
    /// before rename.
    fn flush(&mut self, _master: &mut CheckpointMaster, op: &mut Op) {
        if op.status == OpStatus::Fetched {
            return;
        }
        for index in 0..op.renamed_dsts.len() {
            let renamed = op.renamed_dsts[index];
            self.deallocate_reg(op, renamed.logical, renamed.phys);
        }
    }

    /// Per-segment admission: every touched segment must have at least as
    /// many free registers as the group's destinations require.
    fn can_allocate(&self, ops: &[Op]) -> bool {
        let mut required = vec![0_usize; self.free_list.segment_count()];
        for op in ops {
            for &dst in &op.dsts {
                required[self.segment_of(dst).0 as usize] += 1;
            }
        }
        required
            .iter()
            .enumerate()
            .all(|(segment, &need)| self.free_list.free_count(SegmentId(segment as u8)) >= need)
    }
}
