//! Always-independent memory dependency prediction.
//!
//! Predicts that no memory op depends on any earlier one, so every
//! lifecycle call is a no-op. Violations are expected; they are counted and
//! repaired by the memory system's own replay, never learned from.

use crate::checkpoint::CheckpointMaster;
use crate::common::RenameError;
use crate::op::Op;
use crate::predictor::DepPred;
use crate::stats::MemDepStats;

use super::MemDepPred;

/// The null predictor: maximum parallelism, maximum violations.
#[derive(Debug, Default)]
pub struct OptimisticMemDepPred {
    stats: MemDepStats,
}

impl OptimisticMemDepPred {
    /// Creates the predictor.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DepPred for OptimisticMemDepPred {
    fn resolve(&mut self, _master: &CheckpointMaster, op: &mut Op) {
        if op.class.is_mem() {
            self.stats.resolves += 1;
        }
    }

    fn allocate(&mut self, _master: &mut CheckpointMaster, _op: &mut Op) -> Result<(), RenameError> {
        Ok(())
    }

    fn commit(&mut self, _master: &mut CheckpointMaster, _op: &mut Op) {}

    fn flush(&mut self, _master: &mut CheckpointMaster, _op: &mut Op) {}

    /// Memory dependencies hold no physical registers, so allocation never
    /// fails.
    fn can_allocate(&self, _ops: &[Op]) -> bool {
        true
    }
}

impl MemDepPred for OptimisticMemDepPred {
    fn order_conflicted(&mut self, _producer: &Op, _consumer: &Op) {
        self.stats.violations += 1;
    }

    fn mem_dep_stats(&self) -> MemDepStats {
        self.stats
    }
}
