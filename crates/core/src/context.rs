//! The simulation context: explicit ownership of all speculative state.
//!
//! Simulators of this kind often lean on global singletons; here the
//! checkpoint master, the renamer, and the memory-dependency predictor are
//! gathered into one [`SimContext`] owned by the top-level driver and
//! threaded through every call. Multiple contexts — multi-core models,
//! parallel test runs — coexist freely in one process.
//!
//! The context also offers per-op drivers —
//! [`rename_op`](SimContext::rename_op), [`commit_op`](SimContext::commit_op)
//! and [`flush_op`](SimContext::flush_op) — that sequence the two predictor
//! families and the op status correctly. Pipelines with unusual stage
//! structure may instead drive `rmt` and `mem_dep` directly under the same
//! contract.

use crate::checkpoint::{CheckpointId, CheckpointMaster, SlotId};
use crate::common::RenameError;
use crate::config::Config;
use crate::memdep::{self, MemDepPred};
use crate::op::{Op, OpStatus};
use crate::predictor::DepPred;
use crate::rename::Rmt;

/// All speculative state of one simulated core.
pub struct SimContext {
    /// The checkpoint substrate.
    pub master: CheckpointMaster,
    /// Checkpoint chain for fetch-stage state (PCs, history registers).
    pub fetch_slot: SlotId,
    /// Checkpoint chain for rename-stage state (RMT, predictor globals).
    pub rename_slot: SlotId,
    /// The register renamer.
    pub rmt: Rmt,
    /// The configured memory-dependency predictor.
    pub mem_dep: Box<dyn MemDepPred>,
}

impl std::fmt::Debug for SimContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimContext")
            .field("master", &self.master)
            .field("rmt", &self.rmt)
            .finish_non_exhaustive()
    }
}

impl SimContext {
    /// Builds a context from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`ConfigError`](crate::common::ConfigError)
    /// if the configuration is inconsistent.
    pub fn build(config: &Config) -> Result<Self, crate::common::ConfigError> {
        config.validate()?;
        let mut master = CheckpointMaster::new(config.checkpoint.capacity);
        let fetch_slot = master.add_slot("fetch");
        let rename_slot = master.add_slot("rename");
        let rmt = Rmt::new(&mut master, rename_slot, &config.rename)?;
        let mem_dep = memdep::build_predictor(&config.mem_dep, &mut master, rename_slot);
        Ok(Self {
            master,
            fetch_slot,
            rename_slot,
            rmt,
            mem_dep,
        })
    }

    /// Admission check for a rename group: registers, predictor state, and
    /// one checkpoint must all be allocatable, or the whole group stalls.
    pub fn can_rename(&self, ops: &[Op]) -> bool {
        self.rmt.can_allocate(ops)
            && self.mem_dep.can_allocate(ops)
            && self.master.can_create(self.rename_slot, 1)
    }

    /// Opens a speculative window: creates a rename checkpoint and backs up
    /// every rename-slot value into it.
    pub fn open_window(&mut self) -> CheckpointId {
        let cp = self.master.new_checkpoint(self.rename_slot);
        self.master.backup(cp);
        cp
    }

    /// Renames one instruction: resolves sources, then allocates
    /// destinations, registers first, then memory dependencies.
    ///
    /// # Errors
    ///
    /// Propagates free-list exhaustion; see [`Rmt::allocate_reg`].
    ///
    /// # Panics
    ///
    /// Panics if the op is not in the fetched state (double rename, or
    /// rename after flush).
    pub fn rename_op(&mut self, op: &mut Op) -> Result<(), RenameError> {
        assert!(
            op.status == OpStatus::Fetched,
            "op {} renamed in state {:?}",
            op.serial,
            op.status
        );
        self.rmt.resolve(&self.master, op);
        self.rmt.allocate(&mut self.master, op)?;
        self.mem_dep.resolve(&self.master, op);
        self.mem_dep.allocate(&mut self.master, op)?;
        op.status = OpStatus::Renamed;
        Ok(())
    }

    /// Retires one instruction, releasing what its rename made dead.
    ///
    /// # Panics
    ///
    /// Panics unless the op is in the renamed state: committing a flushed
    /// or already-committed op is a protocol violation.
    pub fn commit_op(&mut self, op: &mut Op) {
        assert!(
            op.status == OpStatus::Renamed,
            "op {} committed in state {:?}",
            op.serial,
            op.status
        );
        self.rmt.commit(&mut self.master, op);
        self.mem_dep.commit(&mut self.master, op);
        op.status = OpStatus::Committed;
    }

    /// Squashes one wrong-path instruction, returning its allocations.
    ///
    /// The caller recovers the covering checkpoint separately, after every
    /// squashed op has been flushed.
    ///
    /// # Panics
    ///
    /// Panics if the op already committed or flushed.
    pub fn flush_op(&mut self, op: &mut Op) {
        assert!(
            op.status == OpStatus::Fetched || op.status == OpStatus::Renamed,
            "op {} flushed in state {:?}",
            op.serial,
            op.status
        );
        self.rmt.flush(&mut self.master, op);
        self.mem_dep.flush(&mut self.master, op);
        op.status = OpStatus::Flushed;
    }
}
