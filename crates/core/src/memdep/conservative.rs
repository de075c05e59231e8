//! Serializing memory dependency prediction.
//!
//! Keeps two checkpointed globals: the token of the latest store and the
//! token of the latest memory op published so far. Every load waits on the
//! latest store; every store waits on the latest memory op. The result is a
//! total order over memory accesses — violations cannot occur, at the cost
//! of nearly all memory parallelism.
//!
//! Both globals live in the checkpoint substrate: when a misprediction
//! rewinds the rename stream, they roll back to whatever producer was
//! latest at the checkpoint, exactly as if the squashed ops never published.

use crate::checkpoint::{CheckpointMaster, SlotId, ValueHandle};
use crate::common::RenameError;
use crate::op::{Op, OpStatus};
use crate::predictor::DepPred;
use crate::stats::MemDepStats;

use super::dependency::{DepPool, TokenId};
use super::MemDepPred;

/// Predictor serializing all memory ops via two "latest producer" globals.
#[derive(Debug)]
pub struct ConservativeMemDepPred {
    pool: DepPool,
    /// Token of the youngest in-flight store, for loads to wait on.
    latest_store: ValueHandle<Option<TokenId>>,
    /// Token of the youngest in-flight memory op, for stores to wait on.
    latest_mem: ValueHandle<Option<TokenId>>,
    stats: MemDepStats,
}

impl ConservativeMemDepPred {
    /// Creates the predictor, registering its globals in `slot`.
    ///
    /// The globals start at pre-satisfied boundary tokens so that memory
    /// ops renamed before any store still resolve cleanly.
    pub fn new(master: &mut CheckpointMaster, slot: SlotId) -> Self {
        let mut pool = DepPool::new();
        let initial_store = pool.alloc_ready();
        let initial_mem = pool.alloc_ready();
        let latest_store = master.register(Some(initial_store), slot);
        let latest_mem = master.register(Some(initial_mem), slot);
        Self {
            pool,
            latest_store,
            latest_mem,
            stats: MemDepStats::default(),
        }
    }

    /// Shared access to the token pool, for schedulers marking readiness.
    pub const fn pool(&self) -> &DepPool {
        &self.pool
    }

    /// Mutable access to the token pool.
    pub const fn pool_mut(&mut self) -> &mut DepPool {
        &mut self.pool
    }

    fn bind(&mut self, master: &CheckpointMaster, handle: ValueHandle<Option<TokenId>>, op: &mut Op) {
        if let Some(id) = *master.get(handle)
            && self.pool.is_live(id)
        {
            self.pool.retain(id);
            op.src_dep = Some(id);
            self.stats.bindings += 1;
        }
    }

    /// Drops the op's token references and vacates any global that still
    /// names its token.
    fn deallocate(&mut self, master: &mut CheckpointMaster, op: &mut Op) {
        if let Some(dst) = op.dst_dep {
            if *master.get(self.latest_store) == Some(dst) {
                *master.get_mut(self.latest_store) = None;
            }
            if *master.get(self.latest_mem) == Some(dst) {
                *master.get_mut(self.latest_mem) = None;
            }
        }
        if let Some(src) = op.src_dep.take() {
            self.pool.release(src);
        }
        if let Some(dst) = op.dst_dep.take() {
            self.pool.release(dst);
        }
    }
}

impl DepPred for ConservativeMemDepPred {
    /// Loads wait on the latest store; stores wait on the latest memory op.
    fn resolve(&mut self, master: &CheckpointMaster, op: &mut Op) {
        if !op.class.is_mem() {
            return;
        }
        self.stats.resolves += 1;
        if op.class.is_load() {
            self.bind(master, self.latest_store, op);
        } else {
            self.bind(master, self.latest_mem, op);
        }
    }

    /// Stores publish a fresh token and become the latest producer for
    /// both globals.
    fn allocate(&mut self, master: &mut CheckpointMaster, op: &mut Op) -> Result<(), RenameError> {
        if !op.class.is_store() {
            return Ok(());
        }
        let token = match op.dst_dep {
            Some(token) => token,
            None => {
                let token = self.pool.alloc();
                op.dst_dep = Some(token);
                token
            }
        };
        *master.get_mut(self.latest_store) = Some(token);
        *master.get_mut(self.latest_mem) = Some(token);
        self.stats.allocations += 1;
        Ok(())
    }

    fn commit(&mut self, master: &mut CheckpointMaster, op: &mut Op) {
        if op.class.is_mem() {
            self.deallocate(master, op);
        }
    }

    fn flush(&mut self, master: &mut CheckpointMaster, op: &mut Op) {
        if op.status == OpStatus::Fetched {
            return;
        }
        if op.class.is_mem() {
            self.deallocate(master, op);
        }
    }

    fn can_allocate(&self, _ops: &[Op]) -> bool {
        true
    }
}

impl MemDepPred for ConservativeMemDepPred {
    /// Serialization makes violations impossible; one arriving anyway means
    /// the memory system and this predictor disagree about ordering, which
    /// is unrecoverable.
    fn order_conflicted(&mut self, producer: &Op, consumer: &Op) {
        panic!(
            "access order violation ({} -> {}) under conservative memory \
             dependency prediction",
            producer.serial, consumer.serial
        );
    }

    fn mem_dep_stats(&self) -> MemDepStats {
        self.stats
    }
}
