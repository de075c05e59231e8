//! Store-set memory dependency prediction.
//!
//! Learns, per static PC, which stores a load or store has actually
//! conflicted with, and predicts dependence only for learned pairs. Two
//! bounded associative caches hold the learned state:
//!
//! - `store_id_table`: static PC → store-set id. Membership in a set.
//! - `producer_table`: store-set id → the current in-flight producing
//!   store instance, if any.
//!
//! The tables are independent and may evict; absence always means "predict
//! independent", so eviction degrades accuracy, never correctness. The
//! first violation between two PCs mints an id (the producer's PC, a
//! stable value for numeric comparison); later violations propagate or
//! merge ids so that repeat offenders converge into one set within a
//! handful of violations and the same learned static pair never
//! mispredicts again.

use std::collections::HashMap;

use tracing::debug;

use crate::checkpoint::CheckpointMaster;
use crate::common::{OpSerial, RenameError};
use crate::config::StoreSetConfig;
use crate::op::{Op, OpStatus};
use crate::predictor::DepPred;
use crate::stats::{MemDepStats, StoreSetStats};

use super::dependency::{DepPool, TokenId};
use super::MemDepPred;

/// A store-set id: the producer PC that minted the set.
///
/// Using the PC as the id value keeps ids stable across runs and gives the
/// merge rule a total order to agree on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreSetId(pub u64);

/// The current producing instance for a store-set id.
#[derive(Clone, Copy, Debug)]
struct Producer {
    serial: OpSerial,
    token: TokenId,
}

/// The store-set predictor.
#[derive(Debug)]
pub struct StoreSetPred {
    pool: DepPool,
    /// Static PC → store-set id.
    store_id_table: crate::common::SetAssocTable<u64, StoreSetId>,
    /// Store-set id → current producer instance; `None` = vacated.
    producer_table: crate::common::SetAssocTable<StoreSetId, Option<Producer>>,
    /// Which id each in-flight store allocated under. Survives store-id
    /// table evictions until the store commits or flushes, so the producer
    /// entry can always be vacated by exactly the op that claimed it.
    allocated_ids: HashMap<OpSerial, StoreSetId>,
    stats: MemDepStats,
    set_stats: StoreSetStats,
}

impl StoreSetPred {
    /// Creates the predictor with the configured table geometry.
    pub fn new(config: &StoreSetConfig) -> Self {
        Self {
            pool: DepPool::new(),
            store_id_table: crate::common::SetAssocTable::new(
                config.id_table_entry_bits,
                config.id_table_ways,
            ),
            producer_table: crate::common::SetAssocTable::new(
                config.producer_table_entry_bits,
                config.producer_table_ways,
            ),
            allocated_ids: HashMap::new(),
            stats: MemDepStats::default(),
            set_stats: StoreSetStats::default(),
        }
    }

    /// Store-set specific counters.
    pub const fn set_stats(&self) -> &StoreSetStats {
        &self.set_stats
    }

    /// Shared access to the token pool, for schedulers marking readiness.
    pub const fn pool(&self) -> &DepPool {
        &self.pool
    }

    /// Mutable access to the token pool.
    pub const fn pool_mut(&mut self) -> &mut DepPool {
        &mut self.pool
    }

    /// The id currently associated with a PC, if the entry survived.
    fn lookup_id(&mut self, pc: u64) -> Option<StoreSetId> {
        self.store_id_table.read(&pc).copied()
    }

    /// The live producer instance for an id, if one is recorded.
    fn producer_of(&mut self, id: StoreSetId) -> Option<Producer> {
        self.producer_table.read(&id).copied().flatten()
    }

    /// Vacates the producer entry if `op` is the recorded producer for the
    /// id it allocated under. A newer instance of the same set simply stays
    /// recorded.
    fn release_producer(&mut self, op: &Op) {
        let Some(&id) = self.allocated_ids.get(&op.serial) else {
            return;
        };
        if let Some(producer) = self.producer_of(id)
            && producer.serial == op.serial
        {
            let _ = self.producer_table.write(id, None);
        }
    }

    fn deallocate(&mut self, op: &mut Op) {
        self.release_producer(op);
        let _ = self.allocated_ids.remove(&op.serial);
        if let Some(src) = op.src_dep.take() {
            self.pool.release(src);
        }
        if let Some(dst) = op.dst_dep.take() {
            self.pool.release(dst);
        }
    }
}

impl DepPred for StoreSetPred {
    /// A memory op with a learned id binds to that id's current producer,
    /// if one is live.
    fn resolve(&mut self, _master: &CheckpointMaster, op: &mut Op) {
        if !op.class.is_mem() {
            return;
        }
        self.stats.resolves += 1;
        let Some(id) = self.lookup_id(op.pc) else {
            return;
        };
        if let Some(producer) = self.producer_of(id)
            && self.pool.is_live(producer.token)
        {
            self.pool.retain(producer.token);
            op.src_dep = Some(producer.token);
            self.stats.bindings += 1;
        }
    }

    /// A store whose PC belongs to a set publishes itself as the set's
    /// current producer.
    fn allocate(&mut self, _master: &mut CheckpointMaster, op: &mut Op) -> Result<(), RenameError> {
        if !op.class.is_store() {
            return Ok(());
        }
        let Some(id) = self.lookup_id(op.pc) else {
            return Ok(());
        };
        let token = match op.dst_dep {
            Some(token) => token,
            None => {
                let token = self.pool.alloc();
                op.dst_dep = Some(token);
                token
            }
        };
        let _ = self.producer_table.write(
            id,
            Some(Producer {
                serial: op.serial,
                token,
            }),
        );
        let _ = self.allocated_ids.insert(op.serial, id);
        self.stats.allocations += 1;
        Ok(())
    }

    fn commit(&mut self, _master: &mut CheckpointMaster, op: &mut Op) {
        if op.class.is_mem() {
            self.deallocate(op);
        }
    }

    fn flush(&mut self, _master: &mut CheckpointMaster, op: &mut Op) {
        if op.status == OpStatus::Fetched {
            return;
        }
        if op.class.is_mem() {
            self.deallocate(op);
        }
    }

    fn can_allocate(&self, _ops: &[Op]) -> bool {
        true
    }
}

impl MemDepPred for StoreSetPred {
    /// Learns from a violation: mint, propagate, or merge toward the
    /// numerically smaller id.
    fn order_conflicted(&mut self, producer: &Op, consumer: &Op) {
        assert!(
            producer.class.is_store(),
            "violation producer {} is not a store",
            producer.serial
        );
        assert!(
            consumer.class.is_mem(),
            "violation consumer {} is not a memory op",
            consumer.serial
        );
        self.stats.violations += 1;
        debug!(
            producer = %producer.serial, consumer = %consumer.serial,
            "memory order violation"
        );

        let producer_id = self.lookup_id(producer.pc);
        let consumer_id = self.lookup_id(consumer.pc);
        match (producer_id, consumer_id) {
            (None, None) => {
                // First offense for both PCs: mint a set from the
                // producer's PC and reserve its producer entry.
                let id = StoreSetId(producer.pc);
                let _ = self.producer_table.write(id, None);
                let _ = self.store_id_table.write(producer.pc, id);
                let _ = self.store_id_table.write(consumer.pc, id);
                self.set_stats.minted += 1;
            }
            (Some(id), None) => {
                let _ = self.store_id_table.write(consumer.pc, id);
                self.set_stats.propagations += 1;
            }
            (None, Some(id)) => {
                let _ = self.store_id_table.write(producer.pc, id);
                self.set_stats.propagations += 1;
            }
            (Some(pid), Some(cid)) if pid == cid => {
                // Same conflict learned before; the producer instance was
                // simply not in flight this time. Nothing to update.
            }
            (Some(pid), Some(cid)) => {
                // Merge: keep the numerically smaller id, re-point the
                // loser's PC entry.
                if pid < cid {
                    let _ = self.store_id_table.write(consumer.pc, pid);
                } else {
                    // The producer changes sets, so its entry under the old
                    // id goes out of use.
                    self.release_producer(producer);
                    let _ = self.store_id_table.write(producer.pc, cid);
                }
                self.set_stats.merges += 1;
            }
        }
    }

    fn mem_dep_stats(&self) -> MemDepStats {
        self.stats
    }
}
