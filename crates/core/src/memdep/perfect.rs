//! Oracle-driven memory dependency prediction.
//!
//! An external pre-executing oracle (a forward emulator running ahead of
//! the timing model) stamps every correct-path memory op with its effective
//! address before rename. With exact addresses in hand, a consumer binds to
//! precisely the youngest older store it truly overlaps — no learning, no
//! misprediction. Useful as the upper bound when evaluating the real
//! predictors.
//!
//! Wrong-path ops have no oracle result. A wrong-path load receives a fresh
//! never-satisfied token so it cannot speculatively issue and fault on a
//! garbage address; wrong-path stores execute harmlessly and get nothing.

use std::collections::VecDeque;

use crate::checkpoint::CheckpointMaster;
use crate::common::{OpSerial, RenameError};
use crate::op::{MemAccess, Op, OpStatus};
use crate::predictor::DepPred;
use crate::stats::MemDepStats;

use super::dependency::{DepPool, TokenId};
use super::MemDepPred;

/// One in-flight memory op, program order.
#[derive(Clone, Copy, Debug)]
struct InflightMem {
    serial: OpSerial,
    is_store: bool,
    access: Option<MemAccess>,
    token: TokenId,
}

/// The oracle-backed predictor.
#[derive(Debug)]
pub struct PerfectMemDepPred {
    pool: DepPool,
    /// In-flight memory ops, oldest first.
    inflight: VecDeque<InflightMem>,
    /// Natural alignment for the store-store overlap rule.
    alignment: u64,
    stats: MemDepStats,
}

impl PerfectMemDepPred {
    /// Creates the predictor; `alignment` is the maximum access size the
    /// target ISA allows (used for the store-store aligned-window rule).
    pub fn new(alignment: u64) -> Self {
        assert!(
            alignment.is_power_of_two(),
            "memory access alignment must be a power of two"
        );
        Self {
            pool: DepPool::new(),
            inflight: VecDeque::new(),
            alignment,
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

    /// Finds the youngest older store that overlaps `access` under the
    /// rule for `consumer_is_store`.
    fn find_producer(
        &self,
        serial: OpSerial,
        access: MemAccess,
        consumer_is_store: bool,
    ) -> Option<TokenId> {
        for entry in self.inflight.iter().rev() {
            if entry.serial >= serial || !entry.is_store {
                continue;
            }
            // Wrong-path stores have no oracle result and cannot conflict.
            let Some(producer_access) = entry.access else {
                continue;
            };
            let overlaps = if consumer_is_store {
                // A store orders against any store touching the same
                // aligned window: with partial writes the byte-exact rule
                // cannot name a unique producer for a later load.
                access.overlaps_aligned(&producer_access, self.alignment)
            } else {
                access.overlaps(&producer_access)
            };
            if overlaps {
                return Some(entry.token);
            }
        }
        None
    }

    fn deallocate(&mut self, op: &mut Op) {
        if let Some(pos) = self.inflight.iter().position(|e| e.serial == op.serial) {
            let _ = self.inflight.remove(pos);
        }
        if let Some(src) = op.src_dep.take() {
            self.pool.release(src);
        }
        if let Some(dst) = op.dst_dep.take() {
            self.pool.release(dst);
        }
    }
}

impl DepPred for PerfectMemDepPred {
    fn resolve(&mut self, _master: &CheckpointMaster, op: &mut Op) {
        if !op.class.is_mem() {
            return;
        }
        self.stats.resolves += 1;

        let Some(access) = op.mem_access else {
            if op.class.is_load() {
                // Wrong path: pin the load behind a dependency that never
                // satisfies.
                op.src_dep = Some(self.pool.alloc());
            }
            return;
        };

        if let Some(token) = self.find_producer(op.serial, access, op.class.is_store()) {
            self.pool.retain(token);
            op.src_dep = Some(token);
            self.stats.bindings += 1;
        }
    }

    /// Every memory op publishes a token and joins the in-flight list.
    fn allocate(&mut self, _master: &mut CheckpointMaster, op: &mut Op) -> Result<(), RenameError> {
        if !op.class.is_mem() {
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
        self.inflight.push_back(InflightMem {
            serial: op.serial,
            is_store: op.class.is_store(),
            access: op.mem_access,
            token,
        });
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

impl MemDepPred for PerfectMemDepPred {
    /// Exact addresses make misordering impossible; a violation report
    /// means the oracle and the memory system disagree.
    fn order_conflicted(&mut self, producer: &Op, consumer: &Op) {
        panic!(
            "access order violation ({} -> {}) under perfect memory \
             dependency prediction",
            producer.serial, consumer.serial
        );
    }

    fn mem_dep_stats(&self) -> MemDepStats {
        self.stats
    }
}
