//! Register renaming tests: the deferred-release scenario, resolve
//! ordering, and the no-leak/no-double-allocation property.

use proptest::prelude::*;

use specsim_core::checkpoint::CheckpointMaster;
use specsim_core::common::{LogReg, PhysReg, SegmentId};
use specsim_core::config::{MemDepPredictorKind, RegSegmentConfig, RenameConfig};
use specsim_core::op::{Op, OpClass, OpStatus};
use specsim_core::predictor::DepPred;
use specsim_core::rename::Rmt;

use crate::common::{alu, TestBench};

/// Builds an RMT whose single segment has exactly `{5, 6, 7}` free after
/// bootstrap: five logical registers occupy p0..p4.
fn small_rmt() -> (CheckpointMaster, specsim_core::checkpoint::SlotId, Rmt) {
    let mut master = CheckpointMaster::new(8);
    let slot = master.add_slot("rename");
    let config = RenameConfig {
        segments: vec![RegSegmentConfig {
            logical_count: 5,
            physical_count: 8,
        }],
    };
    let rmt = Rmt::new(&mut master, slot, &config).unwrap();
    (master, slot, rmt)
}

#[test]
fn deferred_release_scenario() {
    let (mut master, slot, mut rmt) = small_rmt();
    let seg = SegmentId(0);
    assert_eq!(rmt.free_count(seg), 3); // {5, 6, 7}
    let original = rmt.peek_reg(&master, LogReg(0));
    assert_eq!(original, PhysReg(0));

    // op1 writes L0 and takes 5.
    let mut op1 = Op::new(1, 0x100, OpClass::IntAlu).with_dsts(&[LogReg(0)]);
    let cp1 = master.new_checkpoint(slot);
    master.backup(cp1);
    rmt.allocate(&mut master, &mut op1).unwrap();
    op1.status = OpStatus::Renamed;
    assert_eq!(op1.renamed_dsts[0].phys, PhysReg(5));

    // op2 writes L0 and takes 6.
    let mut op2 = Op::new(2, 0x104, OpClass::IntAlu).with_dsts(&[LogReg(0)]);
    let cp2 = master.new_checkpoint(slot);
    master.backup(cp2);
    rmt.allocate(&mut master, &mut op2).unwrap();
    op2.status = OpStatus::Renamed;
    assert_eq!(op2.renamed_dsts[0].phys, PhysReg(6));
    assert_eq!(rmt.free_count(seg), 1); // {7}

    // Commit of op1 releases op1's *previous* holder p0, not 5.
    rmt.commit(&mut master, &mut op1);
    op1.status = OpStatus::Committed;
    master.commit(cp1);
    assert_eq!(rmt.free_count(seg), 2); // {7, 0}

    // Flush of op2 returns 6 immediately and the map rewinds to 5.
    rmt.flush(&mut master, &mut op2);
    op2.status = OpStatus::Flushed;
    master.recover(cp2);
    master.flush(cp2);
    assert_eq!(rmt.free_count(seg), 3); // {7, 0, 6}
    assert_eq!(rmt.peek_reg(&master, LogReg(0)), PhysReg(5));

    // 5 is live (mapped); the free pool drains to exactly {7, 0, 6}.
    let probe = Op::new(3, 0x108, OpClass::IntAlu);
    let mut drained = Vec::new();
    while let Ok(p) = rmt.allocate_reg(&mut master, &probe, LogReg(1)) {
        drained.push(p);
    }
    assert_eq!(drained, vec![PhysReg(7), PhysReg(0), PhysReg(6)]);
}

#[test]
fn resolve_sees_producer_not_own_allocation() {
    let mut bench = TestBench::new(MemDepPredictorKind::Optimistic);
    let producer_phys = bench.ctx.rmt.peek_reg(&bench.ctx.master, LogReg(3));

    // Reads and writes L3: the source must resolve to the old producer.
    bench.rename(alu(1, 0x100, 3, 3)).unwrap();
    let renamed = &bench.window[0].op;
    assert_eq!(renamed.src_phys, vec![producer_phys]);
    assert_ne!(renamed.renamed_dsts[0].phys, producer_phys);
    assert_eq!(
        bench.ctx.rmt.peek_reg(&bench.ctx.master, LogReg(3)),
        renamed.renamed_dsts[0].phys
    );
    bench.commit_all();
}

#[test]
fn admission_blocks_partial_group_allocation() {
    let (_master, _slot, rmt) = small_rmt();
    // Three free registers; a four-destination group must be rejected as a
    // whole even though three of its ops could allocate.
    let group: Vec<Op> = (0..4)
        .map(|i| Op::new(i, 0x100 + i * 4, OpClass::IntAlu).with_dsts(&[LogReg(i as u16)]))
        .collect();
    assert!(!rmt.can_allocate(&group));
    assert!(rmt.can_allocate(&group[..3]));
}

/// Random valid lifecycles preserve the register conservation invariant:
/// after draining, {free} ∪ {mapped} is the whole id space exactly once,
/// and mid-run the pool plus live mappings plus pending releases always
/// account for every register.
#[derive(Debug, Clone, Copy)]
enum Action {
    Rename(u16),
    CommitOldest,
    FlushYoungest,
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0_u16..4).prop_map(Action::Rename),
        Just(Action::CommitOldest),
        Just(Action::FlushYoungest),
    ]
}

proptest! {
    #[test]
    fn no_leak_no_double_allocation(actions in proptest::collection::vec(action_strategy(), 1..64)) {
        let mut bench = TestBench::new(MemDepPredictorKind::Optimistic);
        let total = 2 * 128_usize; // two default segments
        let logical = 2 * 32_usize;
        let mut serial = 0_u64;

        for action in actions {
            match action {
                Action::Rename(dst) => {
                    let op = alu(serial, 0x1000 + serial * 4, 0, dst);
                    serial += 1;
                    if bench.ctx.can_rename(std::slice::from_ref(&op)) {
                        bench.rename(op).unwrap();
                    }
                }
                Action::CommitOldest => {
                    if !bench.window.is_empty() {
                        let _ = bench.commit_oldest();
                    }
                }
                Action::FlushYoungest => {
                    if !bench.window.is_empty() {
                        let _ = bench.flush_youngest();
                    }
                }
            }

            // Conservation: every physical register is free, mapped, or
            // held for deferred release by exactly one in-flight op.
            let free: usize = (0..2)
                .map(|s| bench.ctx.rmt.free_count(SegmentId(s)))
                .sum();
            let pending: usize = bench.window.iter().map(|i| i.op.renamed_dsts.len()).sum();
            prop_assert_eq!(free + logical + pending, total);
        }

        // Drain and check the terminal state: free ∪ mapped == id space.
        bench.commit_all();
        let free: usize = (0..2)
            .map(|s| bench.ctx.rmt.free_count(SegmentId(s)))
            .sum();
        prop_assert_eq!(free + logical, total);
        prop_assert_eq!(bench.ctx.master.live_backups(), 0);
    }
}
