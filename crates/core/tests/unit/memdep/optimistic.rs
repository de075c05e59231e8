//! Always-independent predictor behavior.

use rstest::rstest;

use specsim_core::config::MemDepPredictorKind;
use specsim_core::memdep::MemDepPred;

use crate::common::{alu, load, store, TestBench};

#[test]
fn never_binds_and_only_counts_violations() {
    let mut bench = TestBench::new(MemDepPredictorKind::Optimistic);

    bench.rename(store(1, 0x100)).unwrap();
    bench.rename(load(2, 0x104)).unwrap();
    assert_eq!(bench.window[0].op.dst_dep, None);
    assert_eq!(bench.window[1].op.src_dep, None);

    {
        let (producer, consumer) = (&bench.window[0].op, &bench.window[1].op);
        bench.ctx.mem_dep.order_conflicted(producer, consumer);
    }
    assert_eq!(bench.ctx.mem_dep.mem_dep_stats().violations, 1);
    assert_eq!(bench.ctx.mem_dep.mem_dep_stats().bindings, 0);
    bench.commit_all();
}

/// Non-memory ops pass through every predictor variant untouched.
#[rstest]
#[case::optimistic(MemDepPredictorKind::Optimistic)]
#[case::conservative(MemDepPredictorKind::Conservative)]
#[case::store_set(MemDepPredictorKind::StoreSet)]
#[case::perfect(MemDepPredictorKind::Perfect)]
fn non_memory_ops_are_ignored(#[case] kind: MemDepPredictorKind) {
    let mut bench = TestBench::new(kind);
    bench.rename(alu(1, 0x100, 1, 2)).unwrap();
    let op = &bench.window[0].op;
    assert_eq!(op.src_dep, None);
    assert_eq!(op.dst_dep, None);
    assert_eq!(bench.ctx.mem_dep.mem_dep_stats().resolves, 0);
    bench.commit_all();
}
