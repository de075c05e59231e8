//! Store-set learning scenarios across full op lifecycles.

use rstest::rstest;

use specsim_core::config::MemDepPredictorKind;
use specsim_core::memdep::{MemDepPred, StoreSetPred};
use specsim_core::op::Op;

use crate::common::{load, store, TestBench};

const STORE_PC: u64 = 0x400;
const LOAD_PC: u64 = 0x500;

#[test]
fn converges_after_a_single_violation() {
    let mut bench = TestBench::new(MemDepPredictorKind::StoreSet);

    // First dynamic instance of the pair: predicted independent, and the
    // memory system later reports the missed dependency.
    bench.rename(store(1, STORE_PC)).unwrap();
    bench.rename(load(2, LOAD_PC)).unwrap();
    assert_eq!(bench.window[1].op.src_dep, None);
    {
        let (producer, consumer) = (&bench.window[0].op, &bench.window[1].op);
        bench.ctx.mem_dep.order_conflicted(producer, consumer);
    }
    bench.commit_all();

    // Every later instance binds the correct dynamic producer.
    for round in 0..5_u64 {
        let base = 10 + round * 2;
        bench.rename(store(base, STORE_PC)).unwrap();
        let producer_token = bench.window[0].op.dst_dep.unwrap();
        bench.rename(load(base + 1, LOAD_PC)).unwrap();
        assert_eq!(
            bench.window[1].op.src_dep,
            Some(producer_token),
            "round {round} must bind the in-flight producer instance"
        );
        bench.commit_all();
    }
    assert_eq!(bench.ctx.mem_dep.mem_dep_stats().violations, 1);
}

#[test]
fn no_binding_when_producer_not_in_flight() {
    let mut bench = TestBench::new(MemDepPredictorKind::StoreSet);

    bench.rename(store(1, STORE_PC)).unwrap();
    bench.rename(load(2, LOAD_PC)).unwrap();
    {
        let (producer, consumer) = (&bench.window[0].op, &bench.window[1].op);
        bench.ctx.mem_dep.order_conflicted(producer, consumer);
    }
    bench.commit_all();

    // The load arrives alone: learned dependency, but no live producer.
    bench.rename(load(3, LOAD_PC)).unwrap();
    assert_eq!(bench.window[0].op.src_dep, None);
    bench.commit_all();
}

#[test]
fn flushed_producer_is_not_bound_by_later_consumers() {
    let mut bench = TestBench::new(MemDepPredictorKind::StoreSet);

    bench.rename(store(1, STORE_PC)).unwrap();
    bench.rename(load(2, LOAD_PC)).unwrap();
    {
        let (producer, consumer) = (&bench.window[0].op, &bench.window[1].op);
        bench.ctx.mem_dep.order_conflicted(producer, consumer);
    }
    bench.commit_all();

    // A wrong-path instance of the producer is squashed...
    bench.rename(store(10, STORE_PC)).unwrap();
    let _squashed = bench.flush_youngest();

    // ...so the next consumer predicts independent rather than binding a
    // dead instance.
    bench.rename(load(11, LOAD_PC)).unwrap();
    assert_eq!(bench.window[0].op.src_dep, None);
    bench.commit_all();
}

/// Merge symmetry: however the two violations are ordered, all three PCs
/// end up grouped, and the shared id makes later instances of either
/// producer visible to the consumer.
#[rstest]
#[case::producer_pair_first(&[(0x300, 0x200), (0x200, 0x100)])]
#[case::consumer_pair_first(&[(0x200, 0x100), (0x300, 0x200)])]
fn merge_groups_regardless_of_order(#[case] conflicts: &[(u64, u64)]) {
    let mut bench = TestBench::new(MemDepPredictorKind::StoreSet);

    let mut serial = 1_u64;
    for &(producer_pc, consumer_pc) in conflicts {
        let producer = store(serial, producer_pc);
        let consumer = store(serial + 1, consumer_pc);
        serial += 2;
        bench.ctx.mem_dep.order_conflicted(&producer, &consumer);
    }

    // Any of the three stores in flight now produces for the whole group:
    // a store at 0x100 must be bound by a following store at 0x300.
    bench.rename(store(serial, 0x100)).unwrap();
    let token = bench.window[0].op.dst_dep.unwrap();
    bench.rename(store(serial + 1, 0x300)).unwrap();
    assert_eq!(bench.window[1].op.src_dep, Some(token));
    bench.commit_all();
}

#[test]
fn learned_association_survives_producer_turnover() {
    let mut bench = TestBench::new(MemDepPredictorKind::StoreSet);

    bench.rename(store(1, STORE_PC)).unwrap();
    bench.rename(load(2, LOAD_PC)).unwrap();
    {
        let (producer, consumer) = (&bench.window[0].op, &bench.window[1].op);
        bench.ctx.mem_dep.order_conflicted(producer, consumer);
    }
    bench.commit_all();

    // Two in-flight instances of the producer: consumers track the newest.
    bench.rename(store(10, STORE_PC)).unwrap();
    bench.rename(store(11, STORE_PC)).unwrap();
    let newest_token = bench.window[1].op.dst_dep.unwrap();
    bench.rename(load(12, LOAD_PC)).unwrap();
    assert_eq!(bench.window[2].op.src_dep, Some(newest_token));
    bench.commit_all();
}

#[test]
fn direct_predictor_reports_set_stats() {
    use specsim_core::config::StoreSetConfig;
    use specsim_core::op::OpClass;

    let mut pred = StoreSetPred::new(&StoreSetConfig::default());
    let p: Op = Op::new(1, 0x100, OpClass::Store);
    let c: Op = Op::new(2, 0x200, OpClass::Load);
    pred.order_conflicted(&p, &c);

    assert_eq!(pred.set_stats().minted, 1);
    assert_eq!(pred.mem_dep_stats().violations, 1);
}
