//! Checkpoint substrate tests against the public API.

use pretty_assertions::assert_eq;
use specsim_core::CheckpointMaster;

#[test]
fn roundtrip_restores_value_at_backup() {
    let mut master = CheckpointMaster::new(4);
    let slot = master.add_slot("rename");
    let value = master.register(41_u64, slot);

    let cp = master.new_checkpoint(slot);
    master.backup_value(cp, value);
    *master.get_mut(value) = 42;
    *master.get_mut(value) = 43; // further write under the same window

    master.recover(cp);
    assert_eq!(*master.get(value), 41);
    master.flush(cp);
}

#[test]
fn nested_windows_unwind_in_order() {
    let mut master = CheckpointMaster::new(8);
    let slot = master.add_slot("rename");
    let value = master.register(vec![0_u16; 4], slot);

    let mut cps = Vec::new();
    for generation in 1..=3_u16 {
        let cp = master.new_checkpoint(slot);
        master.backup_value(cp, value);
        master.get_mut(value)[0] = generation;
        cps.push(cp);
    }
    assert_eq!(master.get(value)[0], 3);

    // Unwind young-to-old; each recover lands on the previous generation.
    for (cp, expected) in cps.into_iter().zip([0_u16, 1, 2]).rev() {
        master.recover(cp);
        master.flush(cp);
        assert_eq!(master.get(value)[0], expected);
    }
    assert_eq!(master.live_backups(), 0);
}

#[test]
fn out_of_order_commit_defers_reclamation() {
    let mut master = CheckpointMaster::new(8);
    let slot = master.add_slot("rename");
    let value = master.register(0_u32, slot);

    let older = master.new_checkpoint(slot);
    master.backup_value(older, value);
    let middle = master.new_checkpoint(slot);
    master.backup_value(middle, value);
    let younger = master.new_checkpoint(slot);
    master.backup_value(younger, value);

    // Commit out of order: nothing reclaims past the speculative front.
    master.commit(younger);
    master.commit(middle);
    assert_eq!(master.live_checkpoints(slot), 3);
    assert_eq!(master.live_backups(), 3);

    // Committing the oldest drains the whole committed prefix.
    master.commit(older);
    assert_eq!(master.live_checkpoints(slot), 0);
    assert_eq!(master.live_backups(), 0);
}

#[test]
fn untouched_values_cost_nothing() {
    let mut master = CheckpointMaster::new(4);
    let slot = master.add_slot("rename");
    let touched = master.register(0_u32, slot);
    let _idle = master.register([0_u64; 64], slot);

    let cp = master.new_checkpoint(slot);
    assert_eq!(master.live_backups(), 0);
    master.backup_value(cp, touched);
    assert_eq!(master.live_backups(), 1);
    master.commit(cp);
    assert_eq!(master.live_backups(), 0);
}

#[test]
fn stats_track_lifecycle() {
    let mut master = CheckpointMaster::new(4);
    let slot = master.add_slot("rename");
    let value = master.register(0_u32, slot);

    let committed = master.new_checkpoint(slot);
    master.backup_value(committed, value);
    master.commit(committed);

    let recovered = master.new_checkpoint(slot);
    master.backup_value(recovered, value);
    master.recover(recovered);
    master.flush(recovered);

    let stats = master.stats();
    assert_eq!(stats.created, 2);
    assert_eq!(stats.committed, 1);
    assert_eq!(stats.recovered, 1);
    assert_eq!(stats.flushed, 1);
    assert_eq!(stats.backups, 2);
}
