//! Checkpoint substrate — snapshot and rollback for speculative state.
//!
//! Every piece of machine state mutated under speculation is registered here
//! once at startup and thereafter backed up, recovered, and reclaimed through
//! the [`CheckpointMaster`]. The substrate provides:
//! 1. **Registration:** each value gets a dense handle within a named slot.
//! 2. **Checkpoints:** cheap generation markers created per speculative
//!    window; backups are taken lazily, so an untouched value costs nothing.
//! 3. **Recovery:** rolling every touched value back to a checkpoint, as if
//!    the wrong-path instructions never executed.
//! 4. **Reclamation:** committed checkpoints are drained strictly from the
//!    oldest end of each slot's chain, so younger speculative checkpoints
//!    always keep a consistent backup chain behind them.

/// Registry and sequencer for checkpointed values.
pub mod master;

/// Typed checkpointed values and their backup arenas.
pub mod value;

pub use master::{CheckpointId, CheckpointMaster, SlotId};
pub use value::ValueHandle;
