//! Shared dependency-predictor contract.
//!
//! Register and memory dependency prediction expose the same op-level
//! lifecycle to the pipeline: resolve sources, allocate destinations, then
//! exactly one of commit or flush. The pipeline drives both predictor
//! families through this one trait without caring which is which.

use crate::checkpoint::CheckpointMaster;
use crate::common::RenameError;
use crate::op::Op;

/// Op-level lifecycle common to all dependency predictors.
///
/// Contract (violations are caller bugs and fail loudly):
/// - `resolve` then `allocate`, exactly once each, in program order per op;
///   resolve of an op's sources always precedes its own allocate, since
///   allocate overwrites what resolve reads.
/// - exactly one of `commit` / `flush` per allocated op, never both;
///   commits arrive in program order, flushes in any order among squashed
///   ops.
/// - `flush` of an op still in the fetched state is a no-op (nothing was
///   allocated for it yet).
///
/// The [`CheckpointMaster`] is threaded through every call because
/// predictor state that must survive misprediction rollback lives there.
pub trait DepPred {
    /// Binds the op's sources to their current producers. No side effects
    /// on predictor state other than consumer bookkeeping.
    fn resolve(&mut self, master: &CheckpointMaster, op: &mut Op);

    /// Publishes the op's destinations for later consumers.
    ///
    /// # Errors
    ///
    /// Returns an error only on resource exhaustion that `can_allocate`
    /// would have rejected; see
    /// [`RenameError`](crate::common::RenameError).
    fn allocate(&mut self, master: &mut CheckpointMaster, op: &mut Op) -> Result<(), RenameError>;

    /// Retires the op, releasing whatever the allocation made dead.
    fn commit(&mut self, master: &mut CheckpointMaster, op: &mut Op);

    /// Squashes the op, returning its allocations as if they never happened.
    fn flush(&mut self, master: &mut CheckpointMaster, op: &mut Op);

    /// Admission check: can the whole group allocate without exhaustion?
    fn can_allocate(&self, ops: &[Op]) -> bool;
}
