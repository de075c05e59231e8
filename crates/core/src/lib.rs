//! Speculative dependency and checkpoint core for a cycle-level
//! out-of-order processor simulator.
//!
//! This crate implements the state that must survive — and be unwound by —
//! branch and memory misprediction:
//! 1. **Checkpoint substrate:** snapshot-able values, generation markers,
//!    and the master that rolls every touched value back on recovery.
//! 2. **Register renaming:** the checkpointed logical→physical map table
//!    with per-segment free lists and deferred release at commit.
//! 3. **Memory dependency prediction:** interchangeable predictors
//!    (optimistic, conservative, store-set, oracle-backed perfect) over
//!    reference-counted dependency tokens.
//! 4. **Simulation context:** explicit ownership of all of the above, so
//!    independent simulations coexist in one process.
//!
//! The crate is a library consumed by pipeline-stage collaborators; fetch,
//! scheduling, execution, and the memory system live elsewhere and drive
//! the lifecycle documented on [`predictor::DepPred`].

/// Checkpoint substrate (values, checkpoints, master).
pub mod checkpoint;

/// Common newtypes, errors, and associative storage.
pub mod common;

/// Hierarchical serde configuration.
pub mod config;

/// The explicit simulation context object.
pub mod context;

/// Memory dependency predictors and tokens.
pub mod memdep;

/// The in-flight instruction record.
pub mod op;

/// The shared dependency-predictor contract.
pub mod predictor;

/// Register renaming (free list + RMT).
pub mod rename;

/// Read-only aggregate counters.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// The simulation context; construct with `SimContext::build`.
pub use crate::context::SimContext;
/// The checkpoint registry and sequencer.
pub use crate::checkpoint::CheckpointMaster;
/// The dynamic instruction record threaded through the predictors.
pub use crate::op::Op;
