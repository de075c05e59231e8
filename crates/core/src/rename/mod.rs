//! Speculative register renaming.
//!
//! This module implements the register side of dependency prediction:
//! 1. **Free List:** per-segment pools of unallocated physical registers.
//! 2. **RMT:** the checkpointed logical→physical register map, with the
//!    deferred-release discipline that frees a previous mapping only once
//!    the overwriting instruction commits.

/// Per-segment physical register free pools.
pub mod free_list;

/// The register map table (logical→physical), built on the checkpoint
/// substrate and the free list.
pub mod rmt;

pub use free_list::RegisterFreeList;
pub use rmt::Rmt;
