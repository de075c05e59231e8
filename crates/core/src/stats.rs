//! Aggregate statistics counters.
//!
//! Every component exposes its counters read-only for end-of-run reporting.
//! Nothing here is persisted and nothing feeds back into simulation
//! behavior — the counters exist purely for observation.

/// Checkpoint substrate counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckpointStats {
    /// Checkpoints created.
    pub created: u64,
    /// Checkpoints marked committed.
    pub committed: u64,
    /// Recoveries performed (one per misprediction rollback).
    pub recovered: u64,
    /// Checkpoints flushed from the young end of a chain.
    pub flushed: u64,
    /// Backup nodes allocated (first touch of a value per checkpoint).
    pub backups: u64,
}

/// Register rename counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenameStats {
    /// Physical registers allocated to destinations.
    pub allocations: u64,
    /// Previous mappings released at commit.
    pub releases: u64,
    /// Wrong-path allocations returned at flush.
    pub deallocations: u64,
}

/// Counters shared by every memory-dependency predictor variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemDepStats {
    /// Memory ops presented for resolution.
    pub resolves: u64,
    /// Resolutions that bound the consumer to a live producer token.
    pub bindings: u64,
    /// Producer tokens published.
    pub allocations: u64,
    /// Access-order violations reported by the memory system.
    pub violations: u64,
}

/// Store-set specific counters, beyond [`MemDepStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreSetStats {
    /// Fresh store-set ids minted on a first violation.
    pub minted: u64,
    /// Two existing sets merged under the smaller id.
    pub merges: u64,
    /// An existing id propagated to the other party of a violation.
    pub propagations: u64,
}
