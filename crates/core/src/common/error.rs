//! Error definitions for the speculative core.
//!
//! Two failure families exist (and only two — everything else is a caller
//! bug and panics at the violation site):
//! 1. **Configuration errors:** rejected when a [`crate::config::Config`] is
//!    validated or a component is constructed from one.
//! 2. **Resource exhaustion:** an allocation attempted past an admission
//!    check. The admission check makes these unreachable in a correctly
//!    configured pipeline; the error return lets an embedder stall instead.

use thiserror::Error;

use super::types::SegmentId;

/// A rejected configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The rename configuration declares no register segments.
    #[error("rename configuration declares no register segments")]
    NoSegments,

    /// A segment has no architectural registers.
    #[error("segment {segment} has no logical registers")]
    EmptySegment {
        /// The offending segment.
        segment: SegmentId,
    },

    /// A segment cannot hold its architectural state plus one rename.
    ///
    /// Every logical register permanently occupies one physical register,
    /// so at least `logical + 1` physical registers are needed before a
    /// single instruction can rename in that segment.
    #[error(
        "segment {segment} has too few physical registers: \
         {physical} physical for {logical} logical (need at least logical + 1)"
    )]
    TooFewPhysicalRegisters {
        /// The offending segment.
        segment: SegmentId,
        /// Number of logical registers declared for the segment.
        logical: u16,
        /// Number of physical registers declared for the segment.
        physical: u16,
    },

    /// The checkpoint capacity is zero.
    #[error("checkpoint capacity must be at least one")]
    ZeroCheckpointCapacity,

    /// A set-associative table parameter is out of range.
    #[error("store-set table misconfigured: {reason}")]
    BadTableGeometry {
        /// Human-readable description of the offending parameter.
        reason: &'static str,
    },

    /// The memory access alignment is not a power of two.
    #[error("memory access alignment {alignment} is not a power of two")]
    BadAlignment {
        /// The rejected alignment value.
        alignment: u64,
    },
}

/// A failed rename-time resource allocation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenameError {
    /// A segment's free list was empty on allocation.
    ///
    /// `can_allocate` admission prevents this for any group it approved;
    /// reaching it means the pipeline dispatched past its admission check
    /// or the machine is configured with too few physical registers.
    /// An embedder may treat this as a stall-and-retry instead of fatal.
    #[error("no free physical register in segment {segment}")]
    FreeListExhausted {
        /// The exhausted segment.
        segment: SegmentId,
    },
}
