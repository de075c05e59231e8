//! Common types shared across the speculative core.
//!
//! This module provides fundamental building blocks used by the checkpoint
//! substrate, the renamer, and the memory-dependency predictors. It includes:
//! 1. **Identifier Types:** Strong newtypes for registers, segments, and ops.
//! 2. **Error Handling:** Configuration and rename error definitions.
//! 3. **Associative Storage:** A generic set-associative, LRU-evicting table.

/// Configuration and rename error definitions.
pub mod error;

/// Generic set-associative table with LRU replacement.
pub mod table;

/// Identifier newtypes (registers, segments, op serial numbers).
pub mod types;

pub use error::{ConfigError, RenameError};
pub use table::SetAssocTable;
pub use types::{LogReg, OpSerial, PhysReg, SegmentId};
