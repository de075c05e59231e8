//! Configuration for the speculative core.
//!
//! This module defines the structures that parameterize the checkpoint
//! substrate, the renamer, and the memory-dependency predictors. It
//! provides:
//! 1. **Defaults:** baseline machine constants in a private `defaults`
//!    module.
//! 2. **Structures:** hierarchical config for checkpoints, register
//!    segments, and predictor tables.
//! 3. **Selection:** the active memory-dependency predictor is data
//!    (deserialized from JSON), not a compile-time choice.
//!
//! Every field carries `#[serde(default)]`, so partial JSON configs
//! deserialize; [`Config::validate`] rejects inconsistent values before
//! any component is built from them.

use serde::Deserialize;

use crate::common::{ConfigError, SegmentId};

/// Default configuration constants.
mod defaults {
    /// Maximum live checkpoints per slot (one per in-flight speculative
    /// window).
    pub const CHECKPOINT_CAPACITY: usize = 64;

    /// Architectural registers per segment.
    pub const SEGMENT_LOGICAL: u16 = 32;

    /// Physical registers per segment.
    pub const SEGMENT_PHYSICAL: u16 = 128;

    /// Store-set id table size (log2 sets, 4096 sets).
    pub const STORE_ID_TABLE_ENTRY_BITS: u32 = 12;

    /// Store-set id table associativity.
    pub const STORE_ID_TABLE_WAYS: usize = 4;

    /// Producer table size (log2 sets, 256 sets).
    pub const PRODUCER_TABLE_ENTRY_BITS: u32 = 8;

    /// Producer table associativity.
    pub const PRODUCER_TABLE_WAYS: usize = 4;

    /// Largest naturally aligned access the target ISA allows, in bytes.
    pub const MEM_ALIGNMENT: u64 = 8;
}

/// Memory dependency predictor variants.
///
/// Selected from configuration; all variants expose the same lifecycle, so
/// the pipeline is unchanged whichever is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum MemDepPredictorKind {
    /// Predict independent always; violations are counted, not learned.
    Optimistic,
    /// Serialize all memory ops through checkpointed "latest producer"
    /// globals. Zero violations, minimal parallelism.
    Conservative,
    /// Learn producer/consumer PC pairs from violations.
    #[default]
    StoreSet,
    /// Consult a pre-executing oracle's addresses. Requires the embedder
    /// to stamp ops with their effective addresses.
    Perfect,
}

/// Root configuration for the speculative core.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Checkpoint substrate parameters.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    /// Register segments and sizes.
    #[serde(default)]
    pub rename: RenameConfig,
    /// Memory dependency prediction parameters.
    #[serde(default)]
    pub mem_dep: MemDepConfig,
}

impl Config {
    /// Checks the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found; see its variants for the
    /// individual rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checkpoint.capacity == 0 {
            return Err(ConfigError::ZeroCheckpointCapacity);
        }
        if self.rename.segments.is_empty() {
            return Err(ConfigError::NoSegments);
        }
        for (index, seg) in self.rename.segments.iter().enumerate() {
            let segment = SegmentId(index as u8);
            if seg.logical_count == 0 {
                return Err(ConfigError::EmptySegment { segment });
            }
            if seg.physical_count <= seg.logical_count {
                return Err(ConfigError::TooFewPhysicalRegisters {
                    segment,
                    logical: seg.logical_count,
                    physical: seg.physical_count,
                });
            }
        }
        self.mem_dep.validate()
    }
}

/// Checkpoint substrate parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckpointConfig {
    /// Maximum live checkpoints per slot.
    #[serde(default = "CheckpointConfig::default_capacity")]
    pub capacity: usize,
}

impl CheckpointConfig {
    fn default_capacity() -> usize {
        defaults::CHECKPOINT_CAPACITY
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::CHECKPOINT_CAPACITY,
        }
    }
}

/// One register segment: a register class with its own free pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RegSegmentConfig {
    /// Architectural registers in the segment.
    pub logical_count: u16,
    /// Physical registers backing the segment. Must exceed
    /// `logical_count`: the architectural state permanently occupies one
    /// physical register per logical register.
    pub physical_count: u16,
}

/// Register renaming parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct RenameConfig {
    /// Register segments, in logical-register numbering order.
    #[serde(default = "RenameConfig::default_segments")]
    pub segments: Vec<RegSegmentConfig>,
}

impl RenameConfig {
    /// Two segments (integer and floating point) of 32 logical / 128
    /// physical registers each.
    fn default_segments() -> Vec<RegSegmentConfig> {
        vec![
            RegSegmentConfig {
                logical_count: defaults::SEGMENT_LOGICAL,
                physical_count: defaults::SEGMENT_PHYSICAL,
            };
            2
        ]
    }
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            segments: Self::default_segments(),
        }
    }
}

/// Store-set table geometry.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StoreSetConfig {
    /// log2 of the store-id table set count.
    #[serde(default = "StoreSetConfig::default_id_bits")]
    pub id_table_entry_bits: u32,
    /// Store-id table ways per set.
    #[serde(default = "StoreSetConfig::default_id_ways")]
    pub id_table_ways: usize,
    /// log2 of the producer table set count.
    #[serde(default = "StoreSetConfig::default_producer_bits")]
    pub producer_table_entry_bits: u32,
    /// Producer table ways per set.
    #[serde(default = "StoreSetConfig::default_producer_ways")]
    pub producer_table_ways: usize,
}

impl StoreSetConfig {
    fn default_id_bits() -> u32 {
        defaults::STORE_ID_TABLE_ENTRY_BITS
    }
    fn default_id_ways() -> usize {
        defaults::STORE_ID_TABLE_WAYS
    }
    fn default_producer_bits() -> u32 {
        defaults::PRODUCER_TABLE_ENTRY_BITS
    }
    fn default_producer_ways() -> usize {
        defaults::PRODUCER_TABLE_WAYS
    }
}

impl Default for StoreSetConfig {
    fn default() -> Self {
        Self {
            id_table_entry_bits: defaults::STORE_ID_TABLE_ENTRY_BITS,
            id_table_ways: defaults::STORE_ID_TABLE_WAYS,
            producer_table_entry_bits: defaults::PRODUCER_TABLE_ENTRY_BITS,
            producer_table_ways: defaults::PRODUCER_TABLE_WAYS,
        }
    }
}

/// Memory dependency prediction parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct MemDepConfig {
    /// Active predictor variant.
    #[serde(default)]
    pub predictor: MemDepPredictorKind,
    /// Store-set table geometry (used by the `StoreSet` variant).
    #[serde(default)]
    pub store_set: StoreSetConfig,
    /// Largest naturally aligned access in bytes (used by the `Perfect`
    /// variant's store-store rule). Must be a power of two.
    #[serde(default = "MemDepConfig::default_alignment")]
    pub alignment: u64,
}

impl MemDepConfig {
    fn default_alignment() -> u64 {
        defaults::MEM_ALIGNMENT
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.store_set.id_table_ways == 0 || self.store_set.producer_table_ways == 0 {
            return Err(ConfigError::BadTableGeometry {
                reason: "table associativity must be at least one way",
            });
        }
        if self.store_set.id_table_entry_bits > 24 || self.store_set.producer_table_entry_bits > 24
        {
            return Err(ConfigError::BadTableGeometry {
                reason: "table index wider than 24 bits",
            });
        }
        if !self.alignment.is_power_of_two() {
            return Err(ConfigError::BadAlignment {
                alignment: self.alignment,
            });
        }
        Ok(())
    }
}

impl Default for MemDepConfig {
    fn default() -> Self {
        Self {
            predictor: MemDepPredictorKind::default(),
            store_set: StoreSetConfig::default(),
            alignment: defaults::MEM_ALIGNMENT,
        }
    }
}
