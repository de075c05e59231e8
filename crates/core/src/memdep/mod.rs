//! Memory dependency prediction.
//!
//! At rename time nothing knows which addresses a load or store will touch,
//! so the machine predicts which earlier producer a memory op depends on.
//! Four interchangeable predictors implement the same contract:
//! 1. **Optimistic:** predict independent always; count the violations.
//! 2. **Conservative:** serialize all memory ops; zero violations, minimal
//!    parallelism.
//! 3. **Store set:** learn producer/consumer PCs from violations and
//!    predict only learned pairs — converges within a handful of
//!    violations per static pair.
//! 4. **Perfect:** consult a pre-executing oracle's addresses.
//!
//! The variant is selected from configuration at build time of the context,
//! not at compile time.

/// Serializing predictor built on checkpointed "latest producer" globals.
pub mod conservative;

/// Reference-counted dependency tokens.
pub mod dependency;

/// Oracle-driven predictor with exact address knowledge.
pub mod perfect;

/// Always-independent predictor.
pub mod optimistic;

/// Learning predictor keyed by static PC pairs.
pub mod store_set;

use crate::checkpoint::{CheckpointMaster, SlotId};
use crate::config::{MemDepConfig, MemDepPredictorKind};
use crate::op::Op;
use crate::predictor::DepPred;
use crate::stats::MemDepStats;

pub use conservative::ConservativeMemDepPred;
pub use dependency::{DepPool, TokenId};
pub use optimistic::OptimisticMemDepPred;
pub use perfect::PerfectMemDepPred;
pub use store_set::{StoreSetId, StoreSetPred};

/// Contract shared by every memory dependency predictor.
///
/// Beyond the common [`DepPred`] lifecycle, memory predictors learn from
/// [`order_conflicted`](Self::order_conflicted): the memory system reports,
/// possibly cycles after the fact, that a younger access missed a true
/// dependency on an older store. The report only changes predictions for
/// *future* dynamic instances — it never retroactively alters an executed
/// consumer.
pub trait MemDepPred: DepPred {
    /// Reports an access-order violation between `producer` (an older
    /// store) and `consumer` (a younger load or store).
    fn order_conflicted(&mut self, producer: &Op, consumer: &Op);

    /// Aggregate counters common to all variants.
    fn mem_dep_stats(&self) -> MemDepStats;
}

/// Builds the configured predictor variant.
///
/// The conservative predictor registers its checkpointed globals in
/// `slot`; the other variants ignore it.
pub fn build_predictor(
    config: &MemDepConfig,
    master: &mut CheckpointMaster,
    slot: SlotId,
) -> Box<dyn MemDepPred> {
    match config.predictor {
        MemDepPredictorKind::Optimistic => Box::new(OptimisticMemDepPred::new()),
        MemDepPredictorKind::Conservative => Box::new(ConservativeMemDepPred::new(master, slot)),
        MemDepPredictorKind::StoreSet => Box::new(StoreSetPred::new(&config.store_set)),
        MemDepPredictorKind::Perfect => Box::new(PerfectMemDepPred::new(config.alignment)),
    }
}
