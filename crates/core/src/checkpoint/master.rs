//! Registry and sequencer for checkpointed values.
//!
//! The [`CheckpointMaster`] owns every registered value and every live
//! checkpoint. Slots partition both: values registered in a slot are backed
//! up by that slot's checkpoints, and each slot keeps its own age-ordered
//! chain of checkpoints (e.g. one chain for the fetch stage, one for
//! rename). Chains are reclaimed from the oldest end on commit and from the
//! youngest end on flush; nothing in between may be destroyed.
//!
//! Protocol violations — stale checkpoint ids, flushing a checkpoint that is
//! not the youngest of its chain, registering a value after its slot's first
//! checkpoint — panic. Silent tolerance here would corrupt simulation
//! results with no symptom.

use tracing::{debug, trace};

use super::value::{BackupNode, ErasedValue, TypedValue, ValueHandle};
use crate::stats::CheckpointStats;

/// Identifies one slot (an independent checkpoint chain) within a master.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotId(pub(crate) u32);

/// Identifies a live checkpoint.
///
/// The id embeds a generation tag; using an id after its checkpoint was
/// committed or flushed is detected and panics rather than aliasing a
/// recycled checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CheckpointId {
    index: u32,
    generation: u32,
}

/// A generation marker: which values it backed up, and where.
struct Checkpoint {
    slot: SlotId,
    committed: bool,
    /// Backup node per registered value; `None` = untouched by this window.
    nodes: Vec<Option<BackupNode>>,
}

/// Slab cell for checkpoint storage.
struct CheckpointCell {
    generation: u32,
    live: Option<Checkpoint>,
}

/// Per-slot bookkeeping.
struct Slot {
    name: String,
    /// Indices into the master's value list, registration order.
    values: Vec<u32>,
    /// Live checkpoints, oldest first.
    chain: Vec<CheckpointId>,
    /// Set once the first checkpoint is created; registration then closes.
    sealed: bool,
}

/// One registered value: its owning slot plus the type-erased storage.
struct ValueEntry {
    slot: SlotId,
    store: Box<dyn ErasedValue>,
}

/// Registry and sequencer for all checkpointed state.
///
/// Owned by the top-level driver and threaded explicitly through every call
/// that touches speculative state; there are no global singletons, so
/// several independent simulations can coexist in one process.
pub struct CheckpointMaster {
    values: Vec<ValueEntry>,
    slots: Vec<Slot>,
    cells: Vec<CheckpointCell>,
    free_cells: Vec<u32>,
    /// Maximum live checkpoints per slot.
    capacity: usize,
    stats: CheckpointStats,
}

impl std::fmt::Debug for CheckpointMaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckpointMaster")
            .field("values", &self.values.len())
            .field("slots", &self.slots.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl CheckpointMaster {
    /// Creates a master allowing up to `capacity` live checkpoints per slot.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; reject it at configuration time via
    /// [`crate::config::Config::validate`].
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "checkpoint capacity must be at least one");
        Self {
            values: Vec::new(),
            slots: Vec::new(),
            cells: Vec::new(),
            free_cells: Vec::new(),
            capacity,
            stats: CheckpointStats::default(),
        }
    }

    /// Adds an independent checkpoint chain (e.g. one per pipeline stage).
    pub fn add_slot(&mut self, name: &str) -> SlotId {
        let id = SlotId(self.slots.len() as u32);
        self.slots.push(Slot {
            name: name.to_owned(),
            values: Vec::new(),
            chain: Vec::new(),
            sealed: false,
        });
        id
    }

    /// Registers a value in `slot`, returning its typed handle.
    ///
    /// All registrations in a slot must happen before the slot's first
    /// checkpoint is created.
    ///
    /// # Panics
    ///
    /// Panics if the slot already has (or had) a checkpoint.
    pub fn register<T: Clone + 'static>(&mut self, initial: T, slot: SlotId) -> ValueHandle<T> {
        let s = &mut self.slots[slot.0 as usize];
        assert!(
            !s.sealed,
            "value registered in slot '{}' after its first checkpoint",
            s.name
        );
        let index = self.values.len() as u32;
        s.values.push(index);
        self.values.push(ValueEntry {
            slot,
            store: Box::new(TypedValue::new(initial)),
        });
        ValueHandle::new(index)
    }

    /// Reads a registered value's current contents.
    pub fn get<T: Clone + 'static>(&self, handle: ValueHandle<T>) -> &T {
        self.typed(handle).current()
    }

    /// Mutable access to a registered value's current contents.
    ///
    /// Mutating speculative state without a prior
    /// [`backup_value`](Self::backup_value) into the covering checkpoint
    /// makes the mutation unrecoverable; that ordering is the caller's
    /// responsibility.
    pub fn get_mut<T: Clone + 'static>(&mut self, handle: ValueHandle<T>) -> &mut T {
        self.typed_mut(handle).current_mut()
    }

    /// Returns whether `additional` more checkpoints fit in `slot`.
    pub fn can_create(&self, slot: SlotId, additional: usize) -> bool {
        self.slots[slot.0 as usize].chain.len() + additional <= self.capacity
    }

    /// Creates an empty checkpoint at the young end of `slot`'s chain.
    ///
    /// Nothing is copied; backups are taken later, per touched value.
    ///
    /// # Panics
    ///
    /// Panics if the slot's chain is at capacity;
    /// [`can_create`](Self::can_create) is the admission check that keeps
    /// this unreachable.
    pub fn new_checkpoint(&mut self, slot: SlotId) -> CheckpointId {
        let num_values = self.values.len();
        let s = &mut self.slots[slot.0 as usize];
        assert!(
            s.chain.len() < self.capacity,
            "checkpoint capacity ({}) exhausted in slot '{}'",
            self.capacity,
            s.name
        );
        s.sealed = true;

        let checkpoint = Checkpoint {
            slot,
            committed: false,
            nodes: vec![None; num_values],
        };
        let id = if let Some(index) = self.free_cells.pop() {
            let cell = &mut self.cells[index as usize];
            cell.live = Some(checkpoint);
            CheckpointId {
                index,
                generation: cell.generation,
            }
        } else {
            self.cells.push(CheckpointCell {
                generation: 0,
                live: Some(checkpoint),
            });
            CheckpointId {
                index: (self.cells.len() - 1) as u32,
                generation: 0,
            }
        };
        self.slots[slot.0 as usize].chain.push(id);
        self.stats.created += 1;
        trace!(slot = %self.slots[slot.0 as usize].name, ?id, "checkpoint created");
        id
    }

    /// Backs up every value registered in the checkpoint's slot.
    pub fn backup(&mut self, cp: CheckpointId) {
        let slot = self.live(cp).slot;
        let handles = std::mem::take(&mut self.slots[slot.0 as usize].values);
        for &value_index in &handles {
            self.backup_raw(cp, value_index);
        }
        self.slots[slot.0 as usize].values = handles;
    }

    /// Backs up a single value into `cp`.
    ///
    /// The first backup of a value into a checkpoint lazily allocates a
    /// node; later backups into the same checkpoint overwrite it.
    ///
    /// # Panics
    ///
    /// Panics if the value is not registered in the checkpoint's slot.
    pub fn backup_value<T: Clone + 'static>(&mut self, cp: CheckpointId, handle: ValueHandle<T>) {
        let slot = self.live(cp).slot;
        assert!(
            self.values[handle.index as usize].slot == slot,
            "value backed up into a checkpoint of a different slot"
        );
        self.backup_raw(cp, handle.index);
    }

    /// Restores every value `cp` backed up; untouched values are left alone
    /// (they have not changed since some older checkpoint).
    pub fn recover(&mut self, cp: CheckpointId) {
        let checkpoint = std::mem::take(&mut self.live_mut(cp).nodes);
        for (value_index, node) in checkpoint.iter().enumerate() {
            if let Some(node) = node {
                self.values[value_index].store.recover(*node);
            }
        }
        self.live_mut(cp).nodes = checkpoint;
        self.stats.recovered += 1;
        debug!(?cp, "checkpoint recovered");
    }

    /// Marks `cp` committed and reclaims the committed prefix of its chain.
    ///
    /// Backups are released strictly oldest-first: a committed checkpoint
    /// younger than a still-speculative one stays allocated until the older
    /// one commits, keeping every speculative backup chain intact.
    pub fn commit(&mut self, cp: CheckpointId) {
        self.live_mut(cp).committed = true;
        self.stats.committed += 1;

        let slot = self.live(cp).slot;
        loop {
            let Some(&front) = self.slots[slot.0 as usize].chain.first() else {
                break;
            };
            if !self.live(front).committed {
                break;
            }
            let _ = self.slots[slot.0 as usize].chain.remove(0);
            self.destroy(front);
        }
    }

    /// Erases and destroys `cp`, which must be the youngest of its chain.
    ///
    /// Call [`recover`](Self::recover) first if the values it covers were
    /// mutated; flushing alone only releases the backups.
    ///
    /// # Panics
    ///
    /// Panics if `cp` is not the youngest live checkpoint of its slot.
    pub fn flush(&mut self, cp: CheckpointId) {
        let slot = self.live(cp).slot;
        let is_youngest = self.slots[slot.0 as usize].chain.last() == Some(&cp);
        assert!(
            is_youngest,
            "flushed checkpoint is not the youngest of slot '{}'; \
             checkpoints must be flushed young-to-old",
            self.slots[slot.0 as usize].name
        );
        let _ = self.slots[slot.0 as usize].chain.pop();
        self.destroy(cp);
        self.stats.flushed += 1;
        debug!(?cp, "checkpoint flushed");
    }

    /// Returns whether `cp` has been marked committed.
    pub fn is_committed(&self, cp: CheckpointId) -> bool {
        self.live(cp).committed
    }

    /// Number of live checkpoints in `slot`.
    pub fn live_checkpoints(&self, slot: SlotId) -> usize {
        self.slots[slot.0 as usize].chain.len()
    }

    /// Total live backup nodes across all values, for accounting.
    pub fn live_backups(&self) -> usize {
        self.values.iter().map(|v| v.store.live_backups()).sum()
    }

    /// Aggregate checkpoint counters.
    pub const fn stats(&self) -> &CheckpointStats {
        &self.stats
    }

    /// Releases every node `cp` holds and frees its cell.
    fn destroy(&mut self, cp: CheckpointId) {
        let checkpoint = std::mem::take(&mut self.live_mut(cp).nodes);
        for (value_index, node) in checkpoint.into_iter().enumerate() {
            if let Some(node) = node {
                self.values[value_index].store.erase(node);
            }
        }
        let cell = &mut self.cells[cp.index as usize];
        cell.live = None;
        cell.generation = cell.generation.wrapping_add(1);
        self.free_cells.push(cp.index);
    }

    fn backup_raw(&mut self, cp: CheckpointId, value_index: u32) {
        let existing = self.live(cp).nodes[value_index as usize];
        let store = &mut self.values[value_index as usize].store;
        if let Some(node) = existing {
            store.backup_into(node);
        } else {
            let node = store.backup();
            self.live_mut(cp).nodes[value_index as usize] = Some(node);
            self.stats.backups += 1;
        }
    }

    fn live(&self, cp: CheckpointId) -> &Checkpoint {
        let cell = &self.cells[cp.index as usize];
        assert!(
            cell.generation == cp.generation,
            "stale checkpoint id: the checkpoint was already committed or flushed"
        );
        match cell.live.as_ref() {
            Some(checkpoint) => checkpoint,
            None => panic!("stale checkpoint id: the checkpoint was already committed or flushed"),
        }
    }

    fn live_mut(&mut self, cp: CheckpointId) -> &mut Checkpoint {
        let cell = &mut self.cells[cp.index as usize];
        assert!(
            cell.generation == cp.generation,
            "stale checkpoint id: the checkpoint was already committed or flushed"
        );
        match cell.live.as_mut() {
            Some(checkpoint) => checkpoint,
            None => panic!("stale checkpoint id: the checkpoint was already committed or flushed"),
        }
    }

    fn typed<T: Clone + 'static>(&self, handle: ValueHandle<T>) -> &TypedValue<T> {
        match self.values[handle.index as usize]
            .store
            .as_any()
            .downcast_ref()
        {
            Some(typed) => typed,
            None => panic!("value handle used with a mismatched type"),
        }
    }

    fn typed_mut<T: Clone + 'static>(&mut self, handle: ValueHandle<T>) -> &mut TypedValue<T> {
        match self.values[handle.index as usize]
            .store
            .as_any_mut()
            .downcast_mut()
        {
            Some(typed) => typed,
            None => panic!("value handle used with a mismatched type"),
        }
    }
}
