//! Generic set-associative table with LRU replacement.
//!
//! The store-set predictor keeps its learned state in two bounded associative
//! caches. Absence — whether because nothing was learned or because an entry
//! was evicted — always reads as "no prediction", so eviction degrades
//! accuracy but never correctness.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// One occupied way within a set.
#[derive(Clone, Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
}

/// A set-associative table mapping `K` to `V` with per-set LRU eviction.
///
/// Sets are selected by hashing the key; within a set, ways are kept in
/// recency order with the most recently touched entry at the front. A write
/// into a full set evicts the least recently used way.
#[derive(Clone, Debug)]
pub struct SetAssocTable<K, V> {
    /// Ways per set, most recently used first.
    sets: Vec<Vec<Entry<K, V>>>,
    ways: usize,
    index_mask: u64,
}

impl<K: Hash + Eq, V> SetAssocTable<K, V> {
    /// Creates a table with `1 << entry_bits` sets of `ways` ways each.
    ///
    /// # Panics
    ///
    /// Panics if `ways` is zero or `entry_bits` exceeds 24; both are
    /// configuration errors callers must reject beforehand.
    pub fn new(entry_bits: u32, ways: usize) -> Self {
        assert!(ways > 0, "set-associative table needs at least one way");
        assert!(entry_bits <= 24, "set-associative table index too wide");
        let num_sets = 1_usize << entry_bits;
        let mut sets = Vec::with_capacity(num_sets);
        sets.resize_with(num_sets, Vec::new);
        Self {
            sets,
            ways,
            index_mask: (num_sets as u64) - 1,
        }
    }

    /// Total number of ways across all sets.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.sets.len() * self.ways
    }

    /// Number of occupied ways.
    pub fn len(&self) -> usize {
        self.sets.iter().map(Vec::len).sum()
    }

    /// Returns true if no entry is present.
    pub fn is_empty(&self) -> bool {
        self.sets.iter().all(Vec::is_empty)
    }

    /// Looks up `key`, promoting a hit to most recently used.
    ///
    /// Returns `None` for keys never written or already evicted.
    pub fn read(&mut self, key: &K) -> Option<&V> {
        let set = &mut self.sets[Self::index_of(self.index_mask, key)];
        let pos = set.iter().position(|e| e.key == *key)?;
        let entry = set.remove(pos);
        set.insert(0, entry);
        Some(&set[0].value)
    }

    /// Looks up `key` without touching recency state.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let set = &self.sets[Self::index_of(self.index_mask, key)];
        set.iter().find(|e| e.key == *key).map(|e| &e.value)
    }

    /// Inserts or updates `key`, promoting it to most recently used.
    ///
    /// Returns the evicted `(key, value)` pair if the set was full and an
    /// unrelated entry had to make room.
    pub fn write(&mut self, key: K, value: V) -> Option<(K, V)> {
        let set = &mut self.sets[Self::index_of(self.index_mask, &key)];
        if let Some(pos) = set.iter().position(|e| e.key == key) {
            let _ = set.remove(pos);
            set.insert(0, Entry { key, value });
            return None;
        }
        let evicted = if set.len() == self.ways {
            set.pop().map(|e| (e.key, e.value))
        } else {
            None
        };
        set.insert(0, Entry { key, value });
        evicted
    }

    #[inline]
    fn index_of(mask: u64, key: &K) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() & mask) as usize
    }
}
