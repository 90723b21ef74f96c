// src/sanitize/cache.rs

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use super::tracker::DiscardRecord;

/// Thread-safe map whose values are computed at most once per key.
///
/// Concurrent first readers of a key share one slot: a single caller runs the
/// computation while the others wait on the slot and receive the same value.
/// The map lock is only held to find or create the slot, never while computing.
#[derive(Debug)]
pub struct OnceMap<K, V> {
    slots: RwLock<HashMap<K, Arc<OnceLock<V>>>>,
    capacity: Option<usize>,
}

impl<K, V> Default for OnceMap<K, V> {
    fn default() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            capacity: None,
        }
    }
}

impl<K, V> OnceMap<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Once `capacity` keys are stored, unknown keys are computed on every call
    /// and not remembered.
    pub fn with_capacity_limit(capacity: Option<usize>) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    pub fn get_or_compute<Q>(&self, key: &Q, compute: impl FnOnce() -> V) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        let existing = self.slots.read().get(key).cloned();
        let slot = match existing {
            Some(slot) => slot,
            None => {
                let mut slots = self.slots.write();
                match slots.get(key) {
                    Some(slot) => Arc::clone(slot),
                    None if self.capacity.is_some_and(|cap| slots.len() >= cap) => {
                        drop(slots);
                        return compute();
                    }
                    None => {
                        let slot = Arc::new(OnceLock::new());
                        slots.insert(key.to_owned(), Arc::clone(&slot));
                        slot
                    }
                }
            }
        };
        slot.get_or_init(compute).clone()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.slots.read().get(key).and_then(|slot| slot.get().cloned())
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A sanitized value together with what the policy removed to produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanEntry {
    pub value: String,
    pub discards: DiscardRecord,
}

/// Raw string to sanitized entry. Entries are never evicted.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: OnceMap<String, Arc<CleanEntry>>,
}

impl ResultCache {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: OnceMap::with_capacity_limit(capacity),
        }
    }

    pub fn get_or_compute(&self, raw: &str, compute: impl FnOnce() -> CleanEntry) -> Arc<CleanEntry> {
        self.entries.get_or_compute(raw, || Arc::new(compute()))
    }

    pub fn get(&self, raw: &str) -> Option<Arc<CleanEntry>> {
        self.entries.get(raw)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
