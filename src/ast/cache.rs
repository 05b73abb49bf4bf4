//!
//! The bounded memoization cache.
//!

use std::hash::Hash;

use indexmap::IndexMap;

///
/// The bounded memoization cache evicting the least recently used entry.
///
#[derive(Debug, Clone)]
pub struct BoundedCache<K, V> {
    /// The maximal number of entries.
    capacity: usize,
    /// The entries, least recently used first.
    entries: IndexMap<K, V>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    ///
    /// A shortcut constructor.
    ///
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: IndexMap::with_capacity(capacity),
        }
    }

    ///
    /// Returns a copy of the cached value, marking it as recently used.
    ///
    pub fn get(&mut self, key: &K) -> Option<V> {
        let index = self.entries.get_index_of(key)?;
        let last = self.entries.len() - 1;
        self.entries.move_index(index, last);
        self.entries.get_index(last).map(|(_, value)| value.clone())
    }

    ///
    /// Caches the value, evicting the least recently used entry if full.
    ///
    pub fn insert(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(key, value);
    }

    ///
    /// The number of cached entries.
    ///
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    ///
    /// Whether the cache is empty.
    ///
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
