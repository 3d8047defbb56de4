//! Generic in-memory LRU cache.
//!
//! Maintains entries in memory with automatic eviction of the least
//! recently used entry once the cache is full. Access order is tracked in
//! a plain `Vec`, the same shape as a hand-rolled single-threaded LRU.

use std::collections::HashMap;
use std::hash::Hash;

pub struct LruCache<K, V> {
    entries: HashMap<K, V>,
    /// Access order: oldest first, newest last.
    access_order: Vec<K>,
    capacity: usize,
}

impl<K: Clone + Eq + Hash, V> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self { entries: HashMap::with_capacity(capacity), access_order: Vec::with_capacity(capacity), capacity }
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        if self.entries.contains_key(key) {
            self.touch(key);
            self.entries.get(key)
        } else {
            None
        }
    }

    /// Inserts `value`, evicting the least recently used entry if the
    /// cache is already at capacity. Returns the evicted entry, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.entries.contains_key(&key) {
            self.remove_from_order(&key);
        }

        let evicted = if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.evict_oldest()
        } else {
            None
        };

        self.entries.insert(key.clone(), value);
        self.access_order.push(key);
        evicted
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_from_order(key);
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, key: &K) {
        self.remove_from_order(key);
        self.access_order.push(key.clone());
    }

    fn remove_from_order(&mut self, key: &K) {
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
    }

    fn evict_oldest(&mut self) -> Option<(K, V)> {
        if self.access_order.is_empty() {
            return None;
        }
        let oldest = self.access_order.remove(0);
        self.entries.remove(&oldest).map(|v| (oldest, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used_entry() {
        let mut cache: LruCache<i32, &str> = LruCache::new(2);
        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.insert(3, "c");
        assert!(!cache.contains(&1));
        assert!(cache.contains(&2));
        assert!(cache.contains(&3));
    }

    #[test]
    fn get_refreshes_access_order() {
        let mut cache: LruCache<i32, &str> = LruCache::new(2);
        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.get(&1);
        cache.insert(3, "c");
        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
    }

    #[test]
    fn reinserting_same_key_does_not_evict() {
        let mut cache: LruCache<i32, &str> = LruCache::new(2);
        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.insert(1, "a2");
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&1), Some(&"a2"));
    }
}
