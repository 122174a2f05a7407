//! Cache Store Module
//!
//! Concurrent key/entry mapping shared by the cache facade, the sweeper and the
//! pause controller.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::cache::CacheEntry;

type Generation<K, V> = Arc<DashMap<K, CacheEntry<V>>>;

// == Store ==
/// Concurrency-safe mapping from key to [`CacheEntry`].
///
/// Entries live in a sharded `DashMap`. The map itself is a generation held
/// behind a lock so that [`Store::clear`] can swap in a fresh, empty map in a
/// single step: every operation runs against exactly one generation and never
/// observes a half-cleared state.
#[derive(Debug)]
pub struct Store<K, V>
where
    K: Eq + Hash,
{
    map: RwLock<Generation<K, V>>,
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            map: RwLock::new(Arc::new(DashMap::new())),
        }
    }

    // == Get ==
    /// Returns a copy of the entry for `key` without touching its expiry.
    pub fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        let map = self.map.read();
        let entry = map.get(key).map(|e| e.value().clone());
        entry
    }

    /// Returns the expiration instant for `key`, if present.
    pub fn expires_at(&self, key: &K) -> Option<i64> {
        let map = self.map.read();
        let expires_at = map.get(key).map(|e| e.expires_at);
        expires_at
    }

    // == Put ==
    /// Inserts or replaces the entry for `key`. Last writer wins.
    pub fn put(&self, key: K, entry: CacheEntry<V>) {
        self.map.read().insert(key, entry);
    }

    // == Refresh ==
    /// Extends the expiry of `key` by `secs` in place and returns its value.
    ///
    /// The extension is added to the current deadline, so repeated refreshes
    /// accumulate.
    pub fn refresh(&self, key: &K, secs: i64) -> Option<V> {
        let map = self.map.read();
        let value = map.get_mut(key).map(|mut e| {
            e.extend(secs);
            e.value.clone()
        });
        value
    }

    // == Contains ==
    /// Checks presence without touching the expiry.
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.read().contains_key(key)
    }

    // == Remove ==
    /// Removes `key` if present. Returns whether something was removed.
    pub fn remove(&self, key: &K) -> bool {
        self.map.read().remove(key).is_some()
    }

    /// Removes every key in `keys` unconditionally.
    ///
    /// Returns the number of entries actually removed.
    pub fn remove_all(&self, keys: &[K]) -> usize {
        let map = self.map.read();
        let mut removed = 0;
        for key in keys {
            if map.remove(key).is_some() {
                removed += 1;
            }
        }
        removed
    }

    // == Keys ==
    /// Snapshot of the keys present at the time of the call.
    pub fn keys(&self) -> Vec<K> {
        let map = self.map.read();
        let keys = map.iter().map(|e| e.key().clone()).collect();
        keys
    }

    // == Shift All ==
    /// Adds `secs` to the expiry of every entry.
    pub fn shift_all(&self, secs: i64) -> usize {
        let map = self.map.read();
        let mut shifted = 0;
        for mut entry in map.iter_mut() {
            entry.expires_at = entry.expires_at.saturating_add(secs);
            shifted += 1;
        }
        shifted
    }

    // == Clear ==
    /// Replaces the whole mapping with a new empty generation.
    pub fn clear(&self) {
        *self.map.write() = Arc::new(DashMap::new());
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

impl<K, V> Default for Store<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn entry(value: &str, expires_at: i64) -> CacheEntry<String> {
        CacheEntry {
            value: value.to_string(),
            expires_at,
        }
    }

    #[test]
    fn test_store_new() {
        let store: Store<String, String> = Store::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_put_and_get() {
        let store = Store::new();

        store.put("key1".to_string(), entry("value1", 10));
        let found = store.get(&"key1".to_string()).unwrap();

        assert_eq!(found.value, "value1");
        assert_eq!(found.expires_at, 10);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_does_not_mutate() {
        let store = Store::new();
        store.put("key1".to_string(), entry("value1", 10));

        store.get(&"key1".to_string());
        store.get(&"key1".to_string());

        assert_eq!(store.expires_at(&"key1".to_string()), Some(10));
    }

    #[test]
    fn test_store_overwrite() {
        let store = Store::new();

        store.put("key1".to_string(), entry("value1", 10));
        store.put("key1".to_string(), entry("value2", 20));

        let found = store.get(&"key1".to_string()).unwrap();
        assert_eq!(found.value, "value2");
        assert_eq!(found.expires_at, 20);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_refresh_accumulates() {
        let store = Store::new();
        store.put("key1".to_string(), entry("value1", 10));

        assert_eq!(store.refresh(&"key1".to_string(), 10).as_deref(), Some("value1"));
        assert_eq!(store.refresh(&"key1".to_string(), 10).as_deref(), Some("value1"));
        assert_eq!(store.expires_at(&"key1".to_string()), Some(30));
    }

    #[test]
    fn test_store_refresh_missing() {
        let store: Store<String, String> = Store::new();
        assert!(store.refresh(&"missing".to_string(), 10).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_remove() {
        let store = Store::new();
        store.put("key1".to_string(), entry("value1", 10));

        assert!(store.remove(&"key1".to_string()));
        assert!(!store.remove(&"key1".to_string()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_remove_all() {
        let store = Store::new();
        store.put("a".to_string(), entry("1", 10));
        store.put("b".to_string(), entry("2", 10));
        store.put("c".to_string(), entry("3", 10));

        let removed = store.remove_all(&["a".to_string(), "c".to_string(), "zz".to_string()]);

        assert_eq!(removed, 2);
        assert_eq!(store.keys(), vec!["b".to_string()]);
    }

    #[test]
    fn test_store_shift_all() {
        let store = Store::new();
        store.put("a".to_string(), entry("1", 10));
        store.put("b".to_string(), entry("2", 25));

        assert_eq!(store.shift_all(100), 2);
        assert_eq!(store.expires_at(&"a".to_string()), Some(110));
        assert_eq!(store.expires_at(&"b".to_string()), Some(125));
    }

    #[test]
    fn test_store_shift_all_saturates() {
        let store = Store::new();
        store.put("a".to_string(), entry("1", 10));

        store.shift_all(i64::MAX);
        assert_eq!(store.expires_at(&"a".to_string()), Some(i64::MAX));
    }

    #[test]
    fn test_store_clear() {
        let store = Store::new();
        store.put("a".to_string(), entry("1", 10));
        store.put("b".to_string(), entry("2", 10));

        store.clear();

        assert_eq!(store.len(), 0);
        assert!(store.keys().is_empty());

        store.put("c".to_string(), entry("3", 10));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_concurrent_puts_distinct_keys() {
        let store = Arc::new(Store::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..500 {
                        store.put(format!("{}-{}", t, i), entry("v", 10));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 8 * 500);
    }

    #[test]
    fn test_store_concurrent_puts_same_key() {
        let store = Arc::new(Store::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..200 {
                        store.put("shared".to_string(), entry(&t.to_string(), 10));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 1);
        let value: u32 = store.get(&"shared".to_string()).unwrap().value.parse().unwrap();
        assert!(value < 8);
    }
}
