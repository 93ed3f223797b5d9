//! Generic in-memory write-through cache.
//!
//! Trades memory for database round-trips on hot-path lookups (session
//! validation runs on every authenticated request). The cache is a shadow of
//! the database, never the source of truth: divergence is resolved by
//! re-fetching on miss and re-populating. Invalidation is explicit; there is
//! no TTL and no eviction, which is only acceptable because the cached
//! entity sets (sessions, clients) are modest in cardinality.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

/// Key-addressed cache over full entity values.
///
/// The key is derived from the value by the extraction function supplied at
/// construction, so callers insert whole entities and never compute keys by
/// hand. A single mutex serializes all access; every operation is a short
/// O(1)/O(n) map operation and the lock is never held across I/O.
pub struct EntityCache<K, V> {
    extract_key: Box<dyn Fn(&V) -> K + Send + Sync>,
    entries: Mutex<HashMap<K, V>>,
}

impl<K, V> EntityCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache with the given key-extraction function.
    pub fn new(extract_key: impl Fn(&V) -> K + Send + Sync + 'static) -> Self {
        Self {
            extract_key: Box::new(extract_key),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Insert or overwrite a value under its derived key.
    pub fn insert(&self, value: V) {
        let key = (self.extract_key)(&value);
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let _ = entries.insert(key, value);
    }

    /// Insert or overwrite multiple values.
    pub fn insert_many(&self, values: impl IntoIterator<Item = V>) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        for value in values {
            let key = (self.extract_key)(&value);
            let _ = entries.insert(key, value);
        }
    }

    /// Look up a value by key. `None` means the caller must fall back to
    /// the persistent store.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .get(key)
            .cloned()
    }

    /// Remove the entry under `key`, if any.
    pub fn remove(&self, key: &K) {
        let _ = self.entries.lock().expect("cache lock poisoned").remove(key);
    }

    /// Remove all entries whose keys appear in `keys`.
    pub fn remove_many<'k>(&self, keys: impl IntoIterator<Item = &'k K>)
    where
        K: 'k,
    {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        for key in keys {
            let _ = entries.remove(key);
        }
    }

    /// Clear the cache and bulk-load it with `values`.
    pub fn initialize(&self, values: impl IntoIterator<Item = V>) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.clear();
        for value in values {
            let key = (self.extract_key)(&value);
            let _ = entries.insert(key, value);
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> std::fmt::Debug for EntityCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCache").finish_non_exhaustive()
    }
}
