//! Concurrency-safe associative store
//!
//! Transport receive callbacks arrive on whatever task the socket library
//! chose; correctness must not depend on that task being the caller's. This
//! map is the one state container the session and provider layers use to
//! bridge callback tasks into caller-visible state.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;

/// A guarded map safe under concurrent access from multiple execution
/// contexts.
///
/// Reads observe either the prior or the newly-written value for a key, never
/// a torn state. Writes to different keys proceed concurrently; writes to the
/// same key serialize. Cloning is cheap and yields a handle to the same
/// underlying store.
pub struct SharedMap<K, V> {
    inner: Arc<DashMap<K, V>>,
}

impl<K: Eq + Hash, V: Clone> SharedMap<K, V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Get a value by key
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).map(|entry| entry.value().clone())
    }

    /// Set a value, replacing any prior value for the key
    pub fn set(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    /// Remove a value, returning it if present
    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.remove(key).map(|(_, value)| value)
    }

    /// Check if a key is present
    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.inner.clear();
    }
}

impl<K: Eq + Hash, V: Clone> Default for SharedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for SharedMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
