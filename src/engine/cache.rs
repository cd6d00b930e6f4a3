//! Thread-safe LRU cache for finished results.
//!
//! Values are handed out as `Arc`s, so evicting an entry never frees data that
//! a reader still holds. Pinned entries are never evicted, only removed by an
//! explicit `erase`.

use crate::config::EngineConfig;
use crate::engine::result_table::ResultTable;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;

/// Cache of result tables keyed by the cache key of their computation.
pub type ResultCache = LruCache<String, ResultTable>;

impl ResultCache {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.result_cache_capacity)
    }
}

/// Outcome of `try_emplace`.
#[derive(Debug)]
pub struct TryEmplace<V> {
    /// `true` if the value was created by this call. The caller is then the
    /// producer of the value, everybody else only reads it.
    pub inserted: bool,
    pub value: Arc<V>,
}

#[derive(Debug)]
struct Inner<K, V> {
    capacity: usize,
    /// Monotonic access counter, the smallest tick is the least recently used.
    next_tick: u64,
    entries: HashMap<K, (Arc<V>, u64)>,
    order: BTreeMap<u64, K>,
    pinned: HashMap<K, Arc<V>>,
}

impl<K: Hash + Eq + Clone, V> Inner<K, V> {
    fn touch(&mut self, key: &K) -> Option<Arc<V>> {
        let tick = self.next_tick;
        let (value, old_tick) = self.entries.get_mut(key)?;
        let old_tick = std::mem::replace(old_tick, tick);
        let value = Arc::clone(value);
        self.next_tick += 1;
        self.order.remove(&old_tick);
        self.order.insert(tick, key.clone());
        Some(value)
    }

    fn insert_unpinned(&mut self, key: K, value: Arc<V>) {
        if let Some((_, old_tick)) = self.entries.remove(&key) {
            self.order.remove(&old_tick);
        }
        let tick = self.next_tick;
        self.next_tick += 1;
        self.order.insert(tick, key.clone());
        self.entries.insert(key, (value, tick));
        self.shrink_to_capacity();
    }

    fn remove_unpinned(&mut self, key: &K) -> Option<Arc<V>> {
        let (value, tick) = self.entries.remove(key)?;
        self.order.remove(&tick);
        Some(value)
    }

    fn shrink_to_capacity(&mut self) {
        while self.entries.len() > self.capacity {
            let Some((_, key)) = self.order.pop_first() else {
                break;
            };
            self.entries.remove(&key);
            log::debug!("Evicted least recently used cache entry");
        }
    }
}

/// A fixed-capacity cache with least-recently-used eviction.
#[derive(Debug)]
pub struct LruCache<K, V> {
    inner: Mutex<Inner<K, V>>,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// Creates a cache holding at most `capacity` unpinned entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity,
                next_tick: 0,
                entries: HashMap::new(),
                order: BTreeMap::new(),
                pinned: HashMap::new(),
            }),
        }
    }

    /// Find the value for `key` or create it with `make`, as one atomic step.
    ///
    /// Doing both under one lock guarantees that the value found is not
    /// evicted between the lookup and the retrieval.
    pub fn try_emplace(&self, key: K, make: impl FnOnce() -> V) -> TryEmplace<V> {
        let mut inner = self.inner.lock();
        if let Some(value) = inner.pinned.get(&key) {
            return TryEmplace {
                inserted: false,
                value: Arc::clone(value),
            };
        }
        if let Some(value) = inner.touch(&key) {
            return TryEmplace {
                inserted: false,
                value,
            };
        }
        let value = Arc::new(make());
        inner.insert_unpinned(key, Arc::clone(&value));
        TryEmplace {
            inserted: true,
            value,
        }
    }

    /// Like `try_emplace`, but the entry is pinned afterwards, also if it
    /// already existed.
    pub fn try_emplace_pinned(&self, key: K, make: impl FnOnce() -> V) -> TryEmplace<V> {
        let mut inner = self.inner.lock();
        if let Some(value) = inner.pinned.get(&key) {
            return TryEmplace {
                inserted: false,
                value: Arc::clone(value),
            };
        }
        if let Some(value) = inner.remove_unpinned(&key) {
            inner.pinned.insert(key, Arc::clone(&value));
            return TryEmplace {
                inserted: false,
                value,
            };
        }
        let value = Arc::new(make());
        inner.pinned.insert(key, Arc::clone(&value));
        TryEmplace {
            inserted: true,
            value,
        }
    }

    /// Look up a value without creating one. Counts as an access.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let mut inner = self.inner.lock();
        if let Some(value) = inner.pinned.get(key) {
            return Some(Arc::clone(value));
        }
        inner.touch(key)
    }

    /// Insert or replace an unpinned entry.
    pub fn insert(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.inner.lock().insert_unpinned(key, Arc::clone(&value));
        value
    }

    pub fn contains(&self, key: &K) -> bool {
        let inner = self.inner.lock();
        inner.pinned.contains_key(key) || inner.entries.contains_key(key)
    }

    /// Remove an entry, pinned or not. Does nothing if the key is absent.
    pub fn erase(&self, key: &K) {
        let mut inner = self.inner.lock();
        if inner.pinned.remove(key).is_none() {
            inner.remove_unpinned(key);
        }
    }

    /// Remove all unpinned entries.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Change the capacity, evicting least recently used entries if needed.
    pub fn set_capacity(&self, capacity: usize) {
        let mut inner = self.inner.lock();
        inner.capacity = capacity;
        inner.shrink_to_capacity();
    }

    /// Number of entries, pinned ones included.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock();
        inner.entries.len() + inner.pinned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
