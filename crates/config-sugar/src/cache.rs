//! Once-per-key memoizing cache for type descriptors.
//!
//! Keys are spread over independently locked shards so unrelated lookups do
//! not serialize on one lock. Each key owns a `OnceLock` cell: the first
//! caller computes the value while concurrent callers for the same key wait on
//! that cell only, and every later read is a shard read-lock plus a clone of
//! an `Arc`.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

const DEFAULT_SHARDS: usize = 16;

type Cell<V> = Arc<OnceLock<Arc<V>>>;

pub struct DescriptorCache<K, V> {
    shards: Box<[RwLock<HashMap<K, Cell<V>>>]>,
    hasher: RandomState,
    computed: AtomicUsize,
}

impl<K, V> DescriptorCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    pub fn with_shards(shards: usize) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| RwLock::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            shards,
            hasher: RandomState::new(),
            computed: AtomicUsize::new(0),
        }
    }

    fn shard(&self, key: &K) -> &RwLock<HashMap<K, Cell<V>>> {
        let index = (self.hasher.hash_one(key) as usize) % self.shards.len();
        &self.shards[index]
    }

    // The maps only ever gain fully constructed cells, so a poisoned lock
    // still guards consistent data.
    fn cell(&self, key: &K) -> Cell<V> {
        let shard = self.shard(key);
        if let Some(cell) = shard
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Arc::clone(cell);
        }
        let mut map = shard.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(key.clone()).or_default())
    }

    /// Published value for `key`, if any
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let shard = self
            .shard(key)
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        shard.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Return the value for `key`, computing it with `init` exactly once.
    ///
    /// `init` runs without any shard lock held, so it may itself call back
    /// into the cache for other keys.
    pub fn get_or_init(&self, key: &K, init: impl FnOnce() -> V) -> Arc<V> {
        let cell = self.cell(key);
        Arc::clone(cell.get_or_init(|| {
            self.computed.fetch_add(1, Ordering::Relaxed);
            Arc::new(init())
        }))
    }

    /// Number of values computed so far
    pub fn computed(&self) -> usize {
        self.computed.load(Ordering::Relaxed)
    }

    /// Number of published values
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .values()
                    .filter(|cell| cell.get().is_some())
                    .count()
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for DescriptorCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for DescriptorCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorCache")
            .field("shards", &self.shards.len())
            .field("computed", &self.computed.load(Ordering::Relaxed))
            .finish()
    }
}
