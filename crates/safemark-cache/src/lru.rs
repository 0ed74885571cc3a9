//! Least-recently-used cache keyed by fingerprint strings.

use std::num::NonZeroUsize;

/// Counters describing how a cache has been used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to invoke the builder.
    pub misses: u64,
    /// Entries dropped because the cache was over capacity.
    pub evictions: u64,
}

/// Count-bounded LRU cache with usage statistics.
///
/// Wraps [`lru::LruCache`]; this type adds the build-on-miss entry point,
/// hit/miss/eviction counters and eviction logging.
#[derive(Debug)]
pub struct LruCache<V> {
    name: &'static str,
    entries: lru::LruCache<String, V>,
    stats: CacheStats,
}

impl<V: Clone> LruCache<V> {
    /// Create an empty cache holding at most `capacity` entries.
    ///
    /// `name` only labels log output.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let Some(capacity) = NonZeroUsize::new(capacity) else {
            panic!("cache capacity must be at least 1");
        };
        Self {
            name,
            entries: lru::LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Return the cached value for `key`, building and inserting it on a miss.
    ///
    /// `build` runs at most once per key until that key is evicted.
    pub fn get_or_create<F>(&mut self, key: &str, build: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(key) {
            return value;
        }

        let value = build();
        self.insert(key.to_owned(), value.clone());
        value
    }

    /// Look up `key`, promoting it to most-recently-used on a hit.
    ///
    /// Callers that cannot express their builder as a closure pair this with
    /// [`insert`](Self::insert); a `None` here counts as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let Some(value) = self.entries.get(key).cloned() else {
            self.stats.misses += 1;
            return None;
        };
        self.stats.hits += 1;
        Some(value)
    }

    /// Insert or replace an entry and evict the oldest one if over capacity.
    pub fn insert(&mut self, key: String, value: V) {
        // `push` hands back either the replaced entry (same key) or the evicted one
        if let Some((evicted, _)) = self.entries.push(key.clone(), value)
            && evicted != key
        {
            self.stats.evictions += 1;
            tracing::debug!(cache = self.name, key = %evicted, "Evicted least-recently-used entry");
        }
    }

    /// Check whether `key` is cached without touching its recency.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Usage counters since creation.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drop every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
