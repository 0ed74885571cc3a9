//! Bounded caches for rendered markdown fragments.
//!
//! The renderer keeps three independent caches per instance (code blocks,
//! tables, LaTeX fragments). Each one is an [`LruCache`] bounded by entry
//! count: every read promotes the key to most-recently-used, and an insert
//! that pushes the cache over capacity evicts the least-recently-used entry.
//!
//! There is no time-based expiry and no locking. A cache is owned by exactly
//! one renderer and mutated only through `&mut self`.
//!
//! # Example
//!
//! ```
//! use safemark_cache::LruCache;
//!
//! let mut cache = LruCache::new("fragments", 2);
//! let html = cache.get_or_create("a", || "<b>a</b>".to_owned());
//! assert_eq!(html, "<b>a</b>");
//!
//! // Second lookup is served from the cache; the builder is not called.
//! let again = cache.get_or_create("a", || unreachable!());
//! assert_eq!(again, "<b>a</b>");
//! assert_eq!(cache.stats().hits, 1);
//! ```

mod lru;

pub use lru::{CacheStats, LruCache};

/// Default number of entries kept by each renderer cache.
pub const DEFAULT_CAPACITY: usize = 100;
