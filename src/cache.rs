//! Compiled pattern caching.
//!
//! This module provides [`MatcherCache`]: an LRU cache from pattern strings
//! to compiled [`PathMatcher`]s. It is gated behind the `cache` feature flag
//! and uses the [`lru`] crate internally.
//!
//! Compilation is pure, so a cached matcher is interchangeable with a freshly
//! compiled one; the cache only saves the regex build when routes of the
//! same router register the same pattern. Each router owns its own cache.
//!
//! [`CacheStats`] tracks hits and misses so you can monitor effectiveness.
//!
//! # Examples
//!
//! ```
//! use page_router::cache::MatcherCache;
//!
//! let mut cache = MatcherCache::new();
//! cache.get_or_compile("/users/:id").unwrap();
//! cache.get_or_compile("/users/:id").unwrap();
//!
//! assert_eq!(cache.stats().hits, 1);
//! assert_eq!(cache.stats().misses, 1);
//! ```

use crate::error::RouterError;
use crate::matching::PathMatcher;
use crate::trace_log;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Counters tracking cache hit/miss rates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: usize,
    /// Lookups that had to compile.
    pub misses: usize,
    /// Entries dropped to make room.
    pub evictions: usize,
}

impl CacheStats {
    /// Return the hit rate as a value in `0.0..=1.0`.
    ///
    /// Returns `0.0` if no lookups have been performed.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of compiled path patterns.
#[derive(Debug)]
pub struct MatcherCache {
    matchers: LruCache<String, PathMatcher>,
    stats: CacheStats,
}

impl MatcherCache {
    /// Capacity used by [`MatcherCache::new`].
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a cache holding at most `capacity` matchers.
    ///
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            matchers: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Return the cached matcher for `pattern`, compiling it on a miss.
    ///
    /// Patterns that fail to compile are not cached.
    pub fn get_or_compile(&mut self, pattern: &str) -> Result<PathMatcher, RouterError> {
        if let Some(matcher) = self.matchers.get(pattern) {
            self.stats.hits += 1;
            trace_log!("Matcher cache hit for '{}'", pattern);
            return Ok(matcher.clone());
        }

        self.stats.misses += 1;
        trace_log!("Matcher cache miss for '{}'", pattern);
        let matcher = PathMatcher::compile(pattern)?;
        if self
            .matchers
            .push(pattern.to_string(), matcher.clone())
            .is_some_and(|(evicted, _)| evicted != pattern)
        {
            self.stats.evictions += 1;
        }
        Ok(matcher)
    }

    /// Return a reference to the current cache statistics.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Number of cached matchers.
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// Return `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Drop every cached matcher. Statistics are kept.
    pub fn clear(&mut self) {
        self.matchers.clear();
    }
}

impl Default for MatcherCache {
    fn default() -> Self {
        Self::new()
    }
}
