//! Caller-owned cache of compiled queries keyed by selector text.
//!
//! The engine keeps no global state. Callers that see the same selectors
//! over and over hold a [`QueryCache`] and compile through it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::compiler::CompiledQuery;
use crate::error::SelectorError;
use crate::options::CompileOptions;
use crate::query::compile_with;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryCacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to compile
    pub misses: u64,
    /// Entries dropped to stay within capacity
    pub evictions: u64,
}

impl QueryCacheStats {
    /// Total lookups
    #[must_use]
    pub const fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

struct CacheEntry {
    query: Arc<CompiledQuery>,
    last_access: u64,
}

/// Bounded map from selector text to compiled query.
///
/// When full, the least recently used entry is evicted. Compilation errors
/// are returned to the caller and never cached.
pub struct QueryCache {
    options: CompileOptions,
    entries: HashMap<String, CacheEntry>,
    /// LRU counter
    clock: u64,
    max_entries: usize,
    stats: QueryCacheStats,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(256)
    }
}

impl QueryCache {
    /// Create a cache holding at most `max_entries` queries compiled with
    /// default options. A capacity of zero disables caching.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self::with_options(max_entries, CompileOptions::default())
    }

    /// Create a cache whose queries are compiled with `options`.
    #[must_use]
    pub fn with_options(max_entries: usize, options: CompileOptions) -> Self {
        Self {
            options,
            entries: HashMap::with_capacity(max_entries.min(1024)),
            clock: 0,
            max_entries,
            stats: QueryCacheStats::default(),
        }
    }

    /// Return the compiled query for `text`, compiling it on a miss.
    ///
    /// # Errors
    ///
    /// Returns the compilation error for invalid selector text.
    pub fn get_or_compile(&mut self, text: &str) -> Result<Arc<CompiledQuery>, SelectorError> {
        self.clock += 1;
        if let Some(entry) = self.entries.get_mut(text) {
            entry.last_access = self.clock;
            self.stats.hits += 1;
            return Ok(Arc::clone(&entry.query));
        }

        self.stats.misses += 1;
        let query = Arc::new(compile_with(text, &self.options)?);
        if self.max_entries == 0 {
            return Ok(query);
        }

        while self.entries.len() >= self.max_entries {
            self.evict_lru();
        }
        let _ = self.entries.insert(
            text.to_string(),
            CacheEntry {
                query: Arc::clone(&query),
                last_access: self.clock,
            },
        );
        Ok(query)
    }

    /// Whether `text` is currently cached. Does not count as an access.
    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(text)
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(text, _)| text.clone());
        if let Some(text) = oldest {
            let _ = self.entries.remove(&text);
            self.stats.evictions += 1;
        }
    }

    /// Drop every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Get statistics
    #[must_use]
    pub const fn stats(&self) -> &QueryCacheStats {
        &self.stats
    }

    /// Options every cached query is compiled with.
    #[must_use]
    pub const fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Number of cached queries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hits_and_misses() {
        let mut cache = QueryCache::new(4);
        let first = cache.get_or_compile("div > p").unwrap();
        let second = cache.get_or_compile("div > p").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            *cache.stats(),
            QueryCacheStats {
                hits: 1,
                misses: 1,
                evictions: 0
            }
        );
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let mut cache = QueryCache::new(2);
        let _ = cache.get_or_compile("a").unwrap();
        let _ = cache.get_or_compile("b").unwrap();
        let _ = cache.get_or_compile("a").unwrap();
        let _ = cache.get_or_compile("c").unwrap();

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let mut cache = QueryCache::new(2);
        assert!(cache.get_or_compile("a >").is_err());
        assert!(cache.get_or_compile("a >").is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_zero_capacity_never_stores() {
        let mut cache = QueryCache::new(0);
        let _ = cache.get_or_compile("a").unwrap();
        let _ = cache.get_or_compile("a").unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 0);
    }
}
