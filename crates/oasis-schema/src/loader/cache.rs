//! Cache of fetched documents keyed by canonical absolute location
//!
//! The cache sits behind an `RwLock` so one loader can serve several
//! threads. Reads only take the read lock; recency is tracked with atomics.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use url::Url;

/// Configuration for cache behavior
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum cache size (number of entries)
    pub max_entries: usize,
    /// Maximum age for cache entries
    pub max_age: Option<Duration>,
    /// Whether to enable cache
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            max_age: None,
            enabled: true,
        }
    }
}

impl CacheConfig {
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A cached document
#[derive(Debug)]
struct CacheEntry {
    content: Arc<Value>,
    cached_at: Instant,
    last_access: AtomicU64,
}

impl CacheEntry {
    fn is_fresh(&self, max_age: Option<Duration>) -> bool {
        max_age.map_or(true, |max_age| self.cached_at.elapsed() <= max_age)
    }
}

/// Thread-safe cache of parsed external documents
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    config: CacheConfig,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DocumentCache {
    /// Create a new cache with default configuration
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a new cache with custom configuration
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Canonical key of a location: the absolute URL without fragment
    pub fn key(location: &Url) -> String {
        let mut key = location.clone();
        key.set_fragment(None);
        key.to_string()
    }

    /// Look up a document
    pub fn get(&self, location: &Url) -> Option<Arc<Value>> {
        if !self.config.enabled {
            return None;
        }
        let key = Self::key(location);
        let (found, stale) = match self.entries.read() {
            Ok(entries) => match entries.get(&key) {
                Some(entry) if entry.is_fresh(self.config.max_age) => {
                    entry.last_access.store(self.tick(), Ordering::Relaxed);
                    (Some(Arc::clone(&entry.content)), false)
                }
                Some(_) => (None, true),
                None => (None, false),
            },
            Err(_) => (None, false),
        };
        if stale {
            if let Ok(mut entries) = self.entries.write() {
                // another writer may have refreshed it in between
                if entries.get(&key).is_some_and(|entry| !entry.is_fresh(self.config.max_age)) {
                    entries.remove(&key);
                }
            }
        }
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store a document, evicting the least recently used entry when full
    pub fn put(&self, location: &Url, content: Arc<Value>) {
        if !self.config.enabled || self.config.max_entries == 0 {
            return;
        }
        let key = Self::key(location);
        let Ok(mut entries) = self.entries.write() else {
            return;
        };
        if !entries.contains_key(&key) && entries.len() >= self.config.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access.load(Ordering::Relaxed))
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            CacheEntry {
                content,
                cached_at: Instant::now(),
                last_access: AtomicU64::new(self.tick()),
            },
        );
    }

    /// Check if the cache holds a document for the location
    pub fn contains(&self, location: &Url) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(&Self::key(location)))
            .unwrap_or(false)
    }

    /// Remove a specific entry from cache
    pub fn remove(&self, location: &Url) -> bool {
        self.entries
            .write()
            .map(|mut entries| entries.remove(&Self::key(location)).is_some())
            .unwrap_or(false)
    }

    /// Clear all cache entries
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.entries.read().map(|entries| entries.len()).unwrap_or(0),
            max_entries: self.config.max_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            enabled: self.config.enabled,
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }
}

/// Cache statistics for monitoring and debugging
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub total_entries: usize,
    pub max_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub enabled: bool,
}

impl CacheStats {
    /// Calculate cache utilization as a percentage
    pub fn utilization(&self) -> f64 {
        if self.max_entries == 0 {
            0.0
        } else {
            (self.total_entries as f64 / self.max_entries as f64) * 100.0
        }
    }

    /// Fraction of lookups that found a document
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_cache_operations() {
        let cache = DocumentCache::new();
        let location = url("file:///specs/pets.yaml");

        assert!(cache.get(&location).is_none());

        cache.put(&location, Arc::new(json!({"openapi": "3.1.0"})));
        let cached = cache.get(&url("file:///specs/pets.yaml#/components")).unwrap();
        assert_eq!(cached["openapi"], "3.1.0");
        assert!(cache.contains(&location));

        assert!(cache.remove(&location));
        assert!(cache.get(&location).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn test_cache_lru_eviction() {
        let cache = DocumentCache::with_config(CacheConfig::default().with_max_entries(2));
        let (a, b, c) = (url("file:///a.yaml"), url("file:///b.yaml"), url("file:///c.yaml"));

        cache.put(&a, Arc::new(json!(1)));
        cache.put(&b, Arc::new(json!(2)));
        // touch a so that b becomes the eviction candidate
        assert!(cache.get(&a).is_some());
        cache.put(&c, Arc::new(json!(3)));

        assert!(cache.contains(&a));
        assert!(!cache.contains(&b));
        assert!(cache.contains(&c));
        assert_eq!(cache.stats().utilization(), 100.0);
    }

    #[test]
    fn test_disabled_cache() {
        let cache = DocumentCache::with_config(CacheConfig::default().with_enabled(false));
        let location = url("file:///a.yaml");
        cache.put(&location, Arc::new(json!({})));
        assert!(cache.get(&location).is_none());
        assert!(!cache.contains(&location));
    }

    #[test]
    fn test_expired_entries_are_evicted_on_read() {
        let cache = DocumentCache::with_config(
            CacheConfig::default().with_max_age(Some(Duration::from_millis(1))),
        );
        let location = url("file:///a.yaml");
        cache.put(&location, Arc::new(json!({})));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&location).is_none());
        assert!(!cache.contains(&location));
        assert_eq!(cache.stats().total_entries, 0);
    }
}
