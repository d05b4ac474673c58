//! Caching module for catalog-scout
//!
//! Provides the TTL-bounded listing cache used by every read path and the
//! session-lifetime enrichment cache.

mod key;

pub use key::{profile_fingerprint, CacheKey};

use crate::catalog::{ImageRefs, ItemId};
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tokio::time::Instant;

/// A cached value and the moment it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: Instant,
}

impl<V> CacheEntry<V> {
    /// An entry is valid iff its age is strictly below the TTL
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

/// Key/value store with a single, cache-wide time-to-live
///
/// Expiry is passive: stale entries are never returned, but they are only
/// replaced by the next `set` for the same key, never scrubbed.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    /// Create a new cache with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Get a fresh value; absent when never set or when age >= TTL
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().ok()?;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(self.ttl, Instant::now()))
            .map(|entry| entry.value.clone())
    }

    /// Store a value, unconditionally overwriting and stamping the current time
    pub fn set(&self, key: impl Into<String>, value: V) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key.into(),
                CacheEntry {
                    value,
                    stored_at: Instant::now(),
                },
            );
        }
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::DEFAULT_CACHE_TTL_MS))
    }
}

/// Metadata fetched from the secondary provider for one identifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentEntry {
    pub images: ImageRefs,
    pub canonical_title: Option<String>,
    pub tags: Vec<String>,
}

/// Session-lifetime cache of enrichment lookups
///
/// No TTL and no capacity bound: provider metadata for a stable identifier
/// is treated as immutable for the session.
#[derive(Clone)]
pub struct EnrichmentCache {
    cache: Cache<ItemId, EnrichmentEntry>,
}

impl EnrichmentCache {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder().build(),
        }
    }

    /// Get cached metadata for an identifier
    pub async fn get(&self, id: &ItemId) -> Option<EnrichmentEntry> {
        self.cache.get(id).await
    }

    /// Store metadata for an identifier
    pub async fn set(&self, id: ItemId, entry: EnrichmentEntry) {
        self.cache.insert(id, entry).await;
    }

    /// Check whether an identifier has been looked up successfully
    pub fn contains(&self, id: &ItemId) -> bool {
        self.cache.contains_key(id)
    }
}

impl Default for EnrichmentCache {
    fn default() -> Self {
        Self::new()
    }
}
