//! In-memory cache for upstream station responses.
//!
//! Keys are the encoded effective query string (see
//! `StationQuery::cache_key`), values are the raw upstream body with its
//! content type.
//!
//! ## Eviction Strategy
//! - Entry-count LRU eviction when the bound is exceeded
//! - TTL-based expiration on read (lazy)

use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// A cached upstream response as handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBody {
    /// Upstream body, verbatim.
    pub body: String,
    /// Content-Type of the original fetch.
    pub content_type: String,
}

struct CacheEntry {
    value: CachedBody,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() >= ttl
    }
}

/// Counters for the station cache.
#[derive(Default)]
pub struct StationCacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    /// Entries dropped by the LRU bound.
    pub evictions: AtomicU64,
    /// Entries dropped because their TTL elapsed.
    pub expired: AtomicU64,
}

impl StationCacheStats {
    /// Cache hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// Point-in-time view of the cache, served by the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StationCacheSnapshot {
    pub entries: usize,
    pub max_entries: usize,
    pub ttl_secs: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expired: u64,
    pub hit_rate: f64,
}

/// LRU cache with a fixed TTL, shared by all request handlers.
pub struct StationCache {
    cache: RwLock<LruCache<String, CacheEntry>>,
    ttl: Duration,
    stats: StationCacheStats,
}

impl StationCache {
    /// Create a cache holding at most `max_entries` responses for `ttl`.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);

        tracing::info!(
            max_entries = capacity.get(),
            ttl_secs = ttl.as_secs(),
            "StationCache initialized"
        );

        Self {
            cache: RwLock::new(LruCache::new(capacity)),
            ttl,
            stats: StationCacheStats::default(),
        }
    }

    /// Look up a live entry. Expired entries are removed and count as a miss.
    pub async fn get(&self, key: &str) -> Option<CachedBody> {
        // LruCache::get promotes the entry, so even reads need the write lock.
        let mut cache = self.cache.write().await;

        let expired = match cache.get(key) {
            Some(entry) if !entry.is_expired(self.ttl) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            cache.pop(key);
            self.stats.expired.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key, "StationCache entry expired");
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a response, replacing any previous entry for `key`.
    pub async fn put(&self, key: String, value: CachedBody) {
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
        };

        let mut cache = self.cache.write().await;
        if let Some((evicted_key, _)) = cache.push(key.clone(), entry) {
            if evicted_key != key {
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %evicted_key, "StationCache evicted LRU entry");
            }
        }
    }

    /// Number of entries currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }

    /// Whether `key` is held, without touching recency or stats.
    pub async fn contains(&self, key: &str) -> bool {
        self.cache.read().await.contains(key)
    }

    pub fn stats(&self) -> &StationCacheStats {
        &self.stats
    }

    pub async fn snapshot(&self) -> StationCacheSnapshot {
        let cache = self.cache.read().await;
        StationCacheSnapshot {
            entries: cache.len(),
            max_entries: cache.cap().get(),
            ttl_secs: self.ttl.as_secs(),
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            evictions: self.stats.evictions.load(Ordering::Relaxed),
            expired: self.stats.expired.load(Ordering::Relaxed),
            hit_rate: self.stats.hit_rate(),
        }
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        let count = cache.len();
        cache.clear();
        tracing::info!(count, "StationCache cleared");
    }
}
