//! In-process TTL cache for natural-language query responses.
//!
//! Entries are idempotent recomputations, not a source of truth: under
//! concurrent access two callers may both miss and both recompute, and the
//! last write wins.

use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use famgraph_core::TenantId;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub cached_at: SystemTime,
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            cached_at: SystemTime::now(),
            ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.age() > self.ttl
    }

    pub fn age(&self) -> Duration {
        self.cached_at.elapsed().unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

/// TTL cache keyed by (tenant, lowercased question).
pub struct ResponseCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    stats: Mutex<CacheStats>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            stats: Mutex::new(CacheStats::default()),
        }
    }

    pub fn key(tenant: &TenantId, question: &str) -> String {
        format!("{}:{}", tenant.as_str(), question.to_lowercase())
    }

    /// Fetch a live entry, returning the value and its age. Expired entries
    /// are removed on the way out.
    pub fn get(&self, key: &str) -> Option<(V, Duration)> {
        // The shard guard must be released before removing, so probe first.
        let probe = self.entries.get(key).map(|entry| {
            if entry.is_expired() {
                None
            } else {
                Some((entry.value.clone(), entry.age()))
            }
        });

        let hit = match probe {
            Some(Some(live)) => Some(live),
            Some(None) => {
                self.entries.remove(key);
                None
            }
            None => None,
        };

        let mut stats = self.stats.lock();
        if hit.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }

        hit
    }

    pub fn insert(&self, key: String, value: V) {
        debug!(key = %key, "caching response");
        self.entries.insert(key, CacheEntry::new(value, self.ttl));
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn evict_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before - self.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = *self.stats.lock();
        stats.entries = self.entries.len();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_within_ttl_reports_age() {
        let cache: ResponseCache<String> = ResponseCache::new(Duration::from_secs(300));
        let key = ResponseCache::<String>::key(&TenantId::from("fam-1"), "Who Notices Tasks?");
        assert_eq!(key, "fam-1:who notices tasks?");

        cache.insert(key.clone(), "answer".to_string());
        let (value, age) = cache.get(&key).expect("entry should be live");
        assert_eq!(value, "answer");
        assert!(age < Duration::from_secs(1));
    }

    #[test]
    fn expired_entry_misses_and_is_removed() {
        let cache: ResponseCache<String> = ResponseCache::new(Duration::ZERO);
        cache.insert("k".to_string(), "v".to_string());
        std::thread::sleep(Duration::from_millis(5));

        assert!(cache.get("k").is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn stats_track_hits_and_misses() {
        let cache: ResponseCache<u32> = ResponseCache::new(Duration::from_secs(60));
        cache.insert("a".to_string(), 1);

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn evict_expired_removes_only_dead_entries() {
        let cache: ResponseCache<u32> = ResponseCache::new(Duration::from_secs(60));
        cache.insert("live".to_string(), 1);
        cache
            .entries
            .insert("dead".to_string(), CacheEntry::new(2, Duration::ZERO));
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(cache.evict_expired(), 1);
        assert!(cache.get("live").is_some());
    }
}
