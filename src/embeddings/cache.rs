//! Content-addressed embedding cache
//!
//! Vectors are keyed by the hex sha-256 digest of the exact text bytes, so two
//! requests for byte-identical text share one entry. The cache is process-local
//! and, when a cap is configured, evicts a tenth of its entries on overflow.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
use sha2::Digest;
use sha2::Sha256;
use tracing::debug;

/// Cache statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct EmbeddingCache {
    entries: DashMap<String, Vec<f32>>,
    max_entries: Option<usize>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl EmbeddingCache {
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.filter(|&max| max > 0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Hex sha-256 digest of the text bytes
    pub fn key_for(text: &str) -> String {
        hex::encode(Sha256::digest(text.as_bytes()))
    }

    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        let found = self
            .entries
            .get(&Self::key_for(text))
            .map(|entry| entry.value().clone());

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    pub fn insert(&self, text: &str, embedding: Vec<f32>) {
        let key = Self::key_for(text);
        if let Some(max) = self.max_entries {
            if self.entries.len() >= max && !self.entries.contains_key(&key) {
                self.evict_entries();
            }
        }
        self.entries.insert(key, embedding);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn evict_entries(&self) {
        // Simple eviction: remove 10% of entries
        let evict_count = (self.entries.len() / 10).max(1);
        let keys_to_remove: Vec<String> = self
            .entries
            .iter()
            .take(evict_count)
            .map(|entry| entry.key().clone())
            .collect();

        for key in &keys_to_remove {
            self.entries.remove(key);
        }

        self.evictions
            .fetch_add(keys_to_remove.len() as u64, Ordering::Relaxed);
        debug!("Evicted {} embedding cache entries", keys_to_remove.len());
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_sha256_hex() {
        assert_eq!(
            EmbeddingCache::key_for(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(EmbeddingCache::key_for("a"), EmbeddingCache::key_for("a "));
    }

    #[test]
    fn test_hit_and_miss_counts() {
        let cache = EmbeddingCache::default();
        assert!(cache.get("hello").is_none());
        cache.insert("hello", vec![1.0, 2.0]);
        assert_eq!(cache.get("hello"), Some(vec![1.0, 2.0]));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cap_evicts_before_insert() {
        let cache = EmbeddingCache::new(Some(10));
        for i in 0..10 {
            cache.insert(&format!("text {i}"), vec![i as f32]);
        }
        assert_eq!(cache.len(), 10);

        cache.insert("one more", vec![0.0]);
        assert_eq!(cache.len(), 10);
        assert_eq!(cache.stats().evictions, 1);
        assert!(cache.get("one more").is_some());
    }

    #[test]
    fn test_reinserting_existing_key_does_not_evict() {
        let cache = EmbeddingCache::new(Some(2));
        cache.insert("a", vec![1.0]);
        cache.insert("b", vec![2.0]);
        cache.insert("a", vec![3.0]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.get("a"), Some(vec![3.0]));
    }

    #[test]
    fn test_clear() {
        let cache = EmbeddingCache::default();
        cache.insert("a", vec![1.0]);
        cache.clear();
        assert!(cache.is_empty());
    }
}
