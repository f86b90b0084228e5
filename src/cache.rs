//! TTL cache in front of the batch like-status endpoints.
//!
//! Keys are the sorted, comma-joined id list, so any ordering of the same
//! ids lands on one entry. One cache per client; callers clear it after a
//! like/unlike so the next read goes to the network.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::Instant;
use tracing::debug;

use crate::api::LikeBackend;
use crate::config::CacheConfig;
use crate::error::ApiError;
use crate::metrics::{CACHE_HITS, CACHE_MISSES, CACHE_SIZE};

// Cache entry with timestamp
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub data: HashMap<String, bool>,
    pub created_at: Instant,
    // Insertion order, several entries can share one `created_at`
    pub seq: u64,
}

// "c,a,b" and "b,a,c" both become "a,b,c"
pub fn make_cache_key<S: AsRef<str>>(ids: &[S]) -> String {
    let mut sorted: Vec<&str> = ids.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    sorted.join(",")
}

#[derive(Debug)]
pub struct BatchStatusCache {
    entries: DashMap<String, CacheEntry>,
    next_seq: AtomicU64,
    config: CacheConfig,
}

impl Default for BatchStatusCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl BatchStatusCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            next_seq: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Fresh data for the key, stale entries are dropped on the way
    pub fn get(&self, key: &str) -> Option<HashMap<String, bool>> {
        let stale = match self.entries.get(key) {
            Some(entry) if entry.created_at.elapsed() < self.config.ttl => {
                return Some(entry.data.clone());
            }
            Some(_) => true,
            None => false,
        };
        if stale {
            self.entries.remove(key);
            CACHE_SIZE.set(self.entries.len() as f64);
        }
        None
    }

    pub fn insert(&self, key: String, data: HashMap<String, bool>) {
        self.entries.insert(
            key,
            CacheEntry {
                data,
                created_at: Instant::now(),
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            },
        );
        if self.entries.len() > self.config.capacity {
            self.evict_oldest();
        }
        CACHE_SIZE.set(self.entries.len() as f64);
    }

    pub fn clear(&self) {
        self.entries.clear();
        CACHE_SIZE.set(0.0);
        debug!("Like-status cache cleared");
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.seq)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            debug!("Evicted cached batch {}", key);
        }
    }

    /// Batch like status for `ids`, served from cache while fresh.
    ///
    /// Only the first `max_batch` ids are looked up. An empty list fails
    /// without touching the network.
    pub async fn check_batch_status_cached<B, S>(
        &self,
        backend: &B,
        ids: &[S],
    ) -> Result<HashMap<String, bool>, ApiError>
    where
        B: LikeBackend + ?Sized,
        S: AsRef<str>,
    {
        if ids.is_empty() {
            return Err(ApiError::EmptyBatch);
        }

        let ids: Vec<String> = ids
            .iter()
            .take(self.config.max_batch)
            .map(|id| id.as_ref().to_string())
            .collect();
        let cache_key = make_cache_key(&ids);

        if let Some(data) = self.get(&cache_key) {
            CACHE_HITS.inc();
            debug!("Like-status cache HIT ({} ids)", ids.len());
            return Ok(data);
        }

        CACHE_MISSES.inc();
        debug!("Like-status cache MISS ({} ids)", ids.len());

        let data = backend.batch_like_status(&ids).await?;
        self.insert(cache_key, data.clone());
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LikeStatus;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::Value;
    use std::time::Duration;

    // Records every batch call and answers "liked" for even-length ids
    #[derive(Default)]
    struct CountingBackend {
        calls: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    impl CountingBackend {
        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl LikeBackend for CountingBackend {
        async fn like(&self, _id: &str) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }

        async fn unlike(&self, _id: &str) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }

        async fn like_status(&self, _id: &str) -> Result<LikeStatus, ApiError> {
            Ok(LikeStatus::default())
        }

        async fn batch_like_status(&self, ids: &[String]) -> Result<HashMap<String, bool>, ApiError> {
            self.calls.lock().push(ids.to_vec());
            if self.fail {
                return Err(ApiError::Network("down".into()));
            }
            Ok(ids.iter().map(|id| (id.clone(), id.len() % 2 == 0)).collect())
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn key_is_order_independent() {
        assert_eq!(make_cache_key(&["c", "a", "b"]), "a,b,c");
        assert_eq!(make_cache_key(&["b", "c", "a"]), make_cache_key(&["a", "b", "c"]));
    }

    #[tokio::test(start_paused = true)]
    async fn permutations_share_one_entry() {
        let cache = BatchStatusCache::default();
        let backend = CountingBackend::default();

        let first = cache
            .check_batch_status_cached(&backend, &ids(&["r3", "r1", "r22"]))
            .await
            .unwrap();
        let second = cache
            .check_batch_status_cached(&backend, &ids(&["r22", "r3", "r1"]))
            .await
            .unwrap();

        assert_eq!(backend.call_count(), 1);
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn only_first_fifty_ids_are_sent() {
        let cache = BatchStatusCache::default();
        let backend = CountingBackend::default();
        let many: Vec<String> = (0..75).map(|i| format!("id{:03}", i)).collect();

        let result = cache.check_batch_status_cached(&backend, &many).await.unwrap();

        let calls = backend.calls.lock();
        assert_eq!(calls[0].len(), 50);
        assert_eq!(calls[0], many[..50].to_vec());
        assert_eq!(result.len(), 50);
        assert!(!result.contains_key("id050"));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entries_go_back_to_the_network() {
        let cache = BatchStatusCache::default();
        let backend = CountingBackend::default();
        let list = ids(&["a", "b"]);

        cache.check_batch_status_cached(&backend, &list).await.unwrap();
        tokio::time::advance(Duration::from_secs(4 * 60)).await;
        cache.check_batch_status_cached(&backend, &list).await.unwrap();
        assert_eq!(backend.call_count(), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        cache.check_batch_status_cached(&backend, &list).await.unwrap();
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_forces_fresh_lookups() {
        let cache = BatchStatusCache::default();
        let backend = CountingBackend::default();

        cache.check_batch_status_cached(&backend, &ids(&["a"])).await.unwrap();
        cache.check_batch_status_cached(&backend, &ids(&["b", "c"])).await.unwrap();
        cache.clear();
        assert!(cache.is_empty());

        cache.check_batch_status_cached(&backend, &ids(&["a"])).await.unwrap();
        cache.check_batch_status_cached(&backend, &ids(&["c", "b"])).await.unwrap();
        assert_eq!(backend.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_input_fails_without_network() {
        let cache = BatchStatusCache::default();
        let backend = CountingBackend::default();
        let empty: Vec<String> = Vec::new();

        let err = cache.check_batch_status_cached(&backend, &empty).await.unwrap_err();

        assert_eq!(err, ApiError::EmptyBatch);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_not_cached() {
        let cache = BatchStatusCache::default();
        let backend = CountingBackend {
            fail: true,
            ..Default::default()
        };

        assert!(cache.check_batch_status_cached(&backend, &ids(&["a"])).await.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn oldest_entry_is_evicted_past_capacity() {
        let cache = BatchStatusCache::new(CacheConfig {
            capacity: 3,
            ..CacheConfig::default()
        });

        for key in ["k1", "k2", "k3", "k4"] {
            cache.insert(key.to_string(), HashMap::new());
            tokio::time::advance(Duration::from_millis(10)).await;
        }

        assert_eq!(cache.len(), 3);
        assert!(cache.get("k1").is_none());
        assert!(cache.get("k2").is_some());
        assert!(cache.get("k4").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn same_instant_inserts_evict_in_insertion_order() {
        let cache = BatchStatusCache::new(CacheConfig {
            capacity: 2,
            ..CacheConfig::default()
        });

        for key in ["k1", "k2", "k3", "k4", "k5"] {
            cache.insert(key.to_string(), HashMap::new());
        }

        assert_eq!(cache.len(), 2);
        assert!(cache.get("k4").is_some());
        assert!(cache.get("k5").is_some());
    }
}
