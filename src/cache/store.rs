//! Listing view storage.
//!
//! [`ViewStore`] is the seam between the listing cache and whatever holds the
//! serialized views. [`MemoryViewStore`] keeps them in-process behind an LRU.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use metrics::counter;
use thiserror::Error;

use super::config::CacheConfig;
use super::keys::ListingKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_CACHE_EVICT: &str = "listings_cache_evict_total";

/// Outcome of a cache read. A fault is a broken backend or a corrupt entry;
/// callers treat it like a miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(Bytes),
    Miss,
    Fault(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ViewStore: Send + Sync {
    async fn get(&self, key: &ListingKey) -> CacheLookup;

    /// Replace the entry for `key` as a whole.
    async fn put(&self, key: ListingKey, body: Bytes) -> Result<(), CacheError>;

    async fn invalidate(&self, key: &ListingKey) -> Result<(), CacheError>;
}

struct Entry {
    body: Bytes,
    stored_at: Instant,
}

pub struct MemoryViewStore {
    entries: RwLock<LruCache<ListingKey, Entry>>,
    ttl: Option<Duration>,
}

impl MemoryViewStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
            ttl: config.ttl(),
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &ListingKey) -> bool {
        rw_read(&self.entries, SOURCE, "contains").contains(key)
    }

    fn lookup_at(&self, key: &ListingKey, now: Instant) -> CacheLookup {
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let expired = match entries.get(key) {
            None => return CacheLookup::Miss,
            Some(entry) => self
                .ttl
                .is_some_and(|ttl| now.saturating_duration_since(entry.stored_at) >= ttl),
        };

        if expired {
            entries.pop(key);
            return CacheLookup::Miss;
        }

        match entries.get(key) {
            Some(entry) => CacheLookup::Hit(entry.body.clone()),
            None => CacheLookup::Miss,
        }
    }
}

#[async_trait]
impl ViewStore for MemoryViewStore {
    async fn get(&self, key: &ListingKey) -> CacheLookup {
        self.lookup_at(key, Instant::now())
    }

    async fn put(&self, key: ListingKey, body: Bytes) -> Result<(), CacheError> {
        let entry = Entry {
            body,
            stored_at: Instant::now(),
        };
        let evicted = rw_write(&self.entries, SOURCE, "put").push(key, entry);
        // `push` also hands back the previous value when `key` was already present.
        if matches!(evicted, Some((evicted_key, _)) if evicted_key != key) {
            counter!(METRIC_CACHE_EVICT).increment(1);
        }
        Ok(())
    }

    async fn invalidate(&self, key: &ListingKey) -> Result<(), CacheError> {
        rw_write(&self.entries, SOURCE, "invalidate").pop(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;
    use crate::cache::keys::ListingScope;

    fn key(scope: ListingScope, house_id: i32) -> ListingKey {
        ListingKey::new(scope, house_id)
    }

    #[tokio::test]
    async fn put_then_get_hits() {
        let store = MemoryViewStore::new(&CacheConfig::default());
        let k = key(ListingScope::Client, 1);

        assert_eq!(store.get(&k).await, CacheLookup::Miss);
        store
            .put(k, Bytes::from_static(b"{\"flats\":[]}"))
            .await
            .expect("put");
        assert_eq!(
            store.get(&k).await,
            CacheLookup::Hit(Bytes::from_static(b"{\"flats\":[]}"))
        );
    }

    #[tokio::test]
    async fn scopes_are_separate_entries() {
        let store = MemoryViewStore::new(&CacheConfig::default());
        store
            .put(key(ListingScope::Moderator, 1), Bytes::from_static(b"m"))
            .await
            .expect("put");

        assert_eq!(
            store.get(&key(ListingScope::Client, 1)).await,
            CacheLookup::Miss
        );
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let store = MemoryViewStore::new(&CacheConfig::default());
        let k = key(ListingScope::Client, 5);
        store.put(k, Bytes::from_static(b"x")).await.expect("put");
        store.invalidate(&k).await.expect("invalidate");

        assert!(!store.contains(&k));
        assert_eq!(store.get(&k).await, CacheLookup::Miss);
        store.invalidate(&k).await.expect("invalidating a missing key is fine");
    }

    #[tokio::test]
    async fn lru_evicts_least_recent() {
        let config = CacheConfig {
            capacity: 2,
            ..Default::default()
        };
        let store = MemoryViewStore::new(&config);
        let (a, b, c) = (
            key(ListingScope::Client, 1),
            key(ListingScope::Client, 2),
            key(ListingScope::Client, 3),
        );

        store.put(a, Bytes::from_static(b"a")).await.expect("put");
        store.put(b, Bytes::from_static(b"b")).await.expect("put");
        // Touch `a` so `b` becomes least recent.
        assert!(matches!(store.get(&a).await, CacheLookup::Hit(_)));
        store.put(c, Bytes::from_static(b"c")).await.expect("put");

        assert_eq!(store.len(), 2);
        assert!(store.contains(&a));
        assert!(!store.contains(&b));
        assert!(store.contains(&c));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_miss() {
        let config = CacheConfig {
            ttl_secs: 60,
            ..Default::default()
        };
        let store = MemoryViewStore::new(&config);
        let k = key(ListingScope::Moderator, 9);
        store.put(k, Bytes::from_static(b"v")).await.expect("put");

        let fresh = store.lookup_at(&k, Instant::now());
        assert!(matches!(fresh, CacheLookup::Hit(_)));

        let later = Instant::now() + Duration::from_secs(61);
        assert_eq!(store.lookup_at(&k, later), CacheLookup::Miss);
        assert!(store.is_empty());
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let store = MemoryViewStore::new(&CacheConfig::default());

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store.entries.write().expect("entries lock should be acquired");
            panic!("poison entries lock");
        }));

        assert_eq!(store.len(), 0);
        assert_eq!(
            store.lookup_at(&key(ListingScope::Client, 1), Instant::now()),
            CacheLookup::Miss
        );
    }
}
