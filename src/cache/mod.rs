//! TTL cache over the key-value store
//!
//! Entries are JSON-encoded [`CacheEntry`] values stored under
//! `portalsync:cache:<resource>:<params..>`. Expiry is checked lazily on
//! read; nothing is evicted in the background.
//!
//! # Access patterns
//!
//! | Pattern | Used for | Behavior |
//! |---------|----------|----------|
//! | [`Cache::cache_or_fetch`] | CMS courses, CMS course view, exam seats | Fresh entry wins, otherwise fetch and store |
//! | [`Cache::stale_while_revalidate`] | Transcript | Emit any cached value, then the network value |
//!
//! A corrupt entry reads as a miss. Accessors log and swallow write
//! failures since a failed cache write never invalidates fetched data.

mod entry;
mod revalidate;

pub use entry::CacheEntry;
pub use revalidate::{settle, Revalidation, Settled};

use crate::error::PortalResult;
use crate::store::{self, KeyValueStore};
use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cached resource kinds, used as the first key segment
pub mod resource {
    pub const TRANSCRIPT: &str = "transcript";
    pub const STUDY_YEARS: &str = "study-years";
    pub const EXAM_SEATS: &str = "exam-seats";
    pub const CMS_COURSES: &str = "cms-courses";
    pub const CMS_COURSE: &str = "cms-course";
    pub const NOTIFICATIONS: &str = "notifications";
}

/// TTL cache handle; cheap to clone
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn KeyValueStore>,
}

impl Cache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Key for a resource and its discriminating parameters
    pub fn key(resource: &str, params: &[&str]) -> String {
        let mut parts = vec!["cache", resource];
        parts.extend_from_slice(params);
        store::key(&parts)
    }

    /// Prefix shared by every cache key
    pub fn namespace() -> String {
        store::key(&["cache", ""])
    }

    /// Read a fresh entry; expired, absent and corrupt entries are `None`
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> PortalResult<Option<CacheEntry<T>>> {
        match self.peek(key).await? {
            Some(entry) if entry.is_fresh() => {
                debug!("Cache hit for {} ({}s old)", key, entry.age().num_seconds());
                Ok(Some(entry))
            }
            Some(_) => {
                debug!("Cache entry for {} expired", key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Read an entry regardless of age
    pub async fn peek<T: DeserializeOwned>(&self, key: &str) -> PortalResult<Option<CacheEntry<T>>> {
        let Some(raw) = self.store.get_item(key).await? else {
            debug!("Cache miss for {}", key);
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                debug!("Ignoring corrupt cache entry {}: {}", key, e);
                Ok(None)
            }
        }
    }

    /// Store `data` under `key`, valid for `ttl`
    pub async fn write<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) -> PortalResult<()> {
        let entry = CacheEntry::new(data, ttl)?;
        let raw = serde_json::to_string(&entry)?;
        self.store.set_item(key, &raw).await?;
        debug!("Cached {} until {}", key, entry.expiry);
        Ok(())
    }

    /// Remove one entry
    pub async fn clear(&self, key: &str) -> PortalResult<()> {
        self.store.remove_item(key).await
    }

    /// Remove every entry whose key starts with the cache namespace
    /// followed by `prefix` (e.g. `cms` matches both CMS resources)
    pub async fn clear_by_prefix(&self, prefix: &str) -> PortalResult<usize> {
        let full = format!("{}{}", Self::namespace(), prefix);
        let mut removed = 0;
        for key in self.store.keys().await? {
            if key.starts_with(&full) {
                self.store.remove_item(&key).await?;
                removed += 1;
            }
        }
        debug!("Cleared {} cache entries under {}", removed, full);
        Ok(removed)
    }

    /// Remove every cache entry
    pub async fn clear_all(&self) -> PortalResult<usize> {
        self.clear_by_prefix("").await
    }

    /// Return a fresh cached value, or fetch, store and return a new one
    ///
    /// `force_refresh` skips the read. Cache read and write failures are
    /// logged; only the fetch can fail the call.
    pub async fn cache_or_fetch<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        force_refresh: bool,
        fetch: F,
    ) -> PortalResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = PortalResult<T>>,
    {
        if !force_refresh {
            match self.read::<T>(key).await {
                Ok(Some(entry)) => return Ok(entry.data),
                Ok(None) => {}
                Err(e) => warn!("Cache read for {} failed: {}", key, e),
            }
        } else {
            debug!("Forced refresh of {}", key);
        }

        let data = fetch().await?;
        if let Err(e) = self.write(key, &data, ttl).await {
            warn!("Failed to cache {}: {}", key, e);
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PortalError;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> (Cache, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (Cache::new(store.clone()), store)
    }

    #[test]
    fn keys_carry_resource_and_params() {
        assert_eq!(
            Cache::key(resource::CMS_COURSE, &["432", "61"]),
            "portalsync:cache:cms-course:432:61"
        );
        assert_eq!(Cache::namespace(), "portalsync:cache:");
    }

    #[tokio::test]
    async fn write_then_read() {
        let (cache, _) = cache();
        let key = Cache::key(resource::EXAM_SEATS, &[]);

        cache.write(&key, &vec![1, 2, 3], Duration::hours(1)).await.unwrap();
        let entry = cache.read::<Vec<i32>>(&key).await.unwrap().unwrap();

        assert_eq!(entry.data, vec![1, 2, 3]);
        assert!(entry.expiry > entry.cached_at);
    }

    #[tokio::test]
    async fn expired_entry_reads_as_none_but_peeks() {
        let (cache, store) = cache();
        let key = Cache::key(resource::TRANSCRIPT, &["2024"]);
        let stale = CacheEntry {
            data: "old".to_string(),
            cached_at: Utc::now() - Duration::hours(2),
            expiry: Utc::now() - Duration::hours(1),
        };
        store
            .set_item(&key, &serde_json::to_string(&stale).unwrap())
            .await
            .unwrap();

        assert!(cache.read::<String>(&key).await.unwrap().is_none());
        assert_eq!(cache.peek::<String>(&key).await.unwrap().unwrap().data, "old");
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_miss() {
        let (cache, store) = cache();
        store.set_item("portalsync:cache:x", "{not json").await.unwrap();
        assert!(cache.read::<String>("portalsync:cache:x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_ttl_is_rejected() {
        let (cache, _) = cache();
        let err = cache.write("k", &1, Duration::zero()).await.unwrap_err();
        assert!(matches!(err, PortalError::InvalidTtl(0)));
    }

    #[tokio::test]
    async fn clear_by_prefix_leaves_other_keys() {
        let (cache, store) = cache();
        let ttl = Duration::hours(1);
        cache.write(&Cache::key(resource::CMS_COURSES, &[]), &1, ttl).await.unwrap();
        cache.write(&Cache::key(resource::CMS_COURSE, &["1", "2"]), &2, ttl).await.unwrap();
        cache.write(&Cache::key(resource::EXAM_SEATS, &[]), &3, ttl).await.unwrap();
        store.set_item("portalsync:session", "{}").await.unwrap();

        assert_eq!(cache.clear_by_prefix("cms").await.unwrap(), 2);
        assert_eq!(cache.clear_all().await.unwrap(), 1);
        assert!(store.get_item("portalsync:session").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn cache_or_fetch_uses_fresh_entry() {
        let (cache, _) = cache();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, PortalError>(vec!["a".to_string()])
        };

        let first = cache.cache_or_fetch("k", Duration::hours(1), false, fetch).await.unwrap();
        let second = cache.cache_or_fetch("k", Duration::hours(1), false, fetch).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn force_refresh_bypasses_read() {
        let (cache, _) = cache();
        cache.write("k", &1, Duration::hours(1)).await.unwrap();

        let value = cache
            .cache_or_fetch("k", Duration::hours(1), true, || async { Ok(2) })
            .await
            .unwrap();

        assert_eq!(value, 2);
        assert_eq!(cache.read::<i32>("k").await.unwrap().unwrap().data, 2);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_entry() {
        let (cache, _) = cache();
        cache.write("k", &1, Duration::hours(1)).await.unwrap();

        let err = cache
            .cache_or_fetch::<i32, _, _>("k", Duration::hours(1), true, || async {
                Err(PortalError::RequestFailed { status: 500 })
            })
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(cache.read::<i32>("k").await.unwrap().unwrap().data, 1);
    }
}
