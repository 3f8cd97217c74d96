//! Stale-while-revalidate
//!
//! The caller gets a receiver that yields at most two values: the cached
//! entry (of any age) if one exists, then the network outcome. The cached
//! entry is skipped only when a fresh value is already in hand. The network fetch is started
//! before the cache is read so a slow store never delays it.

use super::Cache;
use crate::error::{PortalError, PortalResult};
use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One value of a revalidation sequence
#[derive(Debug)]
pub enum Revalidation<T> {
    /// Previously stored value, possibly expired
    Cached(T),
    /// Value just fetched; already written back to the cache
    Fresh(T),
    /// The fetch failed; a preceding `Cached` value stays valid
    Failed(PortalError),
}

impl Cache {
    /// Serve the cached value for `key` while fetching a fresh one
    pub fn stale_while_revalidate<T, Fut>(
        &self,
        key: String,
        ttl: Duration,
        fetch: Fut,
    ) -> mpsc::Receiver<Revalidation<T>>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        Fut: Future<Output = PortalResult<T>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(2);
        let cache = self.clone();

        tokio::spawn(async move {
            let network = tokio::spawn(fetch);

            let mut cached = match cache.peek::<T>(&key).await {
                Ok(entry) => entry.map(|entry| entry.data),
                Err(e) => {
                    warn!("Cache read for {} failed: {}", key, e);
                    None
                }
            };

            // Held back only while a finished fetch may still have succeeded
            if !network.is_finished() {
                if let Some(data) = cached.take() {
                    debug!("Serving cached {} while revalidating", key);
                    let _ = tx.send(Revalidation::Cached(data)).await;
                }
            }

            let outcome = match network.await {
                Ok(Ok(data)) => {
                    if let Err(e) = cache.write(&key, &data, ttl).await {
                        warn!("Failed to cache {}: {}", key, e);
                    }
                    Revalidation::Fresh(data)
                }
                Ok(Err(e)) => Revalidation::Failed(e),
                Err(e) => Revalidation::Failed(PortalError::Internal(format!(
                    "revalidation task failed: {}",
                    e
                ))),
            };

            if let Some(data) = cached {
                if matches!(outcome, Revalidation::Fresh(_)) {
                    debug!("Network answered first for {}, skipping cached value", key);
                } else {
                    let _ = tx.send(Revalidation::Cached(data)).await;
                }
            }
            let _ = tx.send(outcome).await;
        });

        rx
    }
}

/// Final state of a drained revalidation sequence
#[derive(Debug)]
pub struct Settled<T> {
    pub data: T,
    /// True when `data` came from the cache because the fetch failed
    pub stale: bool,
    /// The fetch error behind a stale result
    pub error: Option<PortalError>,
}

/// Drain a revalidation sequence down to its best value
///
/// A fresh value wins. A failure after a cached value yields the cached
/// value marked stale; a failure with nothing cached is returned as-is.
pub async fn settle<T>(mut rx: mpsc::Receiver<Revalidation<T>>) -> PortalResult<Settled<T>> {
    let mut cached = None;

    while let Some(item) = rx.recv().await {
        match item {
            Revalidation::Cached(data) => cached = Some(data),
            Revalidation::Fresh(data) => {
                return Ok(Settled {
                    data,
                    stale: false,
                    error: None,
                })
            }
            Revalidation::Failed(e) => {
                return match cached {
                    Some(data) => Ok(Settled {
                        data,
                        stale: true,
                        error: Some(e),
                    }),
                    None => Err(e),
                }
            }
        }
    }

    Err(PortalError::Internal(
        "revalidation ended without a result".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn cache() -> Cache {
        Cache::new(Arc::new(MemoryStore::new()))
    }

    async fn slow<T>(value: PortalResult<T>) -> PortalResult<T> {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        value
    }

    #[tokio::test]
    async fn cached_then_fresh() {
        let cache = cache();
        cache.write("t", &"old".to_string(), Duration::hours(1)).await.unwrap();

        let mut rx = cache.stale_while_revalidate("t".to_string(), Duration::hours(1), slow(Ok("new".to_string())));

        assert!(matches!(rx.recv().await, Some(Revalidation::Cached(ref v)) if v == "old"));
        assert!(matches!(rx.recv().await, Some(Revalidation::Fresh(ref v)) if v == "new"));
        assert!(rx.recv().await.is_none());
        assert_eq!(cache.read::<String>("t").await.unwrap().unwrap().data, "new");
    }

    #[tokio::test]
    async fn empty_cache_yields_only_fresh() {
        let cache = cache();
        let mut rx = cache.stale_while_revalidate("t".to_string(), Duration::hours(1), slow(Ok(7)));

        assert!(matches!(rx.recv().await, Some(Revalidation::Fresh(7))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn failure_after_cached_keeps_cache() {
        let cache = cache();
        cache.write("t", &1, Duration::hours(1)).await.unwrap();

        let rx = cache.stale_while_revalidate::<i32, _>(
            "t".to_string(),
            Duration::hours(1),
            slow(Err(PortalError::SessionExpired)),
        );
        let settled = settle(rx).await.unwrap();

        assert_eq!(settled.data, 1);
        assert!(settled.stale);
        assert!(matches!(settled.error, Some(PortalError::SessionExpired)));
        assert_eq!(cache.read::<i32>("t").await.unwrap().unwrap().data, 1);
    }

    #[tokio::test]
    async fn failure_without_cache_is_an_error() {
        let cache = cache();
        let rx = cache.stale_while_revalidate::<i32, _>(
            "t".to_string(),
            Duration::hours(1),
            slow(Err(PortalError::RequestFailed { status: 503 })),
        );

        assert!(matches!(
            settle(rx).await,
            Err(PortalError::RequestFailed { status: 503 })
        ));
    }

    #[tokio::test]
    async fn settle_prefers_fresh() {
        let cache = cache();
        cache.write("t", &1, Duration::hours(1)).await.unwrap();

        let rx = cache.stale_while_revalidate("t".to_string(), Duration::hours(1), slow(Ok(2)));
        let settled = settle(rx).await.unwrap();

        assert_eq!(settled.data, 2);
        assert!(!settled.stale);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn immediate_failure_never_drops_cached_value() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = crate::store::FileStore::open(temp.path().join("store")).await.unwrap();
        let cache = Cache::new(Arc::new(store));
        cache.write("t", &1, Duration::hours(1)).await.unwrap();

        for _ in 0..50 {
            let rx = cache.stale_while_revalidate::<i32, _>(
                "t".to_string(),
                Duration::hours(1),
                async { Err(PortalError::RequestFailed { status: 503 }) },
            );
            let settled = settle(rx).await.unwrap();

            assert_eq!(settled.data, 1);
            assert!(settled.stale);
        }
    }

    #[tokio::test]
    async fn immediate_success_may_skip_cached_value() {
        let cache = cache();
        cache.write("t", &1, Duration::hours(1)).await.unwrap();

        let mut rx = cache.stale_while_revalidate("t".to_string(), Duration::hours(1), async { Ok(2) });
        let mut seen = vec![];
        while let Some(item) = rx.recv().await {
            seen.push(item);
        }

        assert!(matches!(seen.last(), Some(Revalidation::Fresh(2))));
        assert!(seen.len() <= 2);
        if seen.len() == 2 {
            assert!(matches!(seen[0], Revalidation::Cached(1)));
        }
    }
}
