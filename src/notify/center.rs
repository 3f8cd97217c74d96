//! Notification delta detection and read-state tracking

use super::scheduler::{NotificationContent, NotificationScheduler, Priority};
use crate::cache::{resource, Cache};
use crate::error::PortalResult;
use crate::extract::{parse_notifications, Notification};
use crate::proxy::{ProxyClient, RetryPolicy};
use crate::store::{self, KeyValueStore};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// In-memory view of the notification list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationState {
    pub notifications: Vec<Notification>,
    /// Always equals the number of unread entries in `notifications`
    pub unread_count: usize,
    pub loading: bool,
    /// Message of the last failed fetch, cleared on success
    pub error: Option<String>,
}

impl NotificationState {
    fn recount(&mut self) {
        self.unread_count = self.notifications.iter().filter(|n| !n.is_read).count();
    }
}

#[derive(Default)]
struct Inner {
    state: NotificationState,
    read_ids: BTreeSet<String>,
}

/// Where the notification page lives and how long its content is cached
#[derive(Debug, Clone)]
pub struct NotificationSource {
    pub url: String,
    pub content_ttl: Duration,
    pub retry: RetryPolicy,
}

/// Fetches notifications, dispatches unseen ones and tracks read state
pub struct NotificationCenter {
    client: ProxyClient,
    cache: Cache,
    store: Arc<dyn KeyValueStore>,
    scheduler: Arc<dyn NotificationScheduler>,
    source: NotificationSource,
    inner: Arc<Mutex<Inner>>,
    persist_lock: Arc<tokio::sync::Mutex<()>>,
}

impl NotificationCenter {
    pub fn new(
        client: ProxyClient,
        cache: Cache,
        store: Arc<dyn KeyValueStore>,
        scheduler: Arc<dyn NotificationScheduler>,
        source: NotificationSource,
    ) -> Self {
        Self {
            client,
            cache,
            store,
            scheduler,
            source,
            inner: Arc::new(Mutex::new(Inner::default())),
            persist_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    fn seen_key() -> String {
        store::key(&["notifications", "seen"])
    }

    fn read_key() -> String {
        store::key(&["notifications", "read"])
    }

    fn content_key() -> String {
        Cache::key(resource::NOTIFICATIONS, &[])
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.inner)
    }

    /// Snapshot of the in-memory state
    pub fn state(&self) -> NotificationState {
        self.lock().state.clone()
    }

    /// Load cached content and read state without touching the network
    pub async fn restore(&self) -> PortalResult<NotificationState> {
        let read_ids = load_ids(self.store.as_ref(), &Self::read_key()).await;
        let cached = match self.cache.peek::<Vec<Notification>>(&Self::content_key()).await {
            Ok(entry) => entry.map(|e| e.data).unwrap_or_default(),
            Err(e) => {
                warn!("Failed to read cached notifications: {}", e);
                vec![]
            }
        };

        let mut inner = self.lock();
        inner.read_ids.extend(read_ids);
        inner.state.notifications = join_read_state(cached, &inner.read_ids);
        inner.state.recount();
        debug!(
            "Restored {} notifications ({} unread)",
            inner.state.notifications.len(),
            inner.state.unread_count
        );
        Ok(inner.state.clone())
    }

    /// Fetch the notification page, schedule a local notification for
    /// every item not seen before and replace the in-memory list
    ///
    /// Returns the newly seen notifications in page order. On failure the
    /// previous list is kept and the error is recorded in the state.
    pub async fn fetch_and_diff(&self) -> PortalResult<Vec<Notification>> {
        self.lock().state.loading = true;

        let fetched = match self.fetch().await {
            Ok(items) => items,
            Err(e) => {
                let mut inner = self.lock();
                inner.state.loading = false;
                inner.state.error = Some(e.to_string());
                return Err(e);
            }
        };

        let mut seen = load_ids(self.store.as_ref(), &Self::seen_key()).await;
        let persisted_read = load_ids(self.store.as_ref(), &Self::read_key()).await;
        let notifications = {
            let mut inner = self.lock();
            inner.read_ids.extend(persisted_read);
            join_read_state(fetched, &inner.read_ids)
        };

        let unseen: Vec<Notification> = notifications
            .iter()
            .filter(|n| !seen.contains(&n.id))
            .cloned()
            .collect();
        for notification in &unseen {
            self.scheduler.schedule(dispatch_content(notification)).await;
        }
        if !unseen.is_empty() {
            info!("{} new notifications", unseen.len());
        }
        seen.extend(notifications.iter().map(|n| n.id.clone()));

        {
            let mut inner = self.lock();
            inner.state.notifications = notifications.clone();
            inner.state.recount();
            inner.state.loading = false;
            inner.state.error = None;
        }

        if let Err(e) = save_ids(self.store.as_ref(), &Self::seen_key(), &seen).await {
            warn!("Failed to persist seen notifications: {}", e);
        }
        if let Err(e) = self
            .cache
            .write(&Self::content_key(), &notifications, self.source.content_ttl)
            .await
        {
            warn!("Failed to cache notifications: {}", e);
        }
        if let Err(e) = self.persist_read_state().await {
            warn!("Failed to persist read state: {}", e);
        }

        Ok(unseen)
    }

    async fn fetch(&self) -> PortalResult<Vec<Notification>> {
        let result = self
            .source
            .retry
            .run("notifications", || self.client.get(&self.source.url))
            .await?;
        let items = parse_notifications(&result.body);
        if items.is_empty() && !result.body.trim().is_empty() {
            warn!("Notification page was non-empty but yielded no notifications");
        }
        Ok(items)
    }

    /// Mark one notification as read
    ///
    /// The in-memory state changes immediately; the returned handle
    /// completes when the read state has been persisted.
    pub fn mark_as_read(&self, id: &str) -> JoinHandle<()> {
        {
            let mut inner = self.lock();
            inner.read_ids.insert(id.to_string());
            if let Some(n) = inner.state.notifications.iter_mut().find(|n| n.id == id) {
                n.is_read = true;
            }
            inner.state.recount();
        }
        self.spawn_persist()
    }

    /// Mark every loaded notification as read
    pub fn mark_all_as_read(&self) -> JoinHandle<()> {
        {
            let mut inner = self.lock();
            let Inner { state, read_ids } = &mut *inner;
            for n in state.notifications.iter_mut() {
                n.is_read = true;
                read_ids.insert(n.id.clone());
            }
            state.recount();
        }
        self.spawn_persist()
    }

    /// Forget seen ids, read state and cached content
    pub async fn clear(&self) -> PortalResult<()> {
        {
            let mut inner = self.lock();
            *inner = Inner::default();
        }
        let _guard = self.persist_lock.lock().await;
        self.store.remove_item(&Self::seen_key()).await?;
        self.store.remove_item(&Self::read_key()).await?;
        self.cache.clear(&Self::content_key()).await
    }

    fn spawn_persist(&self) -> JoinHandle<()> {
        let inner = self.inner.clone();
        let store = self.store.clone();
        let lock = self.persist_lock.clone();
        tokio::spawn(async move {
            if let Err(e) = write_read_state(&inner, store.as_ref(), &lock).await {
                warn!("Failed to persist read state: {}", e);
            }
        })
    }

    async fn persist_read_state(&self) -> PortalResult<()> {
        write_read_state(&self.inner, self.store.as_ref(), &self.persist_lock).await
    }
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Write the current read set; the snapshot is taken under the persist
/// lock so the last writer always stores the latest state
async fn write_read_state(
    inner: &Mutex<Inner>,
    store: &dyn KeyValueStore,
    lock: &tokio::sync::Mutex<()>,
) -> PortalResult<()> {
    let _guard = lock.lock().await;
    let snapshot = lock_inner(inner).read_ids.clone();
    save_ids(store, &NotificationCenter::read_key(), &snapshot).await
}

async fn load_ids(store: &dyn KeyValueStore, key: &str) -> BTreeSet<String> {
    let raw = match store.get_item(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return BTreeSet::new(),
        Err(e) => {
            warn!("Failed to read {}: {}", key, e);
            return BTreeSet::new();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        debug!("Ignoring corrupt {}: {}", key, e);
        BTreeSet::new()
    })
}

async fn save_ids(store: &dyn KeyValueStore, key: &str, ids: &BTreeSet<String>) -> PortalResult<()> {
    let raw = serde_json::to_string(ids)?;
    store.set_item(key, &raw).await
}

fn join_read_state(mut items: Vec<Notification>, read_ids: &BTreeSet<String>) -> Vec<Notification> {
    for n in items.iter_mut() {
        n.is_read = read_ids.contains(&n.id);
    }
    items
}

fn dispatch_content(notification: &Notification) -> NotificationContent {
    let body = notification
        .body
        .lines()
        .next()
        .filter(|line| !line.is_empty())
        .unwrap_or(notification.staff.as_str())
        .to_string();

    NotificationContent {
        title: notification.title.clone(),
        body,
        data: serde_json::json!({
            "id": notification.id,
            "date": notification.date,
            "staff": notification.staff,
        }),
        priority: if notification.is_important() {
            Priority::High
        } else {
            Priority::Normal
        },
    }
}
