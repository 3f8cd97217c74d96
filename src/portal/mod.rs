//! Portal context
//!
//! [`Portal`] owns everything a session with the portal needs: the
//! session store, the TTL cache, the proxy client and the notification
//! center. Resource accessors consult the cache, fall back to the proxy,
//! hand the body to the matching extractor and store the result.
//!
//! Logout is the only operation that touches every component at once.

mod academic;
mod cms;

pub use cms::resolve_url;

use crate::audit::{events, AuditLog};
use crate::cache::Cache;
use crate::config::schema::Config;
use crate::config::ConfigManager;
use crate::error::{PortalError, PortalResult};
use crate::extract::{extract_user_id, Notification};
use crate::notify::{scheduler, NotificationCenter, NotificationScheduler, NotificationSource};
use crate::proxy::{ProxyClient, ProxyTransport, RetryPolicy, UreqTransport};
use crate::session::SessionManager;
use crate::store::{FileStore, KeyValueStore};
use chrono::Duration;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Summary of the stored session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub logged_in: bool,
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub has_cookie: bool,
}

/// Collaborators a [`Portal`] is assembled from
pub struct PortalParts {
    pub store: Arc<dyn KeyValueStore>,
    pub transport: Arc<dyn ProxyTransport>,
    pub scheduler: Arc<dyn NotificationScheduler>,
    pub audit: AuditLog,
}

/// Engine context for one user of the portal
pub struct Portal {
    config: Config,
    store: Arc<dyn KeyValueStore>,
    session: Arc<SessionManager>,
    cache: Cache,
    client: ProxyClient,
    notifications: NotificationCenter,
    retry: RetryPolicy,
    audit: AuditLog,
}

impl Portal {
    /// Assemble a portal from explicit collaborators
    pub async fn open(config: Config, parts: PortalParts) -> PortalResult<Self> {
        let session = Arc::new(SessionManager::load(parts.store.clone()).await?);
        let cache = Cache::new(parts.store.clone());
        let client = ProxyClient::new(parts.transport, session.clone());
        let retry = RetryPolicy::from_config(&config.proxy);

        let notifications = NotificationCenter::new(
            client.clone(),
            cache.clone(),
            parts.store.clone(),
            parts.scheduler,
            NotificationSource {
                url: config.portal.notifications_url.clone(),
                content_ttl: hours(config.cache.notifications_ttl_hours),
                retry,
            },
        );

        Ok(Self {
            config,
            store: parts.store,
            session,
            cache,
            client,
            notifications,
            retry,
            audit: parts.audit,
        })
    }

    /// Assemble the production portal over a state directory
    pub async fn from_state_dir(config: Config, state_dir: &Path) -> PortalResult<Self> {
        ConfigManager::ensure_state_dirs(state_dir).await?;
        let store = FileStore::open(ConfigManager::store_dir(state_dir)).await?;

        let parts = PortalParts {
            store: Arc::new(store),
            transport: Arc::new(UreqTransport::new(&config.proxy)),
            scheduler: scheduler::from_config(&config.notifications),
            audit: AuditLog::new(
                ConfigManager::audit_log_path(state_dir),
                config.general.audit_log,
            ),
        };
        Self::open(config, parts).await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Notification delta and read-state tracking
    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Describe the stored session
    pub async fn status(&self) -> SessionStatus {
        let session = self.session.snapshot().await;
        SessionStatus {
            logged_in: session.credentials().is_some(),
            has_cookie: session.session_cookie.is_some(),
            username: session.username,
            user_id: session.user_id,
        }
    }

    /// Store credentials and open a portal session
    ///
    /// The home page is requested with the new credentials; its cookie
    /// and user id are captured. Login is never retried, and a failed
    /// login leaves no half-written session behind.
    pub async fn login(&self, username: &str, password: &str) -> PortalResult<SessionStatus> {
        let generation = self.session.store_credentials(username, password).await?;

        let home = match self.client.get(&self.config.portal.home_url).await {
            Ok(home) => home,
            Err(e) => {
                if let Err(clear) = self.session.clear().await {
                    warn!("Failed to discard rejected credentials: {}", clear);
                }
                return Err(e);
            }
        };

        match extract_user_id(&home.body) {
            Some(user_id) => self.session.set_user_id(generation, &user_id).await?,
            None => warn!("Home page did not contain a user id"),
        }

        self.audit
            .log(events::LOGIN, &serde_json::json!({ "username": username }))
            .await;
        info!("Logged in as {}", username);
        Ok(self.status().await)
    }

    /// Clear the session, every cached resource and notification state
    ///
    /// Session errors surface first; a session that could not be cleared
    /// leaves the cache untouched.
    pub async fn logout(&self) -> PortalResult<()> {
        let username = self.session.snapshot().await.username;
        self.session.clear().await?;

        let removed = self.cache.clear_all().await?;
        self.notifications.clear().await?;
        self.store.remove_item(&cms::seen_key()).await?;

        self.audit
            .log(events::LOGOUT, &serde_json::json!({ "username": username }))
            .await;
        info!("Logged out, removed {} cached entries", removed);
        Ok(())
    }

    /// Fetch notifications and dispatch the unseen ones
    pub async fn sync_notifications(&self) -> PortalResult<Vec<Notification>> {
        self.require_login().await?;
        let result = self.notifications.fetch_and_diff().await;
        self.audited(result).await
    }

    /// Fail early when no credentials are stored
    async fn require_login(&self) -> PortalResult<()> {
        if self.session.has_credentials().await {
            Ok(())
        } else {
            Err(PortalError::NotLoggedIn)
        }
    }

    /// Record session expiry in the audit log on the way out
    async fn audited<T>(&self, result: PortalResult<T>) -> PortalResult<T> {
        audit_expiry(&self.audit, result).await
    }
}

async fn audit_expiry<T>(audit: &AuditLog, result: PortalResult<T>) -> PortalResult<T> {
    if let Err(PortalError::SessionExpired) = &result {
        audit.log(events::EXPIRED, &serde_json::json!({})).await;
    }
    result
}

/// Warn when a non-empty page produced nothing
fn check_extraction(what: &str, body: &str, empty: bool) {
    if empty && !body.trim().is_empty() {
        warn!(
            "{} page was non-empty but yielded no records; the portal markup may have changed",
            what
        );
    }
}

fn hours(n: u32) -> Duration {
    Duration::hours(i64::from(n))
}

fn days(n: u32) -> Duration {
    Duration::days(i64::from(n))
}
