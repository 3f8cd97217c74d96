//! Credential and session store
//!
//! Holds the one [`Session`] of this process in memory and mirrors every
//! change to the key-value store. Writes here are not best-effort: a
//! login that could not be persisted must fail loudly.
//!
//! Every update that depends on an earlier read (a cookie merged after a
//! request, the user id found on login) carries the [`Generation`] of that
//! read. Clearing or replacing the session bumps the generation, so such
//! an update arriving late is dropped instead of reviving a cleared
//! session.

use crate::error::{PortalError, PortalResult};
use crate::session::state::Session;
use crate::store::{self, KeyValueStore};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Identifies one login lifetime of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

struct Slot {
    session: Session,
    generation: u64,
}

/// Session manager handles credential storage and wholesale clearing
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<Slot>,
}

impl SessionManager {
    /// Store key of the persisted session
    pub fn storage_key() -> String {
        store::key(&["session"])
    }

    /// Load the persisted session (an unreadable record counts as logged out)
    pub async fn load(store: Arc<dyn KeyValueStore>) -> PortalResult<Self> {
        let session = match store.get_item(&Self::storage_key()).await? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Discarding unreadable session record: {}", e);
                Session::default()
            }),
            None => Session::default(),
        };

        Ok(Self {
            store,
            current: RwLock::new(Slot {
                session,
                generation: 0,
            }),
        })
    }

    /// Get a copy of the current session
    pub async fn snapshot(&self) -> Session {
        self.current.read().await.session.clone()
    }

    /// Get a copy of the current session and its generation
    pub async fn checkout(&self) -> (Session, Generation) {
        let slot = self.current.read().await;
        (slot.session.clone(), Generation(slot.generation))
    }

    /// Check whether credentials are stored
    pub async fn has_credentials(&self) -> bool {
        self.current.read().await.session.credentials().is_some()
    }

    /// Store username and password, replacing the whole session
    pub async fn store_credentials(&self, username: &str, password: &str) -> PortalResult<Generation> {
        let session = Session {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            ..Default::default()
        };

        let mut slot = self.current.write().await;
        self.persist(&session).await?;
        slot.session = session;
        slot.generation += 1;
        info!("Stored credentials for {}", username);
        Ok(Generation(slot.generation))
    }

    /// Store the session cookie
    pub async fn set_cookie(&self, cookie: &str) -> PortalResult<()> {
        let mut slot = self.current.write().await;
        let mut session = slot.session.clone();
        session.session_cookie = Some(cookie.to_string()).filter(|c| !c.is_empty());
        self.persist(&session).await?;
        slot.session = session;
        debug!("Updated session cookie");
        Ok(())
    }

    /// Merge `Set-Cookie` values into the current cookie
    ///
    /// Dropped when the session was cleared or replaced after `since`.
    pub async fn merge_set_cookies(&self, since: Generation, set_cookies: &[String]) -> PortalResult<()> {
        let mut slot = self.current.write().await;
        if slot.generation != since.0 {
            debug!("Session changed during request, ignoring Set-Cookie");
            return Ok(());
        }

        let mut session = slot.session.clone();
        if !session.merge_set_cookies(set_cookies) {
            return Ok(());
        }
        self.persist(&session).await?;
        slot.session = session;
        debug!("Updated session cookie");
        Ok(())
    }

    /// Store the portal user id, unless the session changed after `since`
    pub async fn set_user_id(&self, since: Generation, user_id: &str) -> PortalResult<()> {
        let mut slot = self.current.write().await;
        if slot.generation != since.0 {
            debug!("Session changed since login, ignoring user id");
            return Ok(());
        }

        let mut session = slot.session.clone();
        session.user_id = Some(user_id.to_string());
        self.persist(&session).await?;
        slot.session = session;
        Ok(())
    }

    /// Clear the whole session (cookie, credentials and user id)
    ///
    /// Memory is cleared first so no further request uses the old cookie,
    /// even when removing the persisted record fails.
    pub async fn clear(&self) -> PortalResult<()> {
        let mut slot = self.current.write().await;
        slot.session = Session::default();
        slot.generation += 1;
        self.store
            .remove_item(&Self::storage_key())
            .await
            .map_err(|e| PortalError::SessionPersist(e.to_string()))?;
        info!("Session cleared");
        Ok(())
    }

    async fn persist(&self, session: &Session) -> PortalResult<()> {
        let raw = serde_json::to_string(session)?;
        self.store
            .set_item(&Self::storage_key(), &raw)
            .await
            .map_err(|e| PortalError::SessionPersist(e.to_string()))
    }
}
