//! Persistent key-value storage
//!
//! The engine only needs string values under string keys. Every key it
//! writes lives under [`NAMESPACE`] so the store can be shared with
//! unrelated state.

mod file;

pub use file::FileStore;

use crate::error::PortalResult;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Prefix for every key written by the engine
pub const NAMESPACE: &str = "portalsync:";

/// Build a namespaced key
pub fn key(parts: &[&str]) -> String {
    format!("{}{}", NAMESPACE, parts.join(":"))
}

/// String key-value storage capability
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`
    async fn get_item(&self, key: &str) -> PortalResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set_item(&self, key: &str, value: &str) -> PortalResult<()>;

    /// Remove `key` (no-op when absent)
    async fn remove_item(&self, key: &str) -> PortalResult<()>;

    /// List all stored keys
    async fn keys(&self) -> PortalResult<Vec<String>>;
}

/// In-process store, used for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> PortalResult<Option<String>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> PortalResult<()> {
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> PortalResult<()> {
        self.items.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> PortalResult<Vec<String>> {
        Ok(self.items.read().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_namespaced() {
        assert_eq!(key(&["cache", "transcript", "2024"]), "portalsync:cache:transcript:2024");
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.set_item("a", "1").await.unwrap();
        assert_eq!(store.get_item("a").await.unwrap().as_deref(), Some("1"));

        store.remove_item("a").await.unwrap();
        assert!(store.get_item("a").await.unwrap().is_none());
        store.remove_item("a").await.unwrap();
    }
}
