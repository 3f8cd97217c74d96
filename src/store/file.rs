//! File-backed key-value store
//!
//! One file per key. File names are the hex-encoded key so arbitrary
//! keys (colons, slashes) map to safe names and can be listed back.

use super::KeyValueStore;
use crate::error::{PortalError, PortalResult};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::debug;

const EXTENSION: &str = "val";

/// Suffix source for temp files, unique per write within the process
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Store that keeps each value in its own file under a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating it if needed
    pub async fn open(dir: PathBuf) -> PortalResult<Self> {
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| PortalError::store(format!("creating store dir {}", dir.display()), e))?;
        Ok(Self { dir })
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", hex::encode(key.as_bytes()), EXTENSION))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> PortalResult<Option<String>> {
        let path = self.item_path(key);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortalError::store(format!("reading {}", key), e)),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> PortalResult<()> {
        let path = self.item_path(key);
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("{}.{}.tmp", std::process::id(), seq));

        // Write-then-rename so readers never observe a half-written value;
        // concurrent writers each rename their own file and the last one wins
        if let Err(e) = write_private(&tmp, value).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(PortalError::store(format!("writing {}", key), e));
        }

        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(PortalError::store(format!("replacing {}", key), e));
        }

        debug!("Stored {} ({} bytes)", key, value.len());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> PortalResult<()> {
        match fs::remove_file(self.item_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortalError::store(format!("removing {}", key), e)),
        }
    }

    async fn keys(&self) -> PortalResult<Vec<String>> {
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| PortalError::store("reading store directory", e))?;

        let mut keys = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PortalError::store("reading store entry", e))?
        {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == EXTENSION) {
                continue;
            }
            let decoded = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| hex::decode(stem).ok())
                .and_then(|bytes| String::from_utf8(bytes).ok());
            if let Some(key) = decoded {
                keys.push(key);
            }
        }

        Ok(keys)
    }
}

async fn write_private(path: &std::path::Path, value: &str) -> std::io::Result<()> {
    fs::write(path, value).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (FileStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path().join("store")).await.unwrap();
        (store, temp)
    }

    #[tokio::test]
    async fn set_and_get() {
        let (store, _temp) = test_store().await;

        store.set_item("portalsync:session", "{}").await.unwrap();
        let value = store.get_item("portalsync:session").await.unwrap();

        assert_eq!(value.as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn missing_returns_none() {
        let (store, _temp) = test_store().await;
        assert!(store.get_item("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn overwrite_replaces_value() {
        let (store, _temp) = test_store().await;

        store.set_item("k", "first").await.unwrap();
        store.set_item("k", "second").await.unwrap();

        assert_eq!(store.get_item("k").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn keys_roundtrip_through_file_names() {
        let (store, _temp) = test_store().await;

        store.set_item("portalsync:cache:cms/course:1", "x").await.unwrap();
        store.set_item("other", "y").await.unwrap();
        store.remove_item("other").await.unwrap();

        let keys = store.keys().await.unwrap();
        assert_eq!(keys, vec!["portalsync:cache:cms/course:1".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_to_one_key_all_succeed() {
        let (store, _temp) = test_store().await;
        let store = std::sync::Arc::new(store);

        for round in 0..50 {
            let writers: Vec<_> = (0..4)
                .map(|i| {
                    let store = store.clone();
                    tokio::spawn(async move {
                        store
                            .set_item("portalsync:session", &format!("{}-{}", round, i))
                            .await
                    })
                })
                .collect();
            for writer in writers {
                writer.await.unwrap().unwrap();
            }
        }

        let value = store.get_item("portalsync:session").await.unwrap().unwrap();
        assert!(value.starts_with("49-"));
        assert_eq!(store.keys().await.unwrap(), vec!["portalsync:session".to_string()]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn values_are_private() {
        use std::os::unix::fs::PermissionsExt;
        let (store, _temp) = test_store().await;

        store.set_item("portalsync:session", "{}").await.unwrap();

        let mode = std::fs::metadata(store.item_path("portalsync:session"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
