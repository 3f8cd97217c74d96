//! Configuration management for portalsync

pub mod schema;

pub use schema::Config;

use crate::error::{PortalError, PortalResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("portalsync")
            .join("config.toml")
    }

    /// Get the default state directory path
    pub fn default_state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("portalsync")
    }

    /// Resolve the state directory, preferring an explicit override
    pub fn state_dir(override_dir: Option<&Path>) -> PathBuf {
        override_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_state_dir)
    }

    /// Get the key-value store directory under a state directory
    pub fn store_dir(state_dir: &Path) -> PathBuf {
        state_dir.join("store")
    }

    /// Get the audit log path under a state directory
    pub fn audit_log_path(state_dir: &Path) -> PathBuf {
        state_dir.join("audit.log")
    }

    /// Load configuration, creating default if not exists
    pub async fn load(&self) -> PortalResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> PortalResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PortalError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| PortalError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> PortalResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            PortalError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> PortalResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PortalError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Ensure the state directories exist
    ///
    /// The store holds the session cookie and stored password, so it is
    /// restricted to the current user.
    pub async fn ensure_state_dirs(state_dir: &Path) -> PortalResult<()> {
        let store_dir = Self::store_dir(state_dir);
        for dir in [state_dir, store_dir.as_path()] {
            fs::create_dir_all(dir).await.map_err(|e| {
                PortalError::io(format!("creating directory {}", dir.display()), e)
            })?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(&store_dir, perms)
                .map_err(|e| PortalError::io("setting store dir permissions", e))?;
        }

        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.cache.cms_courses_ttl_days, 30);
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.proxy.url = "https://proxy.test/forward".to_string();

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.proxy.url, "https://proxy.test/forward");
    }

    #[tokio::test]
    async fn invalid_config_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "[proxy]\ntimeout_secs = \"soon\"\n")
            .await
            .unwrap();

        let err = ConfigManager::with_path(path.clone()).load().await.unwrap_err();
        assert!(matches!(err, PortalError::ConfigInvalid { path: p, .. } if p == path));
    }

    #[tokio::test]
    async fn ensure_state_dirs_creates_store() {
        let temp = TempDir::new().unwrap();
        let state = temp.path().join("state");

        ConfigManager::ensure_state_dirs(&state).await.unwrap();

        assert!(ConfigManager::store_dir(&state).is_dir());
    }

    #[test]
    fn state_dir_prefers_override() {
        let dir = ConfigManager::state_dir(Some(Path::new("/tmp/portalsync-test")));
        assert_eq!(dir, PathBuf::from("/tmp/portalsync-test"));
    }
}
