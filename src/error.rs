//! Error types for portalsync
//!
//! All modules use `PortalResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for portalsync operations
pub type PortalResult<T> = Result<T, PortalError>;

/// All errors that can occur in portalsync
#[derive(Error, Debug)]
pub enum PortalError {
    // Session errors
    #[error("Portal session expired, please log in again")]
    SessionExpired,

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Failed to persist session: {0}")]
    SessionPersist(String),

    // Proxy errors
    #[error("Portal request failed with status {status}")]
    RequestFailed { status: u16 },

    #[error("Proxy transport error: {0}")]
    Transport(String),

    #[error("Proxy returned a malformed response: {0}")]
    MalformedResponse(String),

    // Navigation errors
    #[error("Failed to extract view state")]
    ViewStateMissing,

    #[error("Course {course_id} (season {season_id}) not found in course list")]
    CourseNotFound { course_id: String, season_id: String },

    // Cache errors
    #[error("Cache TTL must be positive, got {0}s")]
    InvalidTtl(i64),

    // Storage errors
    #[error("Store error: {context}")]
    Store {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl PortalError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a store error with context
    pub fn store(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Store {
            context: context.into(),
            source,
        }
    }

    /// Check if error is retryable
    ///
    /// Transport hiccups and server-side failures qualify. Session expiry
    /// and client errors never do.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::RequestFailed { status } => *status >= 500,
            _ => false,
        }
    }

    /// Check if error requires the user to authenticate again
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::NotLoggedIn)
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::SessionExpired | Self::NotLoggedIn => Some("Run: portalsync login"),
            Self::Transport(_) => Some("Check proxy.url in your config: portalsync config show"),
            Self::ViewStateMissing => {
                Some("The portal page changed shape; retry with --refresh or log in again")
            }
            Self::CourseNotFound { .. } => Some("List courses with: portalsync cms courses --refresh"),
            _ => None,
        }
    }
}
