//! Configuration schema for portalsync
//!
//! Configuration is stored at `~/.config/portalsync/config.toml`

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Remote proxy settings
    pub proxy: ProxyConfig,

    /// Portal resource endpoints
    pub portal: PortalConfig,

    /// Cache TTLs
    pub cache: CacheConfig,

    /// Local notification delivery
    pub notifications: NotificationsConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,

    /// Enable audit logging
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// Remote proxy configuration
///
/// The proxy receives a JSON envelope, performs the portal request
/// (including NTLM negotiation) and answers with `{status, body, headers}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Proxy endpoint URL
    pub url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Attempts for read-only requests after the first one (0 = no retry)
    pub max_retries: u32,

    /// Base delay between retries in milliseconds, multiplied by attempt
    pub retry_delay_ms: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8787/proxy".to_string(),
            timeout_secs: 30,
            max_retries: 2,
            retry_delay_ms: 500,
        }
    }
}

/// Portal endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Page requested on login to validate credentials
    pub home_url: String,

    /// Transcript page (year selection is a postback on this page)
    pub transcript_url: String,

    /// Notifications list page
    pub notifications_url: String,

    /// Exam seating page
    pub exam_seats_url: String,

    /// CMS course list page
    pub cms_courses_url: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            home_url: "https://portal.example.edu/StudentServices/Default.aspx".to_string(),
            transcript_url:
                "https://portal.example.edu/StudentServices/Transcript.aspx".to_string(),
            notifications_url:
                "https://portal.example.edu/StudentServices/Notifications.aspx".to_string(),
            exam_seats_url: "https://portal.example.edu/StudentServices/ExamSeats.aspx".to_string(),
            cms_courses_url: "https://cms.example.edu/apps/student/ViewAllCourseStn".to_string(),
        }
    }
}

/// Cache TTL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Exam seat list TTL in hours
    pub exam_seats_ttl_hours: u32,

    /// CMS course list TTL in days
    pub cms_courses_ttl_days: u32,

    /// CMS course page TTL in hours
    pub cms_course_ttl_hours: u32,

    /// Transcript TTL in hours (stale entries are still shown while revalidating)
    pub transcript_ttl_hours: u32,

    /// Notification content TTL in hours
    pub notifications_ttl_hours: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            exam_seats_ttl_hours: 6,
            cms_courses_ttl_days: 30,
            cms_course_ttl_hours: 24,
            transcript_ttl_hours: 24,
            notifications_ttl_hours: 24 * 7,
        }
    }
}

/// Local notification delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Scheduler backend: "log" or "command"
    pub scheduler: String,

    /// Notifier program for the "command" backend
    pub command: String,

    /// Extra arguments passed before title and body
    pub args: Vec<String>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            scheduler: "log".to_string(),
            command: "notify-send".to_string(),
            args: vec!["--app-name=portalsync".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[proxy]"));
        assert!(toml.contains("[cache]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.cache.cms_courses_ttl_days, 30);
        assert_eq!(config.cache.cms_course_ttl_hours, 24);
        assert_eq!(config.notifications.scheduler, "log");
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [proxy]
            url = "https://proxy.internal/forward"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.proxy.url, "https://proxy.internal/forward");
        assert_eq!(config.proxy.timeout_secs, 30); // default preserved
    }
}
