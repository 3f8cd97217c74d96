//! Local notification delivery
//!
//! Delivery is fire-and-forget: a scheduler logs its own failures and
//! never reports them to the caller.

use crate::config::schema::NotificationsConfig;
use async_trait::async_trait;
use serde::Serialize;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Delivery priority hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    High,
}

impl Priority {
    fn urgency(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::High => "critical",
        }
    }
}

/// One local notification to deliver
#[derive(Debug, Clone, Serialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    /// Opaque payload for the receiving shell
    pub data: serde_json::Value,
    pub priority: Priority,
}

/// Platform notification capability
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    /// Deliver a notification now
    async fn schedule(&self, content: NotificationContent);

    /// Backend name for display
    fn name(&self) -> &'static str;
}

/// Writes notifications to the tracing log
#[derive(Debug, Default)]
pub struct LogScheduler;

#[async_trait]
impl NotificationScheduler for LogScheduler {
    async fn schedule(&self, content: NotificationContent) {
        info!(
            title = %content.title,
            priority = ?content.priority,
            "New notification: {}",
            content.body
        );
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Runs a desktop notifier such as `notify-send`
///
/// Invoked as `<program> <args..> --urgency=<u> <title> <body>`.
#[derive(Debug, Clone)]
pub struct CommandScheduler {
    program: String,
    args: Vec<String>,
}

impl CommandScheduler {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn command_args(&self, content: &NotificationContent) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(format!("--urgency={}", content.priority.urgency()));
        args.push(content.title.clone());
        args.push(content.body.clone());
        args
    }
}

#[async_trait]
impl NotificationScheduler for CommandScheduler {
    async fn schedule(&self, content: NotificationContent) {
        let args = self.command_args(&content);
        debug!("Running {} {:?}", self.program, args);

        let result = Command::new(&self.program)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {}
            Ok(output) => warn!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(e) => warn!("Failed to run {}: {}", self.program, e),
        }
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

/// Build the scheduler selected in config; unknown names fall back to logging
pub fn from_config(config: &NotificationsConfig) -> Arc<dyn NotificationScheduler> {
    match config.scheduler.as_str() {
        "command" => Arc::new(CommandScheduler::new(&config.command, config.args.clone())),
        "log" => Arc::new(LogScheduler),
        other => {
            warn!("Unknown notification scheduler '{}', using log", other);
            Arc::new(LogScheduler)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(priority: Priority) -> NotificationContent {
        NotificationContent {
            title: "Lab cancelled".to_string(),
            body: "No lab today".to_string(),
            data: serde_json::json!({ "id": "abc" }),
            priority,
        }
    }

    #[test]
    fn command_args_end_with_title_and_body() {
        let scheduler = CommandScheduler::new("notify-send", vec!["--app-name=portalsync".into()]);
        let args = scheduler.command_args(&content(Priority::High));
        assert_eq!(
            args,
            vec![
                "--app-name=portalsync",
                "--urgency=critical",
                "Lab cancelled",
                "No lab today"
            ]
        );
    }

    #[test]
    fn factory_honors_config() {
        let mut config = NotificationsConfig::default();
        assert_eq!(from_config(&config).name(), "log");

        config.scheduler = "command".to_string();
        assert_eq!(from_config(&config).name(), "command");

        config.scheduler = "pager".to_string();
        assert_eq!(from_config(&config).name(), "log");
    }

    #[tokio::test]
    async fn missing_program_is_swallowed() {
        let scheduler = CommandScheduler::new("portalsync-no-such-notifier", vec![]);
        scheduler.schedule(content(Priority::Normal)).await;
    }
}
