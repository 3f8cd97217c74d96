//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{PortalError, PortalResult};
use crate::ui::{self, UiContext};

/// Keys accepted by `config set`
const VALID_KEYS: &[&str] = &[
    "general.verbose",
    "general.log_format",
    "general.audit_log",
    "proxy.url",
    "proxy.timeout_secs",
    "proxy.max_retries",
    "proxy.retry_delay_ms",
    "portal.home_url",
    "portal.transcript_url",
    "portal.notifications_url",
    "portal.exam_seats_url",
    "portal.cms_courses_url",
    "cache.exam_seats_ttl_hours",
    "cache.cms_courses_ttl_days",
    "cache.cms_course_ttl_hours",
    "cache.transcript_ttl_hours",
    "cache.notifications_ttl_hours",
    "notifications.scheduler",
    "notifications.command",
    "notifications.args",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, manager: &ConfigManager, config: &Config) -> PortalResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => println!("{}", toml::to_string_pretty(config)?),
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => {
            let mut config = config.clone();
            set_value(&mut config, &key, &value)?;
            manager.save(&config).await?;
            ui::step_ok(&UiContext::detect(), &format!("Set {} = {}", key, value));
        }
    }
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> PortalResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());
    Ok(())
}

/// Apply one dot-separated key to the config
fn set_value(config: &mut Config, key: &str, value: &str) -> PortalResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "verbose"] => config.general.verbose = parse_bool(value)?,
        ["general", "log_format"] => {
            if !matches!(value, "text" | "json") {
                return Err(PortalError::User(format!(
                    "Invalid log format: {}. Use text or json",
                    value
                )));
            }
            config.general.log_format = value.to_string()
        }
        ["general", "audit_log"] => config.general.audit_log = parse_bool(value)?,

        ["proxy", "url"] => config.proxy.url = value.to_string(),
        ["proxy", "timeout_secs"] => config.proxy.timeout_secs = parse_number(value)?,
        ["proxy", "max_retries"] => config.proxy.max_retries = parse_number(value)?,
        ["proxy", "retry_delay_ms"] => config.proxy.retry_delay_ms = parse_number(value)?,

        ["portal", "home_url"] => config.portal.home_url = value.to_string(),
        ["portal", "transcript_url"] => config.portal.transcript_url = value.to_string(),
        ["portal", "notifications_url"] => config.portal.notifications_url = value.to_string(),
        ["portal", "exam_seats_url"] => config.portal.exam_seats_url = value.to_string(),
        ["portal", "cms_courses_url"] => config.portal.cms_courses_url = value.to_string(),

        ["cache", "exam_seats_ttl_hours"] => config.cache.exam_seats_ttl_hours = parse_ttl(value)?,
        ["cache", "cms_courses_ttl_days"] => config.cache.cms_courses_ttl_days = parse_ttl(value)?,
        ["cache", "cms_course_ttl_hours"] => config.cache.cms_course_ttl_hours = parse_ttl(value)?,
        ["cache", "transcript_ttl_hours"] => config.cache.transcript_ttl_hours = parse_ttl(value)?,
        ["cache", "notifications_ttl_hours"] => {
            config.cache.notifications_ttl_hours = parse_ttl(value)?
        }

        ["notifications", "scheduler"] => {
            if !matches!(value, "log" | "command") {
                return Err(PortalError::User(format!(
                    "Invalid scheduler: {}. Use log or command",
                    value
                )));
            }
            config.notifications.scheduler = value.to_string()
        }
        ["notifications", "command"] => config.notifications.command = value.to_string(),
        ["notifications", "args"] => {
            config.notifications.args = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        _ => {
            return Err(PortalError::User(format!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                VALID_KEYS.join(", ")
            )))
        }
    }
    Ok(())
}

fn parse_bool(value: &str) -> PortalResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(PortalError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str) -> PortalResult<T> {
    value
        .parse()
        .map_err(|_| PortalError::User(format!("Invalid number: {}", value)))
}

/// Cache entries need a positive lifetime
fn parse_ttl(value: &str) -> PortalResult<u32> {
    match parse_number(value)? {
        0 => Err(PortalError::User("TTL must be at least 1".to_string())),
        n => Ok(n),
    }
}
