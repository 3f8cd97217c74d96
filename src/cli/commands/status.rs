//! Status command - show the stored session

use super::print_json;
use crate::cli::args::OutputFormat;
use crate::error::PortalResult;
use crate::portal::Portal;
use crate::ui::{self, UiContext};

/// Execute the status command
pub async fn execute(portal: &Portal, format: OutputFormat) -> PortalResult<()> {
    let status = portal.status().await;
    let notifications = portal.notifications().restore().await?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "session": status,
            "proxy": portal.config().proxy.url,
            "notifications": notifications.notifications.len(),
            "unread": notifications.unread_count,
        }))?,
        OutputFormat::Plain => {
            println!("{}", if status.logged_in { "logged-in" } else { "logged-out" })
        }
        OutputFormat::Table => {
            let ctx = UiContext::detect();
            ui::intro(&ctx, "portalsync status");

            ui::section(&ctx, "Session");
            if status.logged_in {
                ui::key_value_status(&ctx, "State", "logged in", true);
                ui::key_value(&ctx, "Username", status.username.as_deref().unwrap_or("-"));
                ui::key_value(&ctx, "User id", status.user_id.as_deref().unwrap_or("-"));
                ui::key_value_status(
                    &ctx,
                    "Cookie",
                    if status.has_cookie { "present" } else { "none" },
                    status.has_cookie,
                );
            } else {
                ui::key_value_status(&ctx, "State", "not logged in", false);
                ui::remark(&ctx, "Run: portalsync login");
            }

            ui::section(&ctx, "Portal");
            ui::key_value(&ctx, "Proxy", &portal.config().proxy.url);
            ui::key_value(
                &ctx,
                "Notifications",
                &format!(
                    "{} cached, {} unread",
                    notifications.notifications.len(),
                    notifications.unread_count
                ),
            );
        }
    }
    Ok(())
}
