//! Notifications command - sync, list and read state

use super::{print_json, spin};
use crate::cli::args::{NotificationsAction, NotificationsArgs, OutputFormat};
use crate::error::{PortalError, PortalResult};
use crate::extract::Notification;
use crate::notify::NotificationState;
use crate::portal::Portal;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the notifications command
pub async fn execute(
    args: NotificationsArgs,
    portal: &Portal,
    format: OutputFormat,
) -> PortalResult<()> {
    let ctx = UiContext::detect();
    let center = portal.notifications();

    match args.action.unwrap_or(NotificationsAction::Sync) {
        NotificationsAction::Sync => {
            center.restore().await?;
            let unseen = spin(
                &ctx,
                format,
                "Fetching notifications...",
                portal.sync_notifications(),
                |new| format!("{} new", new.len()),
            )
            .await?;
            print_state(&ctx, format, &center.state(), &unseen)?;
        }
        NotificationsAction::List => {
            let state = center.restore().await?;
            print_state(&ctx, format, &state, &[])?;
        }
        NotificationsAction::Read { id } => {
            let state = center.restore().await?;
            let id = resolve_id(&state, &id)?;
            center
                .mark_as_read(&id)
                .await
                .map_err(|e| PortalError::Internal(format!("read-state task failed: {}", e)))?;
            report(&ctx, format, &center.state(), &format!("Marked {} as read", short_id(&id)))?;
        }
        NotificationsAction::ReadAll => {
            center.restore().await?;
            center
                .mark_all_as_read()
                .await
                .map_err(|e| PortalError::Internal(format!("read-state task failed: {}", e)))?;
            report(&ctx, format, &center.state(), "Marked all notifications as read")?;
        }
    }
    Ok(())
}

/// Accept a full id or an unambiguous prefix of one
fn resolve_id(state: &NotificationState, id: &str) -> PortalResult<String> {
    if state.notifications.iter().any(|n| n.id == id) {
        return Ok(id.to_string());
    }
    let matches: Vec<&Notification> = state
        .notifications
        .iter()
        .filter(|n| n.id.starts_with(id))
        .collect();
    match matches.as_slice() {
        [single] => Ok(single.id.clone()),
        [] => Err(PortalError::User(format!("No notification with id {}", id))),
        _ => Err(PortalError::User(format!(
            "Id prefix {} matches {} notifications",
            id,
            matches.len()
        ))),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn report(ctx: &UiContext, format: OutputFormat, state: &NotificationState, message: &str) -> PortalResult<()> {
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "unreadCount": state.unread_count }))?,
        OutputFormat::Plain => println!("{}", state.unread_count),
        OutputFormat::Table => ui::step_ok_detail(
            ctx,
            message,
            &format!("{} unread", state.unread_count),
        ),
    }
    Ok(())
}

fn print_state(
    ctx: &UiContext,
    format: OutputFormat,
    state: &NotificationState,
    unseen: &[Notification],
) -> PortalResult<()> {
    match format {
        OutputFormat::Json => print_json(state)?,
        OutputFormat::Plain => {
            for n in &state.notifications {
                println!("{}\t{}\t{}", n.id, if n.is_read { "read" } else { "unread" }, n.title);
            }
        }
        OutputFormat::Table => {
            if state.notifications.is_empty() {
                ui::step_info(ctx, "No notifications");
                return Ok(());
            }
            ui::intro(ctx, "Notifications");
            let rows: Vec<Vec<String>> = state
                .notifications
                .iter()
                .map(|n| {
                    let marker = if unseen.iter().any(|u| u.id == n.id) {
                        style("new").cyan().to_string()
                    } else if !n.is_read {
                        style("*").yellow().to_string()
                    } else {
                        String::new()
                    };
                    let title = if n.is_important() {
                        style(&n.title).bold().to_string()
                    } else {
                        n.title.clone()
                    };
                    vec![marker, short_id(&n.id).to_string(), n.date.clone(), n.staff.clone(), title]
                })
                .collect();
            ui::table(&["", "ID", "DATE", "STAFF", "TITLE"], &rows);
            println!();
            println!(
                "{} notification(s), {} unread",
                state.notifications.len(),
                state.unread_count
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(id: &str) -> Notification {
        Notification {
            id: id.to_string(),
            title: "Midterm moved".to_string(),
            date: "1/5/2025".to_string(),
            staff: "Dr. Smith".to_string(),
            importance: "High".to_string(),
            body: String::new(),
            is_read: false,
            created_at: None,
        }
    }

    fn state(ids: &[&str]) -> NotificationState {
        NotificationState {
            notifications: ids.iter().map(|id| notification(id)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn resolve_exact_and_prefix() {
        let state = state(&["abcdef12", "abc99999", "ffff0000"]);
        assert_eq!(resolve_id(&state, "abc99999").unwrap(), "abc99999");
        assert_eq!(resolve_id(&state, "ff").unwrap(), "ffff0000");
    }

    #[test]
    fn resolve_rejects_ambiguous_and_unknown() {
        let state = state(&["abcdef12", "abc99999"]);
        assert!(matches!(resolve_id(&state, "abc"), Err(PortalError::User(_))));
        assert!(matches!(resolve_id(&state, "zzz"), Err(PortalError::User(_))));
    }
}
