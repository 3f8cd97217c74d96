//! Login and logout commands

use super::{print_json, spin};
use crate::cli::args::{LoginArgs, OutputFormat};
use crate::error::{PortalError, PortalResult};
use crate::portal::Portal;
use crate::ui::{self, UiContext};

/// Execute the login command
pub async fn execute(args: LoginArgs, portal: &Portal, format: OutputFormat) -> PortalResult<()> {
    let ctx = UiContext::detect();

    let username = match args.username {
        Some(username) => username,
        None => {
            let previous = portal.status().await.username;
            ui::input(&ctx, "Username", previous.as_deref()).await?
        }
    };
    let password = if args.password_stdin {
        read_password_stdin().await?
    } else {
        ui::password(&ctx, "Password").await?
    };
    if username.trim().is_empty() || password.is_empty() {
        return Err(PortalError::User(
            "Username and password must not be empty".to_string(),
        ));
    }

    let status = spin(
        &ctx,
        format,
        &format!("Logging in as {}...", username),
        portal.login(username.trim(), &password),
        |status| match &status.user_id {
            Some(id) => format!("Logged in (user id {})", id),
            None => "Logged in".to_string(),
        },
    )
    .await?;

    match format {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Plain => println!("{}", status.username.unwrap_or_default()),
        OutputFormat::Table => {
            if !status.has_cookie {
                ui::step_warn_hint(
                    &ctx,
                    "Portal did not issue a session cookie",
                    "Requests will rely on NTLM credentials",
                );
            }
        }
    }
    Ok(())
}

/// Execute the logout command
pub async fn logout(portal: &Portal, format: OutputFormat) -> PortalResult<()> {
    portal.logout().await?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "loggedOut": true }))?,
        OutputFormat::Plain => {}
        OutputFormat::Table => ui::step_ok(
            &UiContext::detect(),
            "Logged out; session, cache and notification state cleared",
        ),
    }
    Ok(())
}

/// First line of stdin, without the line terminator
async fn read_password_stdin() -> PortalResult<String> {
    let line = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await
    .map_err(|e| PortalError::Internal(format!("stdin task failed: {}", e)))?
    .map_err(|e| PortalError::io("reading password from stdin", e))?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
