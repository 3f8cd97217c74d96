//! Interactive prompts with a non-interactive fallback

use super::context::UiContext;
use crate::error::{PortalError, PortalResult};

/// Ask a yes/no question; returns `default` when nobody can answer
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> PortalResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }
    if !ctx.is_interactive() {
        return Ok(default);
    }

    let message = message.to_string();
    blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
}

/// Ask for a line of text, prefilled with `default` when given
pub async fn input(ctx: &UiContext, message: &str, default: Option<&str>) -> PortalResult<String> {
    if !ctx.is_interactive() {
        return default.map(str::to_string).ok_or_else(|| {
            PortalError::User(format!("{} is required when not running in a terminal", message))
        });
    }

    let message = message.to_string();
    let default = default.map(str::to_string);
    blocking(move || {
        let mut prompt = cliclack::input(&message).required(true);
        if let Some(default) = default {
            prompt = prompt.default_input(&default);
        }
        prompt.interact::<String>()
    })
    .await
}

/// Ask for a secret without echoing it
pub async fn password(ctx: &UiContext, message: &str) -> PortalResult<String> {
    if !ctx.is_interactive() {
        return Err(PortalError::User(
            "Password prompt needs a terminal; pass --password-stdin".to_string(),
        ));
    }

    let message = message.to_string();
    blocking(move || cliclack::password(&message).mask('▪').interact()).await
}

/// cliclack prompts block on the terminal
async fn blocking<T, F>(prompt: F) -> PortalResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(prompt)
        .await
        .map_err(|e| PortalError::Internal(format!("Prompt task failed: {}", e)))?
        .map_err(|e| PortalError::User(format!("Prompt failed: {}", e)))
}
