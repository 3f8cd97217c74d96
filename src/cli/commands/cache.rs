//! Cache command - drop cached portal resources

use super::print_json;
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::error::PortalResult;
use crate::portal::Portal;
use crate::ui::{self, UiContext};

/// Execute the cache command
pub async fn execute(args: CacheArgs, portal: &Portal, format: OutputFormat) -> PortalResult<()> {
    match args.action {
        CacheAction::Clear { prefix, yes } => clear(portal, format, prefix, yes).await,
    }
}

async fn clear(
    portal: &Portal,
    format: OutputFormat,
    prefix: Option<String>,
    yes: bool,
) -> PortalResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);
    let target = match &prefix {
        Some(prefix) => format!("cached entries under '{}'", prefix),
        None => "all cached entries".to_string(),
    };

    if format == OutputFormat::Table
        && !ui::confirm(&ctx, &format!("Remove {}?", target), true).await?
    {
        ui::step_info(&ctx, "Nothing removed");
        return Ok(());
    }

    let cache = portal.cache();
    let removed = match &prefix {
        Some(prefix) => cache.clear_by_prefix(prefix).await?,
        None => cache.clear_all().await?,
    };

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "removed": removed }))?,
        OutputFormat::Plain => println!("{}", removed),
        OutputFormat::Table => ui::step_ok_detail(
            &ctx,
            &format!("Removed {}", target),
            &format!("{} entries", removed),
        ),
    }
    Ok(())
}
