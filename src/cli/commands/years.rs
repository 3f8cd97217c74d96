//! Years command - study years offered by the transcript page

use super::{print_json, spin};
use crate::cli::args::{OutputFormat, RefreshArgs};
use crate::error::PortalResult;
use crate::portal::Portal;
use crate::ui::{self, UiContext};

/// Execute the years command
pub async fn execute(args: RefreshArgs, portal: &Portal, format: OutputFormat) -> PortalResult<()> {
    let ctx = UiContext::detect();
    let years = spin(
        &ctx,
        format,
        "Fetching study years...",
        portal.study_years(args.refresh),
        |y| format!("{} study years", y.years.len()),
    )
    .await?;

    match format {
        OutputFormat::Json => print_json(&years)?,
        OutputFormat::Plain => years.years.iter().for_each(|y| println!("{}", y)),
        OutputFormat::Table => {
            for year in &years.years {
                ui::step_info(&ctx, year);
            }
            ui::remark(&ctx, "Show one with: portalsync transcript <year>");
        }
    }
    Ok(())
}
