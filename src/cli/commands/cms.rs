//! CMS command - courses, course content and seen markers

use super::{print_json, spin};
use crate::cli::args::{CmsAction, CmsArgs, OutputFormat};
use crate::error::PortalResult;
use crate::extract::text::html_to_lines;
use crate::extract::{CmsCourseRow, CmsCourseView};
use crate::portal::Portal;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the cms command
pub async fn execute(args: CmsArgs, portal: &Portal, format: OutputFormat) -> PortalResult<()> {
    let ctx = UiContext::detect();

    match args.action {
        CmsAction::Courses { refresh } => {
            let courses = spin(
                &ctx,
                format,
                "Fetching CMS courses...",
                portal.cms_courses(refresh),
                |c| format!("{} courses", c.len()),
            )
            .await?;
            print_courses(&ctx, format, &courses)?;
        }
        CmsAction::View {
            course,
            season,
            refresh,
        } => {
            let view = spin(
                &ctx,
                format,
                &format!("Opening course {}...", course),
                portal.cms_course(&course, &season, refresh),
                |v| format!("{} weeks", v.weeks.len()),
            )
            .await?;
            print_view(&ctx, format, &view)?;
        }
        CmsAction::Seen { content } => {
            portal.mark_content_seen(&content).await?;
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({ "seen": content }))?,
                OutputFormat::Plain => {}
                OutputFormat::Table => ui::step_ok(&ctx, &format!("Marked {} as seen", content)),
            }
        }
    }
    Ok(())
}

fn print_courses(ctx: &UiContext, format: OutputFormat, courses: &[CmsCourseRow]) -> PortalResult<()> {
    match format {
        OutputFormat::Json => print_json(courses)?,
        OutputFormat::Plain => {
            for c in courses {
                println!("{}\t{}\t{}", c.course_id, c.season_id, c.name);
            }
        }
        OutputFormat::Table => {
            if courses.is_empty() {
                ui::step_info(ctx, "No courses listed");
                return Ok(());
            }
            ui::intro(ctx, "CMS courses");
            let rows: Vec<Vec<String>> = courses
                .iter()
                .map(|c| {
                    vec![
                        c.course_id.clone(),
                        c.season_id.clone(),
                        c.name.clone(),
                        c.status.clone(),
                        c.season_title.clone(),
                    ]
                })
                .collect();
            ui::table(&["COURSE", "SEASON", "NAME", "STATUS", "TERM"], &rows);
            println!();
            ui::remark(ctx, "Open one with: portalsync cms view <course> <season>");
        }
    }
    Ok(())
}

fn print_view(ctx: &UiContext, format: OutputFormat, view: &CmsCourseView) -> PortalResult<()> {
    match format {
        OutputFormat::Json => print_json(view)?,
        OutputFormat::Plain => {
            for week in &view.weeks {
                for item in &week.contents {
                    println!("{}\t{}\t{}\t{}", item.id, week.title, item.title, item.url);
                }
            }
        }
        OutputFormat::Table => {
            ui::intro(ctx, &view.header);
            let announcements = html_to_lines(&view.announcements_html);
            if !announcements.is_empty() {
                ui::note(ctx, "Announcements", &announcements);
            }
            for week in &view.weeks {
                ui::section(ctx, &week.title);
                if !week.description.is_empty() {
                    ui::remark(ctx, &week.description);
                }
                for item in &week.contents {
                    let marker = if item.seen {
                        " ".to_string()
                    } else {
                        style("*").yellow().to_string()
                    };
                    println!("  {} [{}] {}", marker, item.id, item.title);
                    if !item.url.is_empty() {
                        println!("      {}", style(&item.url).dim());
                    }
                }
            }
        }
    }
    Ok(())
}
