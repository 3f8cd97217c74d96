//! Transcript command
//!
//! The cached transcript is printed right away; the network copy
//! follows once the portal answers.

use super::print_json;
use crate::cache::{settle, Revalidation};
use crate::cli::args::{OutputFormat, TranscriptArgs};
use crate::error::PortalResult;
use crate::extract::TranscriptData;
use crate::portal::Portal;
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute the transcript command
pub async fn execute(args: TranscriptArgs, portal: &Portal, format: OutputFormat) -> PortalResult<()> {
    let mut rx = portal.transcript(&args.year).await?;

    if format == OutputFormat::Json {
        let settled = settle(rx).await?;
        return print_json(&serde_json::json!({
            "year": args.year,
            "stale": settled.stale,
            "error": settled.error.map(|e| e.to_string()),
            "transcript": settled.data,
        }));
    }

    let ctx = UiContext::detect();
    let mut spinner = TaskSpinner::new(&ctx);
    let mut shown: Option<TranscriptData> = None;
    if format == OutputFormat::Table {
        spinner.start(&format!("Fetching transcript {}...", args.year));
    }

    while let Some(update) = rx.recv().await {
        match update {
            Revalidation::Cached(data) => {
                spinner.clear();
                render(&ctx, format, &data);
                if format == OutputFormat::Table {
                    ui::remark(&ctx, "Cached copy; checking the portal for changes");
                }
                shown = Some(data);
            }
            Revalidation::Fresh(data) => {
                spinner.clear();
                match &shown {
                    Some(cached) if *cached == data => {
                        if format == OutputFormat::Table {
                            ui::step_ok(&ctx, "Transcript is up to date");
                        }
                    }
                    _ => render(&ctx, format, &data),
                }
                return Ok(());
            }
            Revalidation::Failed(e) => {
                if shown.is_none() {
                    spinner.stop_error("Transcript unavailable");
                    return Err(e);
                }
                if format == OutputFormat::Table {
                    let hint = e.hint().unwrap_or("Showing the cached transcript");
                    ui::step_warn_hint(&ctx, &format!("Refresh failed: {}", e), hint);
                }
                return Ok(());
            }
        }
    }
    Ok(())
}

fn render(ctx: &UiContext, format: OutputFormat, data: &TranscriptData) {
    match format {
        OutputFormat::Plain => {
            for semester in &data.semesters {
                for course in &semester.courses {
                    println!(
                        "{}\t{}\t{}\t{}",
                        semester.title, course.name, course.letter_grade, course.credit_hours
                    );
                }
            }
        }
        _ => {
            let title = if data.student_info.name.is_empty() {
                "Transcript".to_string()
            } else {
                format!("Transcript - {}", data.student_info.name)
            };
            ui::intro(ctx, &title);
            for (key, value) in [
                ("Student id", &data.student_info.student_id),
                ("Faculty", &data.student_info.faculty),
                ("Major", &data.student_info.major),
                ("Study group", &data.study_group),
                ("Cumulative GPA", &data.cumulative_gpa),
                ("Date", &data.date),
            ] {
                if !value.is_empty() {
                    ui::key_value(ctx, key, value);
                }
            }

            for semester in &data.semesters {
                let heading = if semester.gpa.is_empty() {
                    semester.title.clone()
                } else {
                    format!("{} (GPA {})", semester.title, semester.gpa)
                };
                ui::section(ctx, &heading);
                let rows: Vec<Vec<String>> = semester
                    .courses
                    .iter()
                    .map(|c| {
                        vec![
                            c.semester_code.clone(),
                            c.name.clone(),
                            c.numeric_grade.clone(),
                            c.letter_grade.clone(),
                            c.credit_hours.clone(),
                        ]
                    })
                    .collect();
                ui::table(&["CODE", "COURSE", "GRADE", "LETTER", "HOURS"], &rows);
            }
        }
    }
}
