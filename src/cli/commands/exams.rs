//! Exams command - exam seat assignments

use super::{print_json, spin};
use crate::cli::args::{OutputFormat, RefreshArgs};
use crate::error::PortalResult;
use crate::extract::ExamSeat;
use crate::portal::Portal;
use crate::ui::{self, UiContext};

/// Execute the exams command
pub async fn execute(args: RefreshArgs, portal: &Portal, format: OutputFormat) -> PortalResult<()> {
    let ctx = UiContext::detect();
    let mut seats = spin(
        &ctx,
        format,
        "Fetching exam seats...",
        portal.exam_seats(args.refresh),
        |s| format!("{} exams", s.len()),
    )
    .await?;

    if seats.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => ui::step_info(&ctx, "No exam seats published"),
        }
        return Ok(());
    }

    // Unparseable dates keep page order at the end
    seats.sort_by_key(|s| (s.exam_date().is_none(), s.exam_date()));

    match format {
        OutputFormat::Json => print_json(&seats)?,
        OutputFormat::Plain => print_plain(&seats),
        OutputFormat::Table => {
            ui::intro(&ctx, "Exam seats");
            let rows: Vec<Vec<String>> = seats
                .iter()
                .map(|s| {
                    vec![
                        s.course_name.clone(),
                        format!("{} {}", s.exam_day, s.date),
                        format!("{}-{}", s.start_time, s.end_time),
                        s.hall.clone(),
                        s.seat.clone(),
                        s.exam_type.clone(),
                    ]
                })
                .collect();
            ui::table(&["COURSE", "DATE", "TIME", "HALL", "SEAT", "TYPE"], &rows);
        }
    }
    Ok(())
}

fn print_plain(seats: &[ExamSeat]) {
    for seat in seats {
        println!("{}\t{}\t{}\t{}", seat.course_name, seat.date, seat.hall, seat.seat);
    }
}
