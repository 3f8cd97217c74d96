//! Exam seating table extraction
//!
//! The seating grid has no labeled cells, so this is the one positional
//! contract: course, day, date, start, end, hall, seat, type.

use super::{dates::parse_exam_date, selector, text::element_text};
use chrono::NaiveDate;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static EXAM_TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table[id*='Exam']"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));

const MIN_CELLS: usize = 8;

/// One exam seat assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSeat {
    pub course_name: String,
    pub exam_day: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub hall: String,
    pub seat: String,
    pub exam_type: String,
}

impl ExamSeat {
    /// Exam date parsed from the portal's `D - MonthName - YYYY` format
    pub fn exam_date(&self) -> Option<NaiveDate> {
        parse_exam_date(&self.date)
    }
}

/// Extract exam seats; rows with fewer than eight cells are skipped
pub fn parse_exam_seats(html: &str) -> Vec<ExamSeat> {
    let document = Html::parse_document(html);
    let Some(table) = document.select(&EXAM_TABLE).next() else {
        return vec![];
    };

    table
        .select(&ROW)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&CELL).map(element_text).collect();
            if cells.len() < MIN_CELLS {
                return None;
            }
            let mut cells = cells.into_iter();
            let mut next = || cells.next().unwrap_or_default();
            Some(ExamSeat {
                course_name: next(),
                exam_day: next(),
                date: next(),
                start_time: next(),
                end_time: next(),
                hall: next(),
                seat: next(),
                exam_type: next(),
            })
        })
        .collect()
}
