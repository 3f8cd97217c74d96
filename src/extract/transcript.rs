//! Transcript page extraction
//!
//! Each semester is its own table (`id` containing `semTbl`) with the
//! course rows in a nested table. Course fields are labels whose `id`
//! contains a fixed marker, so rows are matched by label rather than by
//! column position.

use super::{required_text, selector, text::element_text, text_in, text_in_document};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static STUDENT_NAME: LazyLock<Selector> = LazyLock::new(|| selector("[id*='stdNameLbl']"));
static STUDENT_ID: LazyLock<Selector> = LazyLock::new(|| selector("[id*='stdIdLbl']"));
static FACULTY: LazyLock<Selector> = LazyLock::new(|| selector("[id*='facultyLbl']"));
static MAJOR: LazyLock<Selector> = LazyLock::new(|| selector("[id*='majorLbl']"));
static STUDY_GROUP: LazyLock<Selector> = LazyLock::new(|| selector("[id*='studyGroupLbl']"));
static CUMULATIVE_GPA: LazyLock<Selector> = LazyLock::new(|| selector("[id*='cmGpaLbl']"));
static DATE: LazyLock<Selector> = LazyLock::new(|| selector("[id*='dateLbl']"));

static SEMESTER_TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table[id*='semTbl']"));
static SEMESTER_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("[id*='semNameLbl']"));
static SEMESTER_GPA: LazyLock<Selector> = LazyLock::new(|| selector("[id*='semGpaLbl']"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));

static COURSE_SEMESTER: LazyLock<Selector> = LazyLock::new(|| selector("[id*='crsSemCodeLbl']"));
static COURSE_NAME: LazyLock<Selector> = LazyLock::new(|| selector("[id*='crsNameLbl']"));
static COURSE_NUMERIC: LazyLock<Selector> = LazyLock::new(|| selector("[id*='crsNumGradeLbl']"));
static COURSE_LETTER: LazyLock<Selector> =
    LazyLock::new(|| selector("[id*='crsLetterGradeLbl']"));
static COURSE_HOURS: LazyLock<Selector> = LazyLock::new(|| selector("[id*='crsHoursLbl']"));

static YEAR_LIST: LazyLock<Selector> = LazyLock::new(|| selector("select[id*='stdYrLst']"));
static OPTION: LazyLock<Selector> = LazyLock::new(|| selector("option"));

/// Transcript header fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInfo {
    pub name: String,
    pub student_id: String,
    pub faculty: String,
    pub major: String,
}

/// One graded course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub semester_code: String,
    pub name: String,
    pub numeric_grade: String,
    pub letter_grade: String,
    pub credit_hours: String,
}

/// One semester with at least one course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub title: String,
    pub gpa: String,
    pub courses: Vec<Course>,
}

/// Transcript for one study year
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptData {
    pub student_info: StudentInfo,
    pub semesters: Vec<Semester>,
    pub cumulative_gpa: String,
    pub study_group: String,
    pub date: String,
}

impl TranscriptData {
    /// Whether nothing was extracted
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Total number of courses across semesters
    pub fn course_count(&self) -> usize {
        self.semesters.iter().map(|s| s.courses.len()).sum()
    }
}

/// Study year drop-down of the transcript page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyYears {
    /// Form field name to post the selected year under
    pub field_name: String,
    /// Selectable year values, in page order
    pub years: Vec<String>,
}

/// Extract a transcript
///
/// Header fields default to empty strings when their label is missing.
/// Courses missing any of numeric grade, letter grade, credit hours or
/// semester code are dropped, and so are semesters left without courses.
pub fn parse_transcript(html: &str) -> TranscriptData {
    let document = Html::parse_document(html);

    TranscriptData {
        student_info: StudentInfo {
            name: text_in_document(&document, &STUDENT_NAME),
            student_id: text_in_document(&document, &STUDENT_ID),
            faculty: text_in_document(&document, &FACULTY),
            major: text_in_document(&document, &MAJOR),
        },
        semesters: document
            .select(&SEMESTER_TABLE)
            .filter_map(parse_semester)
            .collect(),
        cumulative_gpa: text_in_document(&document, &CUMULATIVE_GPA),
        study_group: text_in_document(&document, &STUDY_GROUP),
        date: text_in_document(&document, &DATE),
    }
}

fn parse_semester(table: ElementRef<'_>) -> Option<Semester> {
    let courses: Vec<Course> = table
        .select(&ROW)
        .filter(|row| is_leaf_row(*row))
        .filter_map(parse_course)
        .collect();

    if courses.is_empty() {
        return None;
    }

    Some(Semester {
        title: text_in(table, &SEMESTER_TITLE),
        gpa: text_in(table, &SEMESTER_GPA),
        courses,
    })
}

/// Rows that wrap a nested table would otherwise match their first child row
fn is_leaf_row(row: ElementRef<'_>) -> bool {
    row.select(&ROW).next().is_none()
}

fn parse_course(row: ElementRef<'_>) -> Option<Course> {
    Some(Course {
        semester_code: required_text(row, &COURSE_SEMESTER)?,
        name: text_in(row, &COURSE_NAME),
        numeric_grade: required_text(row, &COURSE_NUMERIC)?,
        letter_grade: required_text(row, &COURSE_LETTER)?,
        credit_hours: required_text(row, &COURSE_HOURS)?,
    })
}

/// Extract the study year drop-down, skipping the placeholder option
pub fn extract_study_years(html: &str) -> Option<StudyYears> {
    let document = Html::parse_document(html);
    let list = document.select(&YEAR_LIST).next()?;
    let field_name = list.value().attr("name")?.to_string();

    let years = list
        .select(&OPTION)
        .filter_map(|option| {
            let value = option
                .value()
                .attr("value")
                .map(str::trim)
                .map(str::to_string)
                .unwrap_or_else(|| element_text(option));
            Some(value).filter(|v| !v.is_empty() && v != "0")
        })
        .collect();

    Some(StudyYears { field_name, years })
}
