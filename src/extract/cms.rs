//! Course management system (CMS) extraction
//!
//! Two pages: the course list, a GridView whose rows carry the postback
//! button used to open a course, and the course page, with an
//! announcement block followed by week blocks holding content cards.

use super::{required_text, selector, text::element_text, text_in};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static COURSE_GRID: LazyLock<Selector> =
    LazyLock::new(|| selector("table[id*='GridViewcourses']"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));
static VIEW_BUTTON: LazyLock<Selector> = LazyLock::new(|| selector("input[type='submit'][name]"));

static COURSE_HEADER: LazyLock<Selector> = LazyLock::new(|| selector("[id*='LabelCourseName']"));
static ANNOUNCEMENTS: LazyLock<Selector> = LazyLock::new(|| selector("div[id$='_desc']"));
static WEEK: LazyLock<Selector> = LazyLock::new(|| selector("div.weeksdata"));
static WEEK_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h2"));
static WEEK_DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| selector("p.m-2"));
static CARD: LazyLock<Selector> = LazyLock::new(|| selector("div.card"));
static CARD_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("[id^='content']"));
static CARD_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector("div.description, [id^='description']"));
static CARD_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a#download[href], a[href]"));

static TRAILING_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)\)\s*$").expect("valid regex"));
static COURSE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\|([^|]+)\|\)").expect("valid regex"));
static TRAILING_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()]+)\)\s*$").expect("valid regex"));

/// One row of the CMS course list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmsCourseRow {
    /// Course name without the trailing numeric id
    pub name: String,
    pub status: String,
    pub season: String,
    pub season_title: String,
    pub course_id: String,
    pub season_id: String,
    /// Form name of the row's "view course" postback button
    pub button_name: String,
}

impl CmsCourseRow {
    /// Course code from the `(|CODE|)` prefix, when present
    pub fn code(&self) -> Option<&str> {
        COURSE_CODE
            .captures(&self.name)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim())
    }

    /// Whether this row identifies the given course and season
    pub fn matches(&self, course_id: &str, season_id: &str) -> bool {
        self.course_id == course_id && self.season_id == season_id
    }
}

/// A CMS course page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmsCourseView {
    pub header: String,
    /// Announcement block as HTML, nested markup preserved
    pub announcements_html: String,
    pub weeks: Vec<CmsWeek>,
}

impl CmsCourseView {
    /// Iterate over every content item of every week
    pub fn content_items_mut(&mut self) -> impl Iterator<Item = &mut CmsContentItem> {
        self.weeks.iter_mut().flat_map(|w| w.contents.iter_mut())
    }
}

/// One week block of a course page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmsWeek {
    pub title: String,
    pub description: String,
    pub contents: Vec<CmsContentItem>,
}

/// One downloadable item inside a week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmsContentItem {
    pub id: String,
    pub title: String,
    /// Trailing parenthesized type, e.g. `Lecture slides`
    pub content_type: String,
    pub description: String,
    pub url: String,
    /// Derived from the locally stored seen set
    #[serde(default)]
    pub seen: bool,
}

/// Extract the course list
///
/// Rows without a postback button, course id or season id cannot be
/// opened and are skipped.
pub fn parse_cms_courses(html: &str) -> Vec<CmsCourseRow> {
    let document = Html::parse_document(html);
    let Some(grid) = document.select(&COURSE_GRID).next() else {
        return vec![];
    };

    grid.select(&ROW).filter_map(parse_course_row).collect()
}

fn parse_course_row(row: ElementRef<'_>) -> Option<CmsCourseRow> {
    let button_name = row
        .select(&VIEW_BUTTON)
        .next()
        .and_then(|b| b.value().attr("name"))
        .map(str::to_string)
        .filter(|n| !n.is_empty())?;

    let cells: Vec<String> = row.select(&CELL).map(element_text).collect();
    let raw_name = cells.get(1)?;
    let course_id = TRAILING_ID.captures(raw_name)?.get(1)?.as_str().to_string();
    let name = TRAILING_ID.replace(raw_name, "").trim().to_string();
    let season = cells.get(3).cloned().unwrap_or_default();
    let season_id: String = season.chars().filter(char::is_ascii_digit).collect();

    if name.is_empty() || season_id.is_empty() {
        return None;
    }

    Some(CmsCourseRow {
        name,
        status: cells.get(2).cloned().unwrap_or_default(),
        season_title: cells.get(4).cloned().unwrap_or_default(),
        season,
        course_id,
        season_id,
        button_name,
    })
}

/// Extract a course page
///
/// Content items without a title are skipped; weeks are kept even when
/// empty since the week itself is shown.
pub fn parse_cms_course_view(html: &str) -> CmsCourseView {
    let document = Html::parse_document(html);

    CmsCourseView {
        header: document
            .select(&COURSE_HEADER)
            .next()
            .map(element_text)
            .unwrap_or_default(),
        announcements_html: document
            .select(&ANNOUNCEMENTS)
            .next()
            .map(|el| el.inner_html().trim().to_string())
            .unwrap_or_default(),
        weeks: document.select(&WEEK).map(parse_week).collect(),
    }
}

fn parse_week(week: ElementRef<'_>) -> CmsWeek {
    CmsWeek {
        title: text_in(week, &WEEK_TITLE),
        description: text_in(week, &WEEK_DESCRIPTION),
        contents: week.select(&CARD).filter_map(parse_content_item).collect(),
    }
}

fn parse_content_item(card: ElementRef<'_>) -> Option<CmsContentItem> {
    let title = required_text(card, &CARD_TITLE)?;
    let id = card
        .select(&CARD_TITLE)
        .next()
        .and_then(|el| el.value().attr("id"))
        .and_then(|id| id.strip_prefix("content"))
        .map(str::to_string)
        .unwrap_or_default();
    let content_type = TRAILING_TYPE
        .captures(&title)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    let url = card
        .select(&CARD_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
        .unwrap_or_default();

    Some(CmsContentItem {
        id,
        title,
        content_type,
        description: text_in(card, &CARD_DESCRIPTION),
        url,
        seen: false,
    })
}
