//! Notification list extraction

use super::{
    dates::parse_portal_timestamp, required_text, selector, text::html_to_lines, text_in,
};
use chrono::NaiveDateTime;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

static LIST: LazyLock<Selector> = LazyLock::new(|| selector("table[id*='Notification']"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("[id*='lblTitle']"));
static DATE: LazyLock<Selector> = LazyLock::new(|| selector("[id*='lblDate']"));
static STAFF: LazyLock<Selector> = LazyLock::new(|| selector("[id*='lblStaff']"));
static IMPORTANCE: LazyLock<Selector> = LazyLock::new(|| selector("[id*='lblImportance']"));
static BODY: LazyLock<Selector> = LazyLock::new(|| selector("[id*='lblBody']"));

/// A portal notification with app-local read state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Content hash, stable across fetches of the same notification
    pub id: String,
    pub title: String,
    /// Date as rendered by the portal
    pub date: String,
    pub staff: String,
    pub importance: String,
    /// Plain text body, paragraphs separated by newlines
    pub body: String,
    #[serde(default)]
    pub is_read: bool,
    /// Parsed `date`, when it matched the portal format
    pub created_at: Option<NaiveDateTime>,
}

impl Notification {
    /// Whether the portal flagged the notification as important
    pub fn is_important(&self) -> bool {
        self.importance.eq_ignore_ascii_case("high")
    }
}

/// Extract notifications in page order; rows without a title are skipped
pub fn parse_notifications(html: &str) -> Vec<Notification> {
    let document = Html::parse_document(html);
    let Some(list) = document.select(&LIST).next() else {
        return vec![];
    };

    list.select(&ROW).filter_map(parse_row).collect()
}

fn parse_row(row: ElementRef<'_>) -> Option<Notification> {
    let title = required_text(row, &TITLE)?;
    let date = text_in(row, &DATE);
    let staff = text_in(row, &STAFF);
    let body = row
        .select(&BODY)
        .next()
        .map(|el| html_to_lines(&el.inner_html()))
        .unwrap_or_default();

    Some(Notification {
        id: notification_id(&title, &date, &staff, &body),
        created_at: parse_portal_timestamp(&date),
        importance: text_in(row, &IMPORTANCE),
        title,
        date,
        staff,
        body,
        is_read: false,
    })
}

/// Derive a stable id from the notification's content
fn notification_id(title: &str, date: &str, staff: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    for part in [title, date, staff, body] {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]);
    }
    hex::encode(&hasher.finalize()[..12])
}
