//! Portal date formats
//!
//! Both formats are assembled from explicitly matched fields. Generic
//! date parsing guesses month/day order and gets `3/4/2024` wrong half
//! the time.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

static EXAM_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2})\s*-\s*([A-Za-z]+)\s*-\s*(\d{4})\s*$").expect("valid regex")
});

static PORTAL_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(\d{1,2})/(\d{1,2})/(\d{4})(?:\s+(\d{1,2}):(\d{2})(?::(\d{2}))?\s*(AM|PM)?)?\s*$",
    )
    .expect("valid regex")
});

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Month number (1-12) for a full or three-letter English month name
fn month_number(name: &str) -> Option<u32> {
    let name = name.to_ascii_lowercase();
    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| *m == name || (name.len() == 3 && m.starts_with(&name)))
        .map(|i| i as u32 + 1)
}

/// Parse an exam date such as `5 - January - 2025`
pub fn parse_exam_date(s: &str) -> Option<NaiveDate> {
    let caps = EXAM_DATE.captures(s)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = month_number(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a notification timestamp `M/D/YYYY[ h:mm[:ss] AM|PM]`
///
/// A missing time yields midnight.
pub fn parse_portal_timestamp(s: &str) -> Option<NaiveDateTime> {
    let caps = PORTAL_TIMESTAMP.captures(s)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let Some(hour) = caps.get(4) else {
        return date.and_hms_opt(0, 0, 0);
    };
    let mut hour: u32 = hour.as_str().parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;
    let second: u32 = caps.get(6).map_or(Some(0), |s| s.as_str().parse().ok())?;

    if let Some(meridiem) = caps.get(7) {
        if hour == 0 || hour > 12 {
            return None;
        }
        let pm = meridiem.as_str().eq_ignore_ascii_case("PM");
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }

    Some(date.and_time(NaiveTime::from_hms_opt(hour, minute, second)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exam_date_full_month() {
        assert_eq!(
            parse_exam_date("5 - January - 2025"),
            NaiveDate::from_ymd_opt(2025, 1, 5)
        );
    }

    #[test]
    fn exam_date_short_month_and_spacing() {
        assert_eq!(
            parse_exam_date(" 28-Dec-2024 "),
            NaiveDate::from_ymd_opt(2024, 12, 28)
        );
    }

    #[test]
    fn exam_date_rejects_invalid() {
        assert!(parse_exam_date("31 - February - 2025").is_none());
        assert!(parse_exam_date("5 - Smarch - 2025").is_none());
        assert!(parse_exam_date("2025-01-05").is_none());
    }

    #[test]
    fn timestamp_is_month_first() {
        let ts = parse_portal_timestamp("3/4/2024 2:05:09 PM").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(ts.time(), NaiveTime::from_hms_opt(14, 5, 9).unwrap());
    }

    #[test]
    fn timestamp_midnight_and_noon() {
        let midnight = parse_portal_timestamp("12/31/2023 12:00 AM").unwrap();
        assert_eq!(midnight.time(), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        let noon = parse_portal_timestamp("1/1/2024 12:30 pm").unwrap();
        assert_eq!(noon.time(), NaiveTime::from_hms_opt(12, 30, 0).unwrap());
    }

    #[test]
    fn timestamp_date_only() {
        let ts = parse_portal_timestamp("10/19/2026").unwrap();
        assert_eq!(ts.time(), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn timestamp_rejects_day_first_overflow() {
        assert!(parse_portal_timestamp("19/10/2026").is_none());
        assert!(parse_portal_timestamp("yesterday").is_none());
    }
}
