//! HTML extraction layer
//!
//! One pure function per portal resource, turning a page into typed
//! records. Extractors never fail: a page whose outer container is
//! missing yields the empty value, and a row missing a required field is
//! dropped while its siblings survive. Callers decide whether an empty
//! result means "no data" or "the page changed shape".
//!
//! Fields are located with CSS selectors on `id` substrings and fixed
//! class names, so markup reordering between portal versions does not
//! shift values between fields.

pub mod cms;
pub mod dates;
pub mod exam_seats;
pub mod notifications;
pub mod text;
pub mod transcript;
pub mod viewstate;

pub use cms::{
    parse_cms_course_view, parse_cms_courses, CmsContentItem, CmsCourseRow, CmsCourseView,
    CmsWeek,
};
pub use exam_seats::{parse_exam_seats, ExamSeat};
pub use notifications::{parse_notifications, Notification};
pub use text::clean_html;
pub use transcript::{
    extract_study_years, parse_transcript, Course, Semester, StudentInfo, StudyYears,
    TranscriptData,
};
pub use viewstate::{extract_view_state, ViewState};

use scraper::{ElementRef, Html, Selector};

/// Compile a selector literal
///
/// Only called with constant selector strings, so a parse failure is a
/// programming error.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {:?}: {:?}", css, e))
}

/// Normalized text of the first match under `scope`, empty when absent
pub(crate) fn text_in(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(text::element_text)
        .unwrap_or_default()
}

/// Normalized text of the first match in a document, empty when absent
pub(crate) fn text_in_document(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .next()
        .map(text::element_text)
        .unwrap_or_default()
}

/// Non-empty normalized text of the first match under `scope`
pub(crate) fn required_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    Some(text_in(scope, selector)).filter(|t| !t.is_empty())
}

/// Extract the portal user id from the home page
///
/// The id is rendered in a label whose `id` contains `UserId` or
/// `AppNo` depending on the portal version.
pub fn extract_user_id(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let labels = selector("[id*='UserId'], [id*='AppNo']");
    document
        .select(&labels)
        .map(|el| {
            el.value()
                .attr("value")
                .map(text::collapse_whitespace)
                .unwrap_or_else(|| text::element_text(el))
        })
        .find(|id| !id.is_empty())
}
