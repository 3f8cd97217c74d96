//! ASP.NET view state tokens

use super::selector;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static VIEW_STATE: LazyLock<Selector> = LazyLock::new(|| selector("input[name='__VIEWSTATE']"));
static GENERATOR: LazyLock<Selector> =
    LazyLock::new(|| selector("input[name='__VIEWSTATEGENERATOR']"));
static EVENT_VALIDATION: LazyLock<Selector> =
    LazyLock::new(|| selector("input[name='__EVENTVALIDATION']"));

/// Hidden postback fields that must be echoed back on the next form post
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub view_state: String,
    pub view_state_generator: String,
    pub event_validation: String,
}

impl ViewState {
    /// Whether all three tokens were found
    pub fn is_complete(&self) -> bool {
        !self.view_state.is_empty()
            && !self.view_state_generator.is_empty()
            && !self.event_validation.is_empty()
    }

    /// Form fields to include in a postback
    pub fn form_fields(&self) -> Vec<(String, String)> {
        vec![
            ("__VIEWSTATE".to_string(), self.view_state.clone()),
            (
                "__VIEWSTATEGENERATOR".to_string(),
                self.view_state_generator.clone(),
            ),
            ("__EVENTVALIDATION".to_string(), self.event_validation.clone()),
        ]
    }
}

/// Extract the view state tokens from a page, empty strings when missing
pub fn extract_view_state(html: &str) -> ViewState {
    let document = Html::parse_document(html);
    let value_of = |sel: &Selector| {
        document
            .select(sel)
            .next()
            .and_then(|input| input.value().attr("value"))
            .unwrap_or_default()
            .to_string()
    };

    ViewState {
        view_state: value_of(&VIEW_STATE),
        view_state_generator: value_of(&GENERATOR),
        event_validation: value_of(&EVENT_VALIDATION),
    }
}
