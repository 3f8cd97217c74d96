//! Terminal output for the `portalsync` front end
//!
//! Uses `cliclack` for prompts and spinners with an automatic plain
//! fallback in CI and when output is piped.
//!
//! ```rust,ignore
//! use portalsync::ui::{self, TaskSpinner, UiContext};
//!
//! let ctx = UiContext::detect();
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Fetching exam seats...");
//! let seats = portal.exam_seats(false).await?;
//! spinner.stop(&format!("{} exams", seats.len()));
//! ```

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    intro, key_value, key_value_status, note, outro_success, remark, section, step_info, step_ok,
    step_ok_detail, step_warn_hint, table,
};
pub use progress::{SyncProgress, TaskSpinner};
pub use prompts::{confirm, input, password};
