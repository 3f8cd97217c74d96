//! CLI command implementations
//!
//! Every command renders its result as a table for people, JSON for
//! scripts, or plain lines for shell pipelines.

pub mod cache;
pub mod cms;
pub mod config;
pub mod exams;
pub mod login;
pub mod notifications;
pub mod status;
pub mod sync;
pub mod transcript;
pub mod years;

pub use cache::execute as cache;
pub use cms::execute as cms;
pub use config::execute as config;
pub use exams::execute as exams;
pub use login::{execute as login, logout};
pub use notifications::execute as notifications;
pub use status::execute as status;
pub use sync::execute as sync;
pub use transcript::execute as transcript;
pub use years::execute as years;

use crate::cli::args::OutputFormat;
use crate::error::PortalResult;
use crate::ui::{TaskSpinner, UiContext};
use serde::Serialize;
use std::future::Future;

fn print_json<T: Serialize + ?Sized>(value: &T) -> PortalResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Await `task` under a spinner; only table output shows one
async fn spin<T, Fut>(
    ctx: &UiContext,
    format: OutputFormat,
    message: &str,
    task: Fut,
    done: impl FnOnce(&T) -> String,
) -> PortalResult<T>
where
    Fut: Future<Output = PortalResult<T>>,
{
    if format != OutputFormat::Table {
        return task.await;
    }

    let mut spinner = TaskSpinner::new(ctx);
    spinner.start(message);
    match task.await {
        Ok(value) => {
            spinner.stop(&done(&value));
            Ok(value)
        }
        Err(e) => {
            spinner.stop_error(&e.to_string());
            Err(e)
        }
    }
}
