//! Sync command - refresh the resources worth polling
//!
//! Exams, the CMS course list and notifications are fetched in turn,
//! bypassing the cache. A failure does not stop the remaining
//! resources; the first error is returned once all have run.

use super::print_json;
use crate::cli::args::OutputFormat;
use crate::error::{PortalError, PortalResult};
use crate::portal::Portal;
use crate::ui::{self, SyncProgress, UiContext};
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
enum Step {
    Exams,
    CmsCourses,
    Notifications,
}

impl Step {
    const ALL: [Step; 3] = [Step::Exams, Step::CmsCourses, Step::Notifications];

    fn label(self) -> &'static str {
        match self {
            Step::Exams => "exams",
            Step::CmsCourses => "cms courses",
            Step::Notifications => "notifications",
        }
    }

    async fn run(self, portal: &Portal) -> PortalResult<String> {
        match self {
            Step::Exams => Ok(format!("{} exams", portal.exam_seats(true).await?.len())),
            Step::CmsCourses => Ok(format!("{} courses", portal.cms_courses(true).await?.len())),
            Step::Notifications => Ok(format!(
                "{} new notifications",
                portal.sync_notifications().await?.len()
            )),
        }
    }
}

#[derive(Debug, Serialize)]
struct Outcome {
    resource: &'static str,
    ok: bool,
    detail: String,
}

/// Execute the sync command
pub async fn execute(portal: &Portal, format: OutputFormat) -> PortalResult<()> {
    if !portal.status().await.logged_in {
        return Err(PortalError::NotLoggedIn);
    }

    let ctx = UiContext::detect();
    let mut progress =
        (format == OutputFormat::Table).then(|| SyncProgress::new(&ctx, Step::ALL.len()));
    let mut outcomes = Vec::new();
    let mut first_error = None;

    portal.notifications().restore().await?;

    for step in Step::ALL {
        let resource = step.label();
        if let Some(p) = &progress {
            p.begin(resource);
        }

        match step.run(portal).await {
            Ok(detail) => {
                if let Some(p) = progress.as_mut() {
                    p.finish_one(resource, &detail);
                }
                outcomes.push(Outcome {
                    resource,
                    ok: true,
                    detail,
                });
            }
            Err(e) => {
                if let Some(p) = progress.as_mut() {
                    p.fail_one(resource, &e.to_string());
                }
                outcomes.push(Outcome {
                    resource,
                    ok: false,
                    detail: e.to_string(),
                });
                // Every later step would fail the same way
                let stop = e.requires_login();
                first_error.get_or_insert(e);
                if stop {
                    break;
                }
            }
        }
    }
    if let Some(p) = &progress {
        p.finish();
    }

    match format {
        OutputFormat::Json => print_json(&outcomes)?,
        OutputFormat::Plain => {
            for o in &outcomes {
                let status = if o.ok { "ok" } else { "failed" };
                println!("{}\t{}\t{}", o.resource, status, o.detail);
            }
        }
        OutputFormat::Table if first_error.is_none() => ui::outro_success(&ctx, "Sync complete"),
        OutputFormat::Table => {}
    }

    first_error.map_or(Ok(()), Err)
}
