//! Transcript, study years and exam seats

use super::{audit_expiry, check_extraction, hours, Portal};
use crate::cache::{resource, Cache, Revalidation};
use crate::error::{PortalError, PortalResult};
use crate::extract::{
    extract_study_years, extract_view_state, parse_exam_seats, parse_transcript, ExamSeat,
    StudyYears, TranscriptData,
};
use crate::proxy::{ProxyClient, RequestOptions, RetryPolicy};
use tokio::sync::mpsc;
use tracing::debug;

impl Portal {
    /// Transcript for one study year, stale-while-revalidate
    ///
    /// The receiver yields the cached transcript first when one exists,
    /// then the freshly fetched one or the fetch error.
    pub async fn transcript(
        &self,
        year: &str,
    ) -> PortalResult<mpsc::Receiver<Revalidation<TranscriptData>>> {
        self.require_login().await?;

        let key = Cache::key(resource::TRANSCRIPT, &[year]);
        let client = self.client.clone();
        let retry = self.retry;
        let url = self.config.portal.transcript_url.clone();
        let year = year.to_string();
        let audit = self.audit.clone();

        let fetch = async move {
            let result = fetch_transcript(&client, retry, &url, &year).await;
            audit_expiry(&audit, result).await
        };

        Ok(self
            .cache
            .stale_while_revalidate(key, hours(self.config.cache.transcript_ttl_hours), fetch))
    }

    /// Study years offered by the transcript page
    pub async fn study_years(&self, refresh: bool) -> PortalResult<StudyYears> {
        self.require_login().await?;

        let key = Cache::key(resource::STUDY_YEARS, &[]);
        let ttl = hours(self.config.cache.transcript_ttl_hours);
        let result = self
            .cache
            .cache_or_fetch(&key, ttl, refresh, || async {
                let page = self
                    .retry
                    .run("transcript", || {
                        self.client.get(&self.config.portal.transcript_url)
                    })
                    .await?;
                extract_study_years(&page.body).ok_or_else(|| {
                    PortalError::MalformedResponse(
                        "transcript page has no study year list".to_string(),
                    )
                })
            })
            .await;
        self.audited(result).await
    }

    /// Exam seat assignments
    pub async fn exam_seats(&self, refresh: bool) -> PortalResult<Vec<ExamSeat>> {
        self.require_login().await?;

        let key = Cache::key(resource::EXAM_SEATS, &[]);
        let ttl = hours(self.config.cache.exam_seats_ttl_hours);
        let result = self
            .cache
            .cache_or_fetch(&key, ttl, refresh, || async {
                let page = self
                    .retry
                    .run("exam seats", || {
                        self.client.get(&self.config.portal.exam_seats_url)
                    })
                    .await?;
                let seats = parse_exam_seats(&page.body);
                check_extraction("Exam seats", &page.body, seats.is_empty());
                Ok(seats)
            })
            .await;
        self.audited(result).await
    }
}

/// Load the transcript page, then post back the year selection
async fn fetch_transcript(
    client: &ProxyClient,
    retry: RetryPolicy,
    url: &str,
    year: &str,
) -> PortalResult<TranscriptData> {
    let page = retry.run("transcript", || client.get(url)).await?;

    let years = extract_study_years(&page.body).ok_or_else(|| {
        PortalError::MalformedResponse("transcript page has no study year list".to_string())
    })?;
    if !years.years.iter().any(|y| y == year) {
        return Err(PortalError::User(format!(
            "Unknown study year '{}'; available: {}",
            year,
            years.years.join(", ")
        )));
    }

    let view_state = extract_view_state(&page.body);
    if !view_state.is_complete() {
        return Err(PortalError::ViewStateMissing);
    }

    let mut fields = view_state.form_fields();
    fields.push(("__EVENTTARGET".to_string(), years.field_name.clone()));
    fields.push(("__EVENTARGUMENT".to_string(), String::new()));
    fields.push((years.field_name, year.to_string()));

    debug!("Posting transcript year {}", year);
    let result = retry
        .run("transcript postback", || {
            client.post_form(url, &fields, RequestOptions::default())
        })
        .await?;

    let transcript = parse_transcript(&result.body);
    check_extraction("Transcript", &result.body, transcript.semesters.is_empty());
    Ok(transcript)
}
