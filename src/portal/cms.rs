//! Course management system accessors
//!
//! Opening a course is an ASP.NET postback: the course list page is
//! loaded for its view state, then the row's button is posted back. The
//! CMS answers with either the course page or a redirect to it.

use super::{check_extraction, days, hours, Portal};
use crate::cache::{resource, Cache};
use crate::error::{PortalError, PortalResult};
use crate::extract::{
    extract_view_state, parse_cms_course_view, parse_cms_courses, CmsCourseRow, CmsCourseView,
};
use crate::proxy::RequestOptions;
use crate::store;
use std::collections::BTreeSet;
use tracing::{debug, warn};
use url::Url;

pub(super) fn seen_key() -> String {
    store::key(&["cms", "seen"])
}

impl Portal {
    /// Courses listed on the CMS home page
    pub async fn cms_courses(&self, refresh: bool) -> PortalResult<Vec<CmsCourseRow>> {
        self.require_login().await?;

        let key = Cache::key(resource::CMS_COURSES, &[]);
        let ttl = days(self.config.cache.cms_courses_ttl_days);
        let result = self
            .cache
            .cache_or_fetch(&key, ttl, refresh, || async {
                let page = self
                    .retry
                    .run("cms courses", || {
                        self.client.get(&self.config.portal.cms_courses_url)
                    })
                    .await?;
                let courses = parse_cms_courses(&page.body);
                check_extraction("CMS course list", &page.body, courses.is_empty());
                Ok(courses)
            })
            .await;
        self.audited(result).await
    }

    /// One course page, with `seen` flags from the local seen set
    pub async fn cms_course(
        &self,
        course_id: &str,
        season_id: &str,
        refresh: bool,
    ) -> PortalResult<CmsCourseView> {
        self.require_login().await?;

        let key = Cache::key(resource::CMS_COURSE, &[course_id, season_id]);
        let ttl = hours(self.config.cache.cms_course_ttl_hours);
        let result = self
            .cache
            .cache_or_fetch(&key, ttl, refresh, || {
                self.fetch_cms_course(course_id, season_id)
            })
            .await;
        let mut view = self.audited(result).await?;

        let seen = self.load_seen().await;
        for item in view.content_items_mut() {
            item.seen = seen.contains(&item.id);
        }
        Ok(view)
    }

    /// Remember that a content item was opened
    pub async fn mark_content_seen(&self, content_id: &str) -> PortalResult<()> {
        let mut seen = self.load_seen().await;
        if seen.insert(content_id.to_string()) {
            let raw = serde_json::to_string(&seen)?;
            self.store.set_item(&seen_key(), &raw).await?;
            debug!("Marked content {} as seen", content_id);
        }
        Ok(())
    }

    async fn load_seen(&self) -> BTreeSet<String> {
        match self.store.get_item(&seen_key()).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                debug!("Ignoring corrupt seen-content set: {}", e);
                BTreeSet::new()
            }),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!("Failed to read seen-content set: {}", e);
                BTreeSet::new()
            }
        }
    }

    async fn fetch_cms_course(&self, course_id: &str, season_id: &str) -> PortalResult<CmsCourseView> {
        let list_url = &self.config.portal.cms_courses_url;
        let page = self
            .retry
            .run("cms courses", || self.client.get(list_url))
            .await?;

        let row = parse_cms_courses(&page.body)
            .into_iter()
            .find(|row| row.matches(course_id, season_id))
            .ok_or_else(|| PortalError::CourseNotFound {
                course_id: course_id.to_string(),
                season_id: season_id.to_string(),
            })?;

        let view_state = extract_view_state(&page.body);
        if !view_state.is_complete() {
            return Err(PortalError::ViewStateMissing);
        }

        let mut fields = view_state.form_fields();
        fields.push(("__EVENTTARGET".to_string(), String::new()));
        fields.push(("__EVENTARGUMENT".to_string(), String::new()));
        fields.push((row.button_name, "View Course".to_string()));

        debug!("Opening course {} season {}", course_id, season_id);
        let posted = self
            .client
            .post_form(list_url, &fields, RequestOptions::default().allow_redirects())
            .await?;

        let body = if posted.is_redirect() {
            let location = posted.location().ok_or_else(|| {
                PortalError::MalformedResponse("redirect without a Location header".to_string())
            })?;
            let target = resolve_url(list_url, location)?;
            debug!("Following course redirect to {}", target);
            self.client.get(&target).await?.body
        } else {
            posted.body
        };

        let view = parse_cms_course_view(&body);
        check_extraction("CMS course", &body, view.weeks.is_empty() && view.header.is_empty());
        Ok(view)
    }
}

/// Resolve a `Location` value against the URL that produced it
pub fn resolve_url(base: &str, location: &str) -> PortalResult<String> {
    let base = Url::parse(base)
        .map_err(|e| PortalError::User(format!("invalid portal URL '{}': {}", base, e)))?;
    let target = base.join(location).map_err(|e| {
        PortalError::MalformedResponse(format!("unusable redirect '{}': {}", location, e))
    })?;
    Ok(target.into())
}

#[cfg(test)]
mod tests {
    use super::super::tests::logged_in;
    use super::*;
    use crate::proxy::ProxyReply;

    const LIST: &str = r#"<html><body><form>
        <input type="hidden" name="__VIEWSTATE" value="vs" />
        <input type="hidden" name="__VIEWSTATEGENERATOR" value="gen" />
        <input type="hidden" name="__EVENTVALIDATION" value="ev" />
        <table id="ContentPlaceHolderright_ContentPlaceHoldercontent_GridViewcourses">
            <tr>
                <td><input type="submit" name="ctl00$GridViewcourses$ctl02$btnViewCourse" value="View Course" /></td>
                <td>(|CSEN401|) Computer Programming Lab (432)</td>
                <td>Active</td><td>61</td><td>Winter 2024</td>
            </tr>
        </table></form></body></html>"#;

    const COURSE: &str = r#"<html><body>
        <span id="LabelCourseName">(|CSEN401|) Computer Programming Lab</span>
        <div class="weeksdata"><h2>Week 1</h2>
            <div class="card"><div id="content77"><strong>Lecture 1 (Lecture slides)</strong></div>
                <a href="/Uploads/l1.pdf">Download</a></div>
        </div></body></html>"#;

    #[test]
    fn resolve_absolute_and_relative_locations() {
        let base = "https://cms.example.edu/apps/student/ViewAllCourseStn?x=1";
        let resolve = |location: &str| resolve_url(base, location).unwrap();

        assert_eq!(resolve("https://other.test/a"), "https://other.test/a");
        assert_eq!(
            resolve("/apps/student/CourseViewStn?id=432"),
            "https://cms.example.edu/apps/student/CourseViewStn?id=432"
        );
        assert_eq!(
            resolve("CourseViewStn?id=432"),
            "https://cms.example.edu/apps/student/CourseViewStn?id=432"
        );
        assert_eq!(
            resolve("./CourseViewStn"),
            "https://cms.example.edu/apps/student/CourseViewStn"
        );
    }

    #[test]
    fn resolve_protocol_relative_and_parent_locations() {
        let base = "https://cms.example.edu/apps/student/ViewAllCourseStn?x=1";

        assert_eq!(
            resolve_url(base, "//files.example.edu/x").unwrap(),
            "https://files.example.edu/x"
        );
        assert_eq!(
            resolve_url(base, "../staff/Home").unwrap(),
            "https://cms.example.edu/apps/staff/Home"
        );
        assert!(resolve_url("not a url", "/x").is_err());
    }

    #[tokio::test]
    async fn course_view_follows_redirect() {
        let f = logged_in().await;
        f.transport.push(ProxyReply::new(200, LIST));
        f.transport
            .push(ProxyReply::new(302, "").with_header("Location", "/apps/student/CourseViewStn?id=432&sid=61"));
        f.transport.push(ProxyReply::new(200, COURSE));

        let view = f.portal.cms_course("432", "61", false).await.unwrap();

        assert_eq!(view.weeks[0].contents[0].id, "77");
        let sent = f.transport.sent();
        assert!(sent[1]
            .body
            .as_deref()
            .unwrap()
            .contains("ctl00%24GridViewcourses%24ctl02%24btnViewCourse=View%20Course"));
        assert_eq!(
            sent[2].url,
            "https://cms.example.edu/apps/student/CourseViewStn?id=432&sid=61"
        );
    }

    #[tokio::test]
    async fn course_view_accepts_direct_page() {
        let f = logged_in().await;
        f.transport.push(ProxyReply::new(200, LIST));
        f.transport.push(ProxyReply::new(200, COURSE));

        let view = f.portal.cms_course("432", "61", false).await.unwrap();
        assert_eq!(view.header, "(|CSEN401|) Computer Programming Lab");
        assert_eq!(f.transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn unknown_course_is_reported() {
        let f = logged_in().await;
        f.transport.push(ProxyReply::new(200, LIST));

        let err = f.portal.cms_course("999", "61", false).await.unwrap_err();
        assert!(matches!(err, PortalError::CourseNotFound { .. }));
    }

    #[tokio::test]
    async fn missing_view_state_refuses_to_post() {
        let f = logged_in().await;
        f.transport
            .push(ProxyReply::new(200, LIST.replace("__VIEWSTATEGENERATOR", "__GONE")));

        let err = f.portal.cms_course("432", "61", false).await.unwrap_err();

        assert!(matches!(err, PortalError::ViewStateMissing));
        assert_eq!(err.to_string(), "Failed to extract view state");
        assert_eq!(f.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn seen_flags_apply_to_cached_views() {
        let f = logged_in().await;
        f.transport.push(ProxyReply::new(200, LIST));
        f.transport.push(ProxyReply::new(200, COURSE));

        let first = f.portal.cms_course("432", "61", false).await.unwrap();
        assert!(!first.weeks[0].contents[0].seen);

        f.portal.mark_content_seen("77").await.unwrap();
        let second = f.portal.cms_course("432", "61", false).await.unwrap();

        assert!(second.weeks[0].contents[0].seen);
        assert_eq!(f.transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn course_list_is_cached() {
        let f = logged_in().await;
        f.transport.push(ProxyReply::new(200, LIST));

        let courses = f.portal.cms_courses(false).await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(f.portal.cms_courses(false).await.unwrap(), courses);
        assert_eq!(f.transport.sent().len(), 1);
    }
}
