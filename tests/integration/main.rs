//! Integration tests for portalsync

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Binary isolated from the user's config and state
    fn portalsync(dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("portalsync");
        cmd.env("PORTALSYNC_CONFIG", dir.path().join("config.toml"))
            .env("PORTALSYNC_STATE_DIR", dir.path().join("state"))
            .env_remove("PORTALSYNC_USERNAME");
        cmd
    }

    #[test]
    fn help_displays() {
        let dir = TempDir::new().unwrap();
        portalsync(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("university portal"));
    }

    #[test]
    fn version_displays() {
        let dir = TempDir::new().unwrap();
        portalsync(&dir)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("portalsync"));
    }

    #[test]
    fn config_path_honours_env() {
        let dir = TempDir::new().unwrap();
        portalsync(&dir)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_set_then_show() {
        let dir = TempDir::new().unwrap();
        portalsync(&dir)
            .args(["config", "set", "proxy.url", "https://proxy.example.edu/fetch"])
            .assert()
            .success();
        portalsync(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("https://proxy.example.edu/fetch"));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let dir = TempDir::new().unwrap();
        portalsync(&dir)
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn status_without_session() {
        let dir = TempDir::new().unwrap();
        portalsync(&dir)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("not logged in"));
    }

    #[test]
    fn status_json() {
        let dir = TempDir::new().unwrap();
        portalsync(&dir)
            .args(["status", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"loggedIn\": false"));
    }

    #[test]
    fn exams_require_login() {
        let dir = TempDir::new().unwrap();
        portalsync(&dir)
            .arg("exams")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not logged in"))
            .stderr(predicate::str::contains("portalsync login"));
    }

    #[test]
    fn login_without_terminal_needs_stdin_flag() {
        let dir = TempDir::new().unwrap();
        portalsync(&dir)
            .args(["login", "--username", "jane.doe"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--password-stdin"));
    }

    #[test]
    fn cache_clear_on_empty_state() {
        let dir = TempDir::new().unwrap();
        portalsync(&dir)
            .args(["cache", "clear", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff("0\n"));
    }

    #[test]
    fn notifications_list_offline() {
        let dir = TempDir::new().unwrap();
        portalsync(&dir)
            .args(["notifications", "list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"unreadCount\": 0"));
    }
}

mod engine_tests {
    use async_trait::async_trait;
    use chrono::Duration;
    use portalsync::audit::AuditLog;
    use portalsync::cache::{resource, settle, Cache, Revalidation};
    use portalsync::config::Config;
    use portalsync::extract::TranscriptData;
    use portalsync::notify::{NotificationContent, NotificationScheduler};
    use portalsync::portal::PortalParts;
    use portalsync::proxy::{ProxyEnvelope, ProxyReply, ProxyTransport};
    use portalsync::store::MemoryStore;
    use portalsync::{Portal, PortalError, PortalResult};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Answers proxy requests from a queue, optionally after a delay
    #[derive(Default)]
    struct MockProxy {
        replies: Mutex<VecDeque<ProxyReply>>,
        sent: Mutex<Vec<ProxyEnvelope>>,
        delay: Option<std::time::Duration>,
    }

    impl MockProxy {
        fn reply(&self, status: u16, body: &str) {
            self.replies
                .lock()
                .unwrap()
                .push_back(ProxyReply::new(status, body));
        }

        fn sent(&self) -> Vec<ProxyEnvelope> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProxyTransport for MockProxy {
        async fn send(&self, envelope: &ProxyEnvelope) -> PortalResult<ProxyReply> {
            self.sent.lock().unwrap().push(envelope.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| PortalError::Transport("no reply queued".to_string()))
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<NotificationContent>>);

    #[async_trait]
    impl NotificationScheduler for Recorder {
        async fn schedule(&self, content: NotificationContent) {
            self.0.lock().unwrap().push(content);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    impl Recorder {
        fn titles(&self) -> Vec<String> {
            self.0.lock().unwrap().iter().map(|c| c.title.clone()).collect()
        }
    }

    async fn open(proxy: Arc<MockProxy>, scheduler: Arc<Recorder>) -> Portal {
        let mut config = Config::default();
        config.proxy.max_retries = 0;
        let portal = Portal::open(
            config,
            PortalParts {
                store: Arc::new(MemoryStore::new()),
                transport: proxy,
                scheduler,
                audit: AuditLog::disabled(),
            },
        )
        .await
        .unwrap();
        portal
            .session()
            .store_credentials("jane.doe", "hunter2")
            .await
            .unwrap();
        portal
    }

    fn notification_row(i: usize, title: &str) -> String {
        format!(
            r#"<tr>
                <td><span id="ContentPlaceHolder1_NotificationsGrid_lblTitle_{i}">{title}</span></td>
                <td><span id="ContentPlaceHolder1_NotificationsGrid_lblDate_{i}">3/4/2024 9:00 AM</span></td>
                <td><span id="ContentPlaceHolder1_NotificationsGrid_lblStaff_{i}">Dr. Smith</span></td>
                <td><span id="ContentPlaceHolder1_NotificationsGrid_lblImportance_{i}">Normal</span></td>
                <td><div id="ContentPlaceHolder1_NotificationsGrid_lblBody_{i}">{title} details</div></td>
            </tr>"#
        )
    }

    fn notification_page(titles: &[&str]) -> String {
        let rows: Vec<String> = titles
            .iter()
            .enumerate()
            .map(|(i, t)| notification_row(i, t))
            .collect();
        format!(
            r#"<html><body><table id="ContentPlaceHolder1_NotificationsGrid">{}</table></body></html>"#,
            rows.join("")
        )
    }

    #[tokio::test]
    async fn unauthorized_response_clears_session() {
        let proxy = Arc::new(MockProxy::default());
        let portal = open(proxy.clone(), Arc::new(Recorder::default())).await;
        portal
            .session()
            .set_cookie("ASP.NET_SessionId=abc")
            .await
            .unwrap();
        proxy.reply(401, "");

        let err = portal.exam_seats(false).await.unwrap_err();

        assert!(matches!(err, PortalError::SessionExpired));
        let session = portal.session().snapshot().await;
        assert!(session.session_cookie.is_none());
        assert!(session.credentials().is_none());
        assert_eq!(proxy.sent()[0].cookies, "ASP.NET_SessionId=abc");
    }

    #[tokio::test]
    async fn transcript_yields_cached_then_fresh() {
        let proxy = Arc::new(MockProxy {
            delay: Some(std::time::Duration::from_millis(50)),
            ..Default::default()
        });
        let portal = open(proxy.clone(), Arc::new(Recorder::default())).await;

        let key = Cache::key(resource::TRANSCRIPT, &["2023-2024"]);
        let cached = TranscriptData {
            cumulative_gpa: "2.7".to_string(),
            ..Default::default()
        };
        portal
            .cache()
            .write(&key, &cached, Duration::hours(1))
            .await
            .unwrap();

        proxy.reply(
            200,
            r#"<form>
                <input type="hidden" name="__VIEWSTATE" value="vs" />
                <input type="hidden" name="__VIEWSTATEGENERATOR" value="gen" />
                <input type="hidden" name="__EVENTVALIDATION" value="ev" />
                <select name="ctl00$ContentPlaceHolder1$stdYrLst" id="ContentPlaceHolder1_stdYrLst">
                    <option value="2023-2024">2023-2024</option>
                </select></form>"#,
        );
        proxy.reply(
            200,
            r#"<span id="ContentPlaceHolder1_cmGpaLbl">1.9</span>"#,
        );

        let mut rx = portal.transcript("2023-2024").await.unwrap();
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(rx.recv().await.is_none());

        match (first, second) {
            (Revalidation::Cached(old), Revalidation::Fresh(_)) => {
                assert_eq!(old.cumulative_gpa, "2.7");
            }
            (first, second) => panic!("unexpected order: {:?}, {:?}", first, second),
        }
        assert_eq!(proxy.sent().len(), 2);
    }

    #[tokio::test]
    async fn transcript_failure_keeps_cached_value() {
        let proxy = Arc::new(MockProxy {
            delay: Some(std::time::Duration::from_millis(50)),
            ..Default::default()
        });
        let portal = open(proxy.clone(), Arc::new(Recorder::default())).await;
        let key = Cache::key(resource::TRANSCRIPT, &["2023-2024"]);
        portal
            .cache()
            .write(&key, &TranscriptData::default(), Duration::hours(1))
            .await
            .unwrap();
        proxy.reply(503, "");

        let settled = settle(portal.transcript("2023-2024").await.unwrap())
            .await
            .unwrap();

        assert!(settled.stale);
        assert!(matches!(
            settled.error,
            Some(PortalError::RequestFailed { status: 503 })
        ));
    }

    #[tokio::test]
    async fn notification_delta_dispatches_only_new_items() {
        let proxy = Arc::new(MockProxy::default());
        let scheduler = Arc::new(Recorder::default());
        let portal = open(proxy.clone(), scheduler.clone()).await;

        proxy.reply(200, &notification_page(&["Midterm moved", "Lab cancelled"]));
        let first = portal.sync_notifications().await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(scheduler.titles(), vec!["Midterm moved", "Lab cancelled"]);

        let center = portal.notifications();
        let midterm = center.state().notifications[0].id.clone();
        center.mark_as_read(&midterm).await.unwrap();
        assert_eq!(center.state().unread_count, 1);

        proxy.reply(
            200,
            &notification_page(&["Quiz posted", "Midterm moved", "Lab cancelled"]),
        );
        let second = portal.sync_notifications().await.unwrap();

        assert_eq!(second.len(), 1);
        assert_eq!(second[0].title, "Quiz posted");
        assert_eq!(scheduler.titles().len(), 3);

        let state = center.state();
        assert_eq!(state.notifications.len(), 3);
        assert!(state.notifications[1].is_read);
        assert_eq!(state.unread_count, 2);

        center.mark_all_as_read().await.unwrap();
        center.mark_all_as_read().await.unwrap();
        assert_eq!(center.state().unread_count, 0);
    }

    #[tokio::test]
    async fn logout_is_a_barrier() {
        let proxy = Arc::new(MockProxy::default());
        let portal = open(proxy.clone(), Arc::new(Recorder::default())).await;
        proxy.reply(200, &notification_page(&["Midterm moved"]));
        portal.sync_notifications().await.unwrap();

        portal.logout().await.unwrap();

        assert!(!portal.status().await.logged_in);
        assert!(portal.notifications().state().notifications.is_empty());
        let err = portal.cms_courses(false).await.unwrap_err();
        assert!(matches!(err, PortalError::NotLoggedIn));
    }
}
