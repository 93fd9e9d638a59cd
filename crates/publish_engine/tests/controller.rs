use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use publish_core::{
    LatestPublishRecord, PageMeta, ProjectSummary, PublishHistoryEntry, PublishSnapshot,
    PublishStatus, SessionPhase, SessionSettings, StatusSnapshot,
};
use publish_engine::{ApiError, ApiErrorKind, ManualScheduler, PublishApi, PublishController};
use pretty_assertions::assert_eq;
use tokio::sync::Notify;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(publish_logging::initialize_for_tests);
}

#[derive(Default)]
struct FakeApi {
    create: Mutex<Option<Result<PublishSnapshot, ApiError>>>,
    statuses: Mutex<VecDeque<Result<StatusSnapshot, ApiError>>>,
    latest: Mutex<Option<LatestPublishRecord>>,
    set_latest_result: Mutex<Option<ApiError>>,
    status_gate: Option<Arc<Notify>>,
    create_calls: AtomicUsize,
    status_calls: AtomicUsize,
    set_latest_calls: Mutex<Vec<String>>,
    project_calls: AtomicUsize,
}

impl FakeApi {
    fn with_create(self, result: Result<PublishSnapshot, ApiError>) -> Self {
        *self.create.lock().unwrap() = Some(result);
        self
    }

    fn with_statuses(self, statuses: Vec<PublishStatus>) -> Self {
        *self.statuses.lock().unwrap() = statuses
            .into_iter()
            .map(|status| {
                Ok(StatusSnapshot {
                    status,
                    url: Some("https://cdn.example.com/publish-1/index.html".to_string()),
                    error_message: None,
                })
            })
            .collect();
        self
    }

    fn with_latest(self, record: LatestPublishRecord) -> Self {
        *self.latest.lock().unwrap() = Some(record);
        self
    }

    fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PublishApi for FakeApi {
    async fn create_publish(&self, _project_id: &str) -> Result<PublishSnapshot, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.create
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(snapshot(PublishStatus::Publishing)))
    }

    async fn get_publish_status(
        &self,
        _project_id: &str,
        _publish_id: &str,
    ) -> Result<StatusSnapshot, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.status_gate {
            gate.notified().await;
        }
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected status request")
    }

    async fn get_latest_publish(
        &self,
        _project_id: &str,
    ) -> Result<Option<LatestPublishRecord>, ApiError> {
        Ok(self.latest.lock().unwrap().clone())
    }

    async fn set_latest_publish(&self, _project_id: &str, publish_id: &str) -> Result<(), ApiError> {
        self.set_latest_calls
            .lock()
            .unwrap()
            .push(publish_id.to_string());
        match self.set_latest_result.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn list_publish_history(
        &self,
        _project_id: &str,
        _limit: usize,
    ) -> Result<Vec<PublishHistoryEntry>, ApiError> {
        Ok(vec![entry("publish-1"), entry("publish-0")])
    }

    async fn list_pages(&self, _project_id: &str) -> Result<Vec<PageMeta>, ApiError> {
        Ok(Vec::new())
    }

    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, ApiError> {
        self.project_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![ProjectSummary {
            id: "project-1".to_string(),
            name: "Bakery".to_string(),
            latest_publish_id: Some("publish-0".to_string()),
        }])
    }
}

fn snapshot(status: PublishStatus) -> PublishSnapshot {
    PublishSnapshot {
        publish_id: "publish-1".to_string(),
        status,
        url: None,
        error_message: None,
    }
}

fn entry(publish_id: &str) -> PublishHistoryEntry {
    PublishHistoryEntry {
        publish_id: publish_id.to_string(),
        status: PublishStatus::Live,
        created_at: "2026-03-01T00:00:00Z".to_string(),
        base_url: format!("https://cdn.example.com/{publish_id}"),
    }
}

fn latest(publish_id: &str) -> LatestPublishRecord {
    LatestPublishRecord {
        publish_id: publish_id.to_string(),
        status: PublishStatus::Live,
        url: Some(format!("https://cdn.example.com/{publish_id}/index.html")),
        error_message: None,
        published_at: Some("2026-03-01T00:00:00Z".to_string()),
    }
}

fn controller(api: Arc<FakeApi>, scheduler: Arc<ManualScheduler>) -> PublishController {
    PublishController::new(api, scheduler, SessionSettings::default())
}

#[tokio::test]
async fn polling_stops_after_three_status_requests() {
    init_logging();
    let api = Arc::new(FakeApi::default().with_statuses(vec![
        PublishStatus::Publishing,
        PublishStatus::Publishing,
        PublishStatus::Live,
    ]));
    let scheduler = Arc::new(ManualScheduler::new());
    let mut controller = controller(api.clone(), scheduler.clone());

    controller.select_project(Some("project-1".to_string()));
    controller.settle().await;
    controller.start();
    controller.settle().await;
    assert_eq!(controller.view().phase, SessionPhase::Publishing);
    assert_eq!(scheduler.interval(), Some(Duration::from_millis(2000)));

    let mut ticks = 0;
    while scheduler.fire() {
        ticks += 1;
        controller.settle().await;
        assert!(ticks <= 10, "polling never stopped");
    }

    assert_eq!(api.status_calls(), 3);
    assert_eq!(controller.view().phase, SessionPhase::Live);
    assert!(!scheduler.is_running());
    assert_eq!(controller.in_flight(), 0);
    assert_eq!(controller.view().history.len(), 2);
}

#[tokio::test]
async fn reply_in_flight_during_project_switch_is_discarded() {
    init_logging();
    let gate = Arc::new(Notify::new());
    let api = Arc::new(FakeApi {
        status_gate: Some(gate.clone()),
        ..FakeApi::default().with_statuses(vec![PublishStatus::Live])
    });
    let scheduler = Arc::new(ManualScheduler::new());
    let mut controller = controller(api.clone(), scheduler.clone());

    controller.select_project(Some("project-1".to_string()));
    controller.settle().await;
    controller.start();
    controller.settle().await;

    assert!(scheduler.fire());
    controller.drain();
    assert_eq!(controller.in_flight(), 1);

    controller.select_project(Some("project-2".to_string()));
    assert!(!scheduler.is_running());
    gate.notify_one();
    controller.settle().await;

    let view = controller.view();
    assert_eq!(view.project_id.as_deref(), Some("project-2"));
    assert_eq!(view.phase, SessionPhase::NoSession);
    assert_eq!(view.publish_id, None);
    assert_eq!(api.status_calls(), 1);
}

#[tokio::test]
async fn preflight_failure_keeps_live_session() {
    init_logging();
    let api = Arc::new(
        FakeApi::default()
            .with_latest(latest("publish-0"))
            .with_create(Err(ApiError {
                kind: ApiErrorKind::PreflightFailed {
                    details: vec!["Home page is missing".to_string()],
                },
                message: "Cannot publish".to_string(),
            })),
    );
    let scheduler = Arc::new(ManualScheduler::new());
    let mut controller = controller(api.clone(), scheduler.clone());

    controller.select_project(Some("project-1".to_string()));
    controller.settle().await;
    assert_eq!(controller.view().phase, SessionPhase::Live);

    controller.start();
    controller.settle().await;

    let view = controller.view();
    assert_eq!(view.phase, SessionPhase::Live);
    assert_eq!(view.publish_id.as_deref(), Some("publish-0"));
    assert_eq!(view.preflight_details, vec!["Home page is missing".to_string()]);
    assert!(!scheduler.is_running());
}

#[tokio::test]
async fn start_failure_surfaces_server_message() {
    init_logging();
    let api = Arc::new(FakeApi::default().with_create(Err(ApiError {
        kind: ApiErrorKind::HttpStatus(503),
        message: String::new(),
    })));
    let mut controller = controller(api, Arc::new(ManualScheduler::new()));

    controller.select_project(Some("project-1".to_string()));
    controller.settle().await;
    controller.start();
    controller.settle().await;

    let view = controller.view();
    assert_eq!(view.phase, SessionPhase::Failed);
    assert_eq!(view.error_message.as_deref(), Some("http status 503"));
}

#[tokio::test]
async fn make_live_on_latest_makes_no_request() {
    init_logging();
    let api = Arc::new(FakeApi::default().with_latest(latest("publish-1")));
    let mut controller = controller(api.clone(), Arc::new(ManualScheduler::new()));

    controller.select_project(Some("project-1".to_string()));
    controller.settle().await;
    let before = controller.view();

    controller.make_live(entry("publish-1"));
    assert_eq!(controller.in_flight(), 0);
    controller.settle().await;

    assert!(api.set_latest_calls.lock().unwrap().is_empty());
    assert_eq!(controller.view(), before);
}

#[tokio::test]
async fn make_live_promotes_and_refreshes_projects() {
    init_logging();
    let api = Arc::new(FakeApi::default().with_latest(latest("publish-1")));
    let mut controller = controller(api.clone(), Arc::new(ManualScheduler::new()));

    controller.select_project(Some("project-1".to_string()));
    controller.settle().await;
    controller.make_live(entry("publish-0"));
    controller.settle().await;

    assert_eq!(
        *api.set_latest_calls.lock().unwrap(),
        vec!["publish-0".to_string()]
    );
    assert_eq!(api.project_calls.load(Ordering::SeqCst), 1);
    assert_eq!(controller.view().projects.len(), 1);
}

#[tokio::test]
async fn make_live_failure_is_reported_without_touching_session() {
    init_logging();
    let api = FakeApi::default().with_latest(latest("publish-1"));
    *api.set_latest_result.lock().unwrap() = Some(ApiError {
        kind: ApiErrorKind::Transport,
        message: String::new(),
    });
    let api = Arc::new(api);
    let mut controller = controller(api.clone(), Arc::new(ManualScheduler::new()));

    controller.select_project(Some("project-1".to_string()));
    controller.settle().await;
    let session_before = controller.state().session().clone();

    controller.make_live(entry("publish-0"));
    controller.settle().await;

    assert_eq!(controller.state().session(), &session_before);
    assert_eq!(controller.view().last_error.as_deref(), Some("network error"));
    assert_eq!(api.project_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn teardown_stops_polling() {
    init_logging();
    let api = Arc::new(FakeApi::default());
    let scheduler = Arc::new(ManualScheduler::new());
    let mut controller = controller(api.clone(), scheduler.clone());

    controller.select_project(Some("project-1".to_string()));
    controller.settle().await;
    controller.start();
    controller.settle().await;
    assert!(scheduler.is_running());

    controller.teardown();
    assert!(!scheduler.is_running());
    assert_eq!(controller.view().project_id, None);
    assert_eq!(api.status_calls(), 0);
}

#[tokio::test]
async fn refresh_picks_up_promotion_made_elsewhere() {
    init_logging();
    let api = Arc::new(FakeApi::default().with_latest(latest("publish-0")));
    let mut controller = controller(api.clone(), Arc::new(ManualScheduler::new()));

    controller.select_project(Some("project-1".to_string()));
    controller.settle().await;
    assert_eq!(controller.view().publish_id.as_deref(), Some("publish-0"));

    *api.latest.lock().unwrap() = Some(latest("publish-1"));
    controller.refresh();
    assert_eq!(controller.in_flight(), 3);
    controller.settle().await;

    let view = controller.view();
    assert_eq!(view.phase, SessionPhase::Live);
    assert_eq!(view.publish_id.as_deref(), Some("publish-1"));
    assert_eq!(
        view.latest.map(|record| record.publish_id),
        Some("publish-1".to_string())
    );
}
