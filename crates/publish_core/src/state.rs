use std::time::Duration;

use crate::staleness::has_unpublished_changes;
use crate::view_model::{PublishViewModel, SessionPhase};
use crate::{
    Epoch, LatestPublishRecord, PageMeta, ProjectSummary, PublishHistoryEntry, PublishSession,
    PublishSnapshot, PublishStatus, StatusSnapshot,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_HISTORY_LIMIT: usize = 20;
/// Shown when the server reports a failure without a message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Publish failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub poll_interval: Duration,
    pub history_limit: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublishState {
    settings: SessionSettings,
    project_id: Option<String>,
    epoch: Epoch,
    session: PublishSession,
    starting: bool,
    poll_in_flight: bool,
    promoting: Option<String>,
    preflight_details: Vec<String>,
    last_error: Option<String>,
    latest: Option<LatestPublishRecord>,
    history: Vec<PublishHistoryEntry>,
    pages: Vec<PageMeta>,
    projects: Vec<ProjectSummary>,
    dirty: bool,
}

impl PublishState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: SessionSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn view(&self) -> PublishViewModel {
        PublishViewModel {
            project_id: self.project_id.clone(),
            phase: self.phase(),
            publish_id: self.session.publish_id.clone(),
            status: self.session.status,
            url: self.session.url.clone(),
            error_message: self.session.error_message.clone(),
            preflight_details: self.preflight_details.clone(),
            last_error: self.last_error.clone(),
            latest: self.latest.clone(),
            history: self.history.clone(),
            pages: self.pages.clone(),
            projects: self.projects.clone(),
            has_unpublished_changes: self.has_unpublished_changes(),
            dirty: self.dirty,
        }
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn session(&self) -> &PublishSession {
        &self.session
    }

    pub fn phase(&self) -> SessionPhase {
        if self.starting {
            return SessionPhase::Starting;
        }
        match self.session.status {
            None => SessionPhase::NoSession,
            Some(PublishStatus::Publishing) => SessionPhase::Publishing,
            Some(PublishStatus::Live) => SessionPhase::Live,
            Some(PublishStatus::Failed) => SessionPhase::Failed,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.session.status == Some(PublishStatus::Publishing)
    }

    pub fn has_unpublished_changes(&self) -> bool {
        let published_at = self
            .latest
            .as_ref()
            .and_then(|record| record.published_at.as_deref());
        has_unpublished_changes(&self.pages, published_at)
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_current(&self, epoch: Epoch) -> bool {
        epoch == self.epoch
    }

    pub(crate) fn can_start(&self) -> bool {
        !self.starting && !self.poll_in_flight && !self.is_polling()
    }

    pub(crate) fn is_starting(&self) -> bool {
        self.starting
    }

    pub(crate) fn poll_in_flight(&self) -> bool {
        self.poll_in_flight
    }

    pub(crate) fn is_promoting(&self) -> bool {
        self.promoting.is_some()
    }

    pub(crate) fn latest_publish_id(&self) -> Option<&str> {
        self.latest.as_ref().map(|record| record.publish_id.as_str())
    }

    /// Discards everything tied to the previous project.
    pub(crate) fn switch_project(&mut self, project_id: Option<String>) {
        let settings = self.settings;
        let projects = std::mem::take(&mut self.projects);
        let epoch = self.epoch.wrapping_add(1);
        *self = Self {
            settings,
            project_id,
            epoch,
            projects,
            dirty: true,
            ..Self::default()
        };
    }

    pub(crate) fn begin_start(&mut self) {
        self.starting = true;
        self.preflight_details.clear();
        self.mark_dirty();
    }

    pub(crate) fn begin_poll(&mut self) {
        self.poll_in_flight = true;
    }

    pub(crate) fn finish_poll(&mut self) {
        self.poll_in_flight = false;
    }

    pub(crate) fn begin_promote(&mut self, publish_id: String) {
        self.promoting = Some(publish_id);
        self.last_error = None;
        self.mark_dirty();
    }

    pub(crate) fn finish_promote(&mut self) {
        self.promoting = None;
    }

    pub(crate) fn apply_created(&mut self, snapshot: PublishSnapshot) {
        self.starting = false;
        self.session = PublishSession {
            publish_id: Some(snapshot.publish_id),
            status: Some(snapshot.status),
            url: snapshot.url,
            error_message: failure_message(snapshot.status, snapshot.error_message),
        };
        self.mark_dirty();
    }

    pub(crate) fn apply_preflight(&mut self, details: Vec<String>) {
        self.starting = false;
        self.preflight_details = details;
        self.mark_dirty();
    }

    /// The rejected attempt never got an id, so the previous publish's id and
    /// link stay in place.
    pub(crate) fn apply_start_failed(&mut self, message: String) {
        self.starting = false;
        self.session.status = Some(PublishStatus::Failed);
        self.session.error_message = Some(non_empty_or_generic(message));
        self.mark_dirty();
    }

    pub(crate) fn apply_status(&mut self, snapshot: StatusSnapshot) {
        self.session.status = Some(snapshot.status);
        self.session.url = snapshot.url;
        self.session.error_message = failure_message(snapshot.status, snapshot.error_message);
        self.mark_dirty();
    }

    pub(crate) fn apply_poll_failure(&mut self, message: String) {
        self.session.status = Some(PublishStatus::Failed);
        self.session.error_message = Some(non_empty_or_generic(message));
        self.mark_dirty();
    }

    /// Stores the server record and, unless a publish is running locally,
    /// lets it override the displayed session.
    pub(crate) fn apply_latest(&mut self, record: Option<LatestPublishRecord>) {
        self.latest = record;
        self.mark_dirty();
        if self.is_polling() {
            return;
        }
        match &self.latest {
            Some(record) => {
                self.session = PublishSession {
                    publish_id: Some(record.publish_id.clone()),
                    status: Some(record.status),
                    url: record.url.clone(),
                    error_message: record.error_message.clone(),
                };
            }
            None if self.session.publish_id.is_none() => {
                self.session = PublishSession::default();
            }
            None => {}
        }
    }

    pub(crate) fn apply_promoted(&mut self, entry: PublishHistoryEntry) {
        self.session = PublishSession {
            publish_id: Some(entry.publish_id),
            status: Some(PublishStatus::Live),
            url: Some(entry.base_url),
            error_message: None,
        };
        self.last_error = None;
        self.mark_dirty();
    }

    pub(crate) fn set_history(&mut self, history: Vec<PublishHistoryEntry>) {
        self.history = history;
        self.mark_dirty();
    }

    pub(crate) fn set_pages(&mut self, pages: Vec<PageMeta>) {
        self.pages = pages;
        self.mark_dirty();
    }

    pub(crate) fn set_projects(&mut self, projects: Vec<ProjectSummary>) {
        self.projects = projects;
        self.mark_dirty();
    }

    pub(crate) fn set_last_error(&mut self, message: String) {
        self.last_error = Some(message);
        self.mark_dirty();
    }
}

fn failure_message(status: PublishStatus, message: Option<String>) -> Option<String> {
    match status {
        PublishStatus::Failed => Some(non_empty_or_generic(message.unwrap_or_default())),
        _ => message.filter(|text| !text.trim().is_empty()),
    }
}

fn non_empty_or_generic(message: String) -> String {
    if message.trim().is_empty() {
        GENERIC_FAILURE_MESSAGE.to_string()
    } else {
        message
    }
}
