use crate::{LatestPublishRecord, PageMeta, ProjectSummary, PublishHistoryEntry, PublishStatus};

/// Where the current publish attempt stands, as rendered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    NoSession,
    Starting,
    Publishing,
    Live,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublishViewModel {
    pub project_id: Option<String>,
    pub phase: SessionPhase,
    pub publish_id: Option<String>,
    pub status: Option<PublishStatus>,
    pub url: Option<String>,
    pub error_message: Option<String>,
    pub preflight_details: Vec<String>,
    pub last_error: Option<String>,
    pub latest: Option<LatestPublishRecord>,
    pub history: Vec<PublishHistoryEntry>,
    pub pages: Vec<PageMeta>,
    pub projects: Vec<ProjectSummary>,
    pub has_unpublished_changes: bool,
    pub dirty: bool,
}
