/// Bumped on every project switch or teardown; replies carrying an older
/// value are discarded.
pub type Epoch = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublishStatus {
    Publishing,
    Live,
    Failed,
}

impl PublishStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PublishStatus::Publishing)
    }
}

/// Observable state of the current publish attempt for one project.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublishSession {
    pub publish_id: Option<String>,
    pub status: Option<PublishStatus>,
    pub url: Option<String>,
    pub error_message: Option<String>,
}

/// Reply of the create-publish collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSnapshot {
    pub publish_id: String,
    pub status: PublishStatus,
    pub url: Option<String>,
    pub error_message: Option<String>,
}

/// Reply of the publish-status collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: PublishStatus,
    pub url: Option<String>,
    pub error_message: Option<String>,
}

/// Server-owned record of the project's designated live publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestPublishRecord {
    pub publish_id: String,
    pub status: PublishStatus,
    pub url: Option<String>,
    pub error_message: Option<String>,
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishHistoryEntry {
    pub publish_id: String,
    pub status: PublishStatus,
    pub created_at: String,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub id: String,
    pub slug: String,
    pub is_home: bool,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub latest_publish_id: Option<String>,
}

/// Why a publish could not be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartFailure {
    /// Server-side validation blocked the attempt; one entry per blocking issue.
    Preflight(Vec<String>),
    Failed(String),
}
