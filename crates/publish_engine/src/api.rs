use publish_core::{
    LatestPublishRecord, PageMeta, ProjectSummary, PublishHistoryEntry, PublishSnapshot,
    StatusSnapshot,
};

use crate::ApiError;

/// Server collaborators the publish controller talks to.
#[async_trait::async_trait]
pub trait PublishApi: Send + Sync {
    /// Fails with `ApiErrorKind::PreflightFailed` when validation blocks the attempt.
    async fn create_publish(&self, project_id: &str) -> Result<PublishSnapshot, ApiError>;

    async fn get_publish_status(
        &self,
        project_id: &str,
        publish_id: &str,
    ) -> Result<StatusSnapshot, ApiError>;

    /// `None` when the project has never been published.
    async fn get_latest_publish(
        &self,
        project_id: &str,
    ) -> Result<Option<LatestPublishRecord>, ApiError>;

    async fn set_latest_publish(&self, project_id: &str, publish_id: &str) -> Result<(), ApiError>;

    async fn list_publish_history(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<PublishHistoryEntry>, ApiError>;

    async fn list_pages(&self, project_id: &str) -> Result<Vec<PageMeta>, ApiError>;

    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, ApiError>;
}
