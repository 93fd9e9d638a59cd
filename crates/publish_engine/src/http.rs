use std::time::Duration;

use publish_core::{
    LatestPublishRecord, PageMeta, ProjectSummary, PublishHistoryEntry, PublishSnapshot,
    StatusSnapshot,
};
use publish_logging::publish_debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use serde::de::{DeserializeOwned, IgnoredAny};

use crate::wire::{
    decode_envelope, require, HistoryDto, LatestDto, PageDto, ProjectDto, PublishDto,
    SetLatestBody, StatusDto,
};
use crate::{ApiError, ApiErrorKind, PublishApi};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            auth_token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// `PublishApi` over the JSON REST API.
#[derive(Debug, Clone)]
pub struct ReqwestPublishApi {
    client: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl ReqwestPublishApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(ApiErrorKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::new(
                ApiErrorKind::InvalidUrl,
                format!("{base_url} cannot be used as an api base"),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(ApiErrorKind::Transport, err.to_string()))?;
        Ok(Self {
            client,
            base_url,
            auth_token: settings.auth_token,
        })
    }

    /// Appends `segments` to the base url, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<Option<T>, ApiError> {
        publish_debug!("{} {}", method, url);
        let mut request = self.client.request(method, url);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        decode_envelope(status.as_u16(), &bytes)
    }
}

#[async_trait::async_trait]
impl PublishApi for ReqwestPublishApi {
    async fn create_publish(&self, project_id: &str) -> Result<PublishSnapshot, ApiError> {
        let url = self.endpoint(&["projects", project_id, "publishes"]);
        let data = self.call::<PublishDto>(Method::POST, url, None).await?;
        Ok(require(data)?.into())
    }

    async fn get_publish_status(
        &self,
        project_id: &str,
        publish_id: &str,
    ) -> Result<StatusSnapshot, ApiError> {
        let url = self.endpoint(&["projects", project_id, "publishes", publish_id]);
        let data = self.call::<StatusDto>(Method::GET, url, None).await?;
        Ok(require(data)?.into())
    }

    async fn get_latest_publish(
        &self,
        project_id: &str,
    ) -> Result<Option<LatestPublishRecord>, ApiError> {
        let url = self.endpoint(&["projects", project_id, "publishes", "latest"]);
        match self.call::<LatestDto>(Method::GET, url, None).await {
            Ok(data) => Ok(data.map(Into::into)),
            Err(ApiError {
                kind: ApiErrorKind::HttpStatus(404),
                ..
            }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn set_latest_publish(&self, project_id: &str, publish_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["projects", project_id, "publishes", "latest"]);
        let body = serde_json::to_vec(&SetLatestBody { publish_id })
            .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))?;
        self.call::<IgnoredAny>(Method::PUT, url, Some(body)).await?;
        Ok(())
    }

    async fn list_publish_history(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<PublishHistoryEntry>, ApiError> {
        let mut url = self.endpoint(&["projects", project_id, "publishes"]);
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        let data = self.call::<Vec<HistoryDto>>(Method::GET, url, None).await?;
        Ok(data
            .unwrap_or_default()
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn list_pages(&self, project_id: &str) -> Result<Vec<PageMeta>, ApiError> {
        let url = self.endpoint(&["projects", project_id, "pages"]);
        let data = self.call::<Vec<PageDto>>(Method::GET, url, None).await?;
        Ok(data
            .unwrap_or_default()
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, ApiError> {
        let url = self.endpoint(&["projects"]);
        let data = self.call::<Vec<ProjectDto>>(Method::GET, url, None).await?;
        Ok(data
            .unwrap_or_default()
            .into_iter()
            .map(Into::into)
            .collect())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ApiErrorKind::Timeout, err.to_string());
    }
    ApiError::new(ApiErrorKind::Transport, err.to_string())
}
