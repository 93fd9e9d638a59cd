//! JSON shapes of the publish API and the `{ok, data, error}` envelope.
use publish_core::{
    LatestPublishRecord, PageMeta, ProjectSummary, PublishHistoryEntry, PublishSnapshot,
    PublishStatus, StatusSnapshot,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::PREFLIGHT_FAILED_CODE;
use crate::{ApiError, ApiErrorKind};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<WireError>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<String>,
}

/// Decodes an API response body.
///
/// `Ok(None)` means the server answered `ok` with `data: null`.
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    http_status: u16,
    body: &[u8],
) -> Result<Option<T>, ApiError> {
    let success = (200..300).contains(&http_status);
    match serde_json::from_slice::<Envelope<T>>(body) {
        Ok(envelope) if envelope.ok && success => Ok(envelope.data),
        Ok(envelope) => Err(envelope
            .error
            .map(into_api_error)
            .unwrap_or_else(|| status_error(http_status))),
        Err(err) if success => Err(ApiError::new(ApiErrorKind::Decode, err.to_string())),
        Err(_) => Err(status_error(http_status)),
    }
}

pub(crate) fn require<T>(data: Option<T>) -> Result<T, ApiError> {
    data.ok_or_else(|| ApiError::new(ApiErrorKind::Decode, "response has no data"))
}

fn into_api_error(error: WireError) -> ApiError {
    let kind = if error.code == PREFLIGHT_FAILED_CODE {
        ApiErrorKind::PreflightFailed {
            details: error.details,
        }
    } else {
        ApiErrorKind::Rejected { code: error.code }
    };
    ApiError::new(kind, error.message)
}

fn status_error(http_status: u16) -> ApiError {
    ApiError::new(ApiErrorKind::HttpStatus(http_status), "")
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum WireStatus {
    Publishing,
    Live,
    Failed,
}

impl From<WireStatus> for PublishStatus {
    fn from(status: WireStatus) -> Self {
        match status {
            WireStatus::Publishing => PublishStatus::Publishing,
            WireStatus::Live => PublishStatus::Live,
            WireStatus::Failed => PublishStatus::Failed,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PublishDto {
    publish_id: String,
    status: WireStatus,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

impl From<PublishDto> for PublishSnapshot {
    fn from(dto: PublishDto) -> Self {
        Self {
            publish_id: dto.publish_id,
            status: dto.status.into(),
            url: dto.url,
            error_message: dto.error_message,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusDto {
    status: WireStatus,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

impl From<StatusDto> for StatusSnapshot {
    fn from(dto: StatusDto) -> Self {
        Self {
            status: dto.status.into(),
            url: dto.url,
            error_message: dto.error_message,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LatestDto {
    publish_id: String,
    status: WireStatus,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
}

impl From<LatestDto> for LatestPublishRecord {
    fn from(dto: LatestDto) -> Self {
        Self {
            publish_id: dto.publish_id,
            status: dto.status.into(),
            url: dto.url,
            error_message: dto.error_message,
            published_at: dto.published_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryDto {
    publish_id: String,
    status: WireStatus,
    created_at: String,
    base_url: String,
}

impl From<HistoryDto> for PublishHistoryEntry {
    fn from(dto: HistoryDto) -> Self {
        Self {
            publish_id: dto.publish_id,
            status: dto.status.into(),
            created_at: dto.created_at,
            base_url: dto.base_url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageDto {
    id: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    is_home: bool,
    #[serde(default)]
    updated_at: String,
}

impl From<PageDto> for PageMeta {
    fn from(dto: PageDto) -> Self {
        Self {
            id: dto.id,
            slug: dto.slug,
            is_home: dto.is_home,
            updated_at: dto.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectDto {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    latest_publish_id: Option<String>,
}

impl From<ProjectDto> for ProjectSummary {
    fn from(dto: ProjectDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            latest_publish_id: dto.latest_publish_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetLatestBody<'a> {
    pub publish_id: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preflight_code_carries_details() {
        let body = br#"{"ok":false,"error":{"code":"PREFLIGHT_FAILED","message":"Cannot publish","details":["Home page is missing"]}}"#;
        let err = decode_envelope::<PublishDto>(422, body).unwrap_err();
        assert_eq!(
            err.kind,
            ApiErrorKind::PreflightFailed {
                details: vec!["Home page is missing".to_string()]
            }
        );
        assert_eq!(err.message, "Cannot publish");
    }

    #[test]
    fn null_data_decodes_to_none() {
        let decoded = decode_envelope::<LatestDto>(200, br#"{"ok":true,"data":null}"#).unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn non_envelope_error_maps_to_status() {
        let err = decode_envelope::<StatusDto>(502, b"<html>bad gateway</html>").unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::HttpStatus(502));
    }

    #[test]
    fn garbage_success_body_is_a_decode_error() {
        let err = decode_envelope::<StatusDto>(200, b"not json").unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Decode);
    }
}
