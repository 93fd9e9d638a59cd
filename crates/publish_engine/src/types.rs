use std::fmt;

/// Error code the API uses when server-side validation blocks a publish.
pub const PREFLIGHT_FAILED_CODE: &str = "PREFLIGHT_FAILED";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Server-provided text when there is one, otherwise a description of the kind.
    pub fn user_message(&self) -> String {
        if self.message.trim().is_empty() {
            self.kind.to_string()
        } else {
            self.message.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorKind {
    InvalidUrl,
    Transport,
    Timeout,
    HttpStatus(u16),
    Rejected { code: String },
    PreflightFailed { details: Vec<String> },
    Decode,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::InvalidUrl => write!(f, "invalid url"),
            ApiErrorKind::Transport => write!(f, "network error"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            ApiErrorKind::Rejected { code } => write!(f, "rejected ({code})"),
            ApiErrorKind::PreflightFailed { details } => {
                write!(f, "preflight failed ({} issue(s))", details.len())
            }
            ApiErrorKind::Decode => write!(f, "malformed response"),
        }
    }
}
