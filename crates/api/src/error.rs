//! Error taxonomy for platform API calls.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::credentials::CredentialError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    MissingCredential(#[from] CredentialError),

    #[error("cannot reach the platform at {url}: {source}")]
    BackendUnreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("the platform rejected the API key: {message}")]
    AuthenticationRejected { message: String },

    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("platform error (HTTP {status}): {message}")]
    Remote {
        status: u16,
        error_type: Option<String>,
        message: String,
    },

    #[error("background task {job_id} failed: {message}")]
    BackgroundTaskFailed { job_id: String, message: String },

    #[error("unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("invalid client configuration: {0}")]
    InvalidConfiguration(String),
}

impl ApiError {
    /// HTTP status of a rejected request, when the platform answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationRejected { .. } => Some(401),
            Self::PermissionDenied { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Platform exception class reported in the error body, if any.
    pub fn error_type(&self) -> Option<&str> {
        match self {
            Self::Remote { error_type, .. } => error_type.as_deref(),
            _ => None,
        }
    }

    /// Whether the platform answered the request with an error status.
    pub fn is_http_rejection(&self) -> bool {
        self.status().is_some()
    }

    /// Transport failures and server-side errors may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::BackendUnreachable { .. } => true,
            Self::Remote { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub(crate) fn decode(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::BackendUnreachable { url: url.into(), source }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detailed_message: Option<String>,
}

/// Map a non-success response to an [`ApiError`].
///
/// The platform usually answers with `{"errorType", "message"}`; bodies that
/// are not JSON are reported verbatim.
pub(crate) fn classify_response(status: StatusCode, body: &str) -> ApiError {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    let error_type = parsed.as_ref().and_then(|error| error.error_type.clone());
    let message = parsed
        .and_then(|error| error.message.or(error.detailed_message))
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.canonical_reason().unwrap_or("no response body").to_string()
            } else {
                trimmed.to_string()
            }
        });

    match status {
        StatusCode::UNAUTHORIZED => ApiError::AuthenticationRejected { message },
        StatusCode::FORBIDDEN => ApiError::PermissionDenied { message },
        StatusCode::NOT_FOUND => ApiError::NotFound { message },
        other => ApiError::Remote {
            status: other.as_u16(),
            error_type,
            message,
        },
    }
}
