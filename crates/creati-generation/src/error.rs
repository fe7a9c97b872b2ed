use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use creati_core::{HttpError, Kind};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenerationError>;

/// Longest upstream detail echoed back to the client, in characters
const MAX_DETAIL_CHARS: usize = 200;

/// Generation proxy errors with their client-facing contract
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The caller's request violates a constraint
    #[error("{0}")]
    InvalidInput(String),

    /// The kind requires a verified caller and none was present
    #[error("Unauthorized")]
    Unauthorized,

    /// A server-side secret is missing or unusable
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The upstream provider answered with a non-success status
    #[error("{kind} upstream returned status {status}")]
    UpstreamFailure { kind: Kind, status: u16, detail: String },

    /// Anything unanticipated; the message is logged, never returned
    #[error("internal error: {0}")]
    InternalError(String),
}

impl GenerationError {
    /// Build an upstream failure, truncating the provider body
    pub fn upstream(kind: Kind, status: u16, body: &str) -> Self {
        Self::UpstreamFailure {
            kind,
            status,
            detail: truncate_detail(body),
        }
    }

    /// Short label used for metrics and logs
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Unauthorized => "unauthorized",
            Self::Configuration(_) => "configuration",
            Self::UpstreamFailure { .. } => "upstream_failure",
            Self::InternalError(_) => "internal_error",
        }
    }
}

impl HttpError for GenerationError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Configuration(_) | Self::UpstreamFailure { .. } | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::InvalidInput(message) => message.clone(),
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::Configuration(_) => "API key not configured".to_string(),
            Self::UpstreamFailure { kind, .. } => format!("{} generation failed", kind.label()),
            Self::InternalError(_) => "Internal server error".to_string(),
        }
    }

    fn client_details(&self) -> Option<String> {
        match self {
            Self::UpstreamFailure { status, detail, .. } if detail.is_empty() => {
                Some(format!("upstream status {status}"))
            }
            Self::UpstreamFailure { status, detail, .. } => Some(format!("upstream status {status}: {detail}")),
            _ => None,
        }
    }
}

/// Error envelope returned to the browser
#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Render an error envelope with the given status
pub(crate) fn error_response(status: StatusCode, error: String, details: Option<String>) -> Response {
    (status, Json(ErrorBody { error, details })).into_response()
}

impl IntoResponse for GenerationError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.client_message(), self.client_details())
    }
}

/// Trim an upstream body to a short single-line detail
fn truncate_detail(body: &str) -> String {
    let flattened = body.split_whitespace().collect::<Vec<_>>().join(" ");

    match flattened.char_indices().nth(MAX_DETAIL_CHARS) {
        Some((cut, _)) => format!("{}...", &flattened[..cut]),
        None => flattened,
    }
}
