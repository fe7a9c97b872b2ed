pub(crate) mod gemini;
pub(crate) mod huggingface;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::types::ChatMessage;

/// Request handed to a provider adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRequest {
    /// Text generation from a conversation, oldest turn first
    Conversation { turns: Vec<ChatMessage> },
    /// Media generation from a prompt
    Prompt {
        prompt: String,
        image: Option<ImageParameters>,
    },
}

/// Size and seed of one image generation call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageParameters {
    pub width: u32,
    pub height: u32,
    pub seed: u32,
}

/// Successful upstream payload
#[derive(Debug, Clone)]
pub enum ProviderResponse {
    Text(String),
    Binary { bytes: Bytes, mime_type: String },
}

/// Failure talking to an upstream provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Upstream answered with a non-success status
    #[error("upstream returned status {status}")]
    Status { status: u16, body: String },

    /// No response within the per-call deadline
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// Connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// Request failed after the connection was made
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body did not have the expected shape
    #[error("unexpected upstream payload: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Whether a single retry may succeed
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => matches!(*status, 429 | 502 | 503 | 504),
            Self::Timeout(_) | Self::Connect(_) => true,
            Self::Transport(_) | Self::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// An upstream inference API behind a uniform send contract
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Perform one upstream call
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError>;

    /// Provider name for logs and metrics
    fn name(&self) -> &str;
}

/// Bytes of an upstream error body kept for the client detail
const MAX_ERROR_BODY_BYTES: usize = 4096;

/// Read a non-success response into a status error
///
/// Only the head of the body is read; error pages can be arbitrarily large.
pub(crate) async fn status_error(mut response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let mut head = Vec::new();

    while head.len() < MAX_ERROR_BODY_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => head.extend_from_slice(&chunk),
            Ok(None) | Err(_) => break,
        }
    }
    head.truncate(MAX_ERROR_BODY_BYTES);

    ProviderError::Status {
        status,
        body: String::from_utf8_lossy(&head).into_owned(),
    }
}
