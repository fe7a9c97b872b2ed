//! Mock inference backend for integration tests
//!
//! Serves the Gemini `generateContent` route and the Hugging Face model
//! route with canned responses, counting every call it receives

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

/// API key the mock expects from the text adapter
pub const TEXT_API_KEY: &str = "test-genai-key";
/// Bearer token the mock expects from the inference adapter
pub const INFERENCE_TOKEN: &str = "test-hf-token";

/// Mock upstream with predictable responses
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    text_count: AtomicU32,
    inference_count: AtomicU32,
    /// Number of requests to fail before succeeding
    fail_count: AtomicU32,
    fail_status: StatusCode,
    delay: Option<Duration>,
    reply: String,
    text_requests: Mutex<Vec<serde_json::Value>>,
    inference_requests: Mutex<Vec<(String, serde_json::Value)>>,
}

/// Options for starting a mock upstream
pub struct MockOptions {
    pub fail_count: u32,
    pub fail_status: StatusCode,
    pub delay: Option<Duration>,
    pub reply: String,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            fail_count: 0,
            fail_status: StatusCode::SERVICE_UNAVAILABLE,
            delay: None,
            reply: "hello".to_owned(),
        }
    }
}

impl MockUpstream {
    /// Start a mock that always succeeds
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(MockOptions::default()).await
    }

    /// Start a mock that fails the first `n` requests with `status`
    pub async fn start_failing(n: u32, status: StatusCode) -> anyhow::Result<Self> {
        Self::start_with(MockOptions {
            fail_count: n,
            fail_status: status,
            ..MockOptions::default()
        })
        .await
    }

    /// Start a mock whose text model answers with `reply`
    pub async fn start_with_reply(reply: &str) -> anyhow::Result<Self> {
        Self::start_with(MockOptions {
            reply: reply.to_owned(),
            ..MockOptions::default()
        })
        .await
    }

    pub async fn start_with(options: MockOptions) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            text_count: AtomicU32::new(0),
            inference_count: AtomicU32::new(0),
            fail_count: AtomicU32::new(options.fail_count),
            fail_status: options.fail_status,
            delay: options.delay,
            reply: options.reply,
            text_requests: Mutex::new(Vec::new()),
            inference_requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1beta/models/{action}", routing::post(handle_generate_content))
            .route("/models/{owner}/{model}", routing::post(handle_inference))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for the text provider, including the API version
    pub fn text_base_url(&self) -> String {
        format!("http://{}/v1beta", self.addr)
    }

    /// Base URL for the inference provider
    pub fn inference_base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of text generation calls received
    pub fn text_count(&self) -> u32 {
        self.state.text_count.load(Ordering::Relaxed)
    }

    /// Number of inference calls received
    pub fn inference_count(&self) -> u32 {
        self.state.inference_count.load(Ordering::Relaxed)
    }

    /// Bodies of every text generation call, in arrival order
    pub fn text_requests(&self) -> Vec<serde_json::Value> {
        self.state.text_requests.lock().unwrap().clone()
    }

    /// Model path and body of every inference call, in arrival order
    pub fn inference_requests(&self) -> Vec<(String, serde_json::Value)> {
        self.state.inference_requests.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl MockState {
    /// Apply the configured delay and scripted failures
    async fn gate(&self) -> Option<Response> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let should_fail = self
            .fail_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        should_fail.then(|| {
            (
                self.fail_status,
                Json(serde_json::json!({ "error": "Model is currently loading", "estimated_time": 20.0 })),
            )
                .into_response()
        })
    }
}

async fn handle_generate_content(
    State(state): State<Arc<MockState>>,
    Path(action): Path<String>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.text_count.fetch_add(1, Ordering::Relaxed);
    state.text_requests.lock().unwrap().push(body);

    if !action.ends_with(":generateContent") {
        return StatusCode::NOT_FOUND.into_response();
    }

    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(TEXT_API_KEY) {
        return (StatusCode::FORBIDDEN, "API key not valid").into_response();
    }

    if let Some(failure) = state.gate().await {
        return failure;
    }

    Json(serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": state.reply }] },
            "finishReason": "STOP"
        }]
    }))
    .into_response()
}

async fn handle_inference(
    State(state): State<Arc<MockState>>,
    Path((owner, model)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.inference_count.fetch_add(1, Ordering::Relaxed);
    let model = format!("{owner}/{model}");
    state.inference_requests.lock().unwrap().push((model.clone(), body));

    let expected = format!("Bearer {INFERENCE_TOKEN}");
    if headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
        return (StatusCode::UNAUTHORIZED, "Invalid credentials in Authorization header").into_response();
    }

    if let Some(failure) = state.gate().await {
        return failure;
    }

    media_for(&model).into_response()
}

/// Canned media bytes for a model
pub fn media_for(model: &str) -> Bytes {
    Bytes::from(format!("mock-media:{model}"))
}
