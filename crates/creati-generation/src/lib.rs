#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod error;
mod http_client;
mod provider;
mod request;
mod server;
mod types;

use std::{str::FromStr, sync::Arc};

use axum::{
    Router,
    extract::{Path, State},
    routing::post,
};
use creati_core::Kind;

pub use error::{GenerationError, Result};
pub use provider::{ImageParameters, ProviderAdapter, ProviderError, ProviderRequest, ProviderResponse};
pub use request::{ExtractGeneration, parse_request};
pub use server::{GenerationServerBuilder, Server};
pub use types::{ChatMessage, ClientEnvelope, GenerationOptions, GenerationRequest, ImageUrl, MediaPayload, Role};

/// Build the generation proxy from configuration
///
/// # Errors
///
/// Returns an error if the server fails to initialize
pub fn build_server(config: &creati_config::Config) -> anyhow::Result<Arc<Server>> {
    let server = Arc::new(
        GenerationServerBuilder::new(config)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize generation server: {e}"))?,
    );
    Ok(server)
}

/// Create the endpoint router for every generation kind
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/smartchat", post(chat))
        .route("/api/code", post(code))
        .route("/api/image", post(image))
        .route("/api/music", post(music))
        .route("/api/video", post(video))
        .route("/api/generate/{kind}", post(generate))
}

async fn chat(
    State(server): State<Arc<Server>>,
    ExtractGeneration(context, body): ExtractGeneration,
) -> Result<ClientEnvelope> {
    server.handle(Kind::Chat, &body, &context).await
}

async fn code(
    State(server): State<Arc<Server>>,
    ExtractGeneration(context, body): ExtractGeneration,
) -> Result<ClientEnvelope> {
    server.handle(Kind::Code, &body, &context).await
}

async fn image(
    State(server): State<Arc<Server>>,
    ExtractGeneration(context, body): ExtractGeneration,
) -> Result<ClientEnvelope> {
    server.handle(Kind::Image, &body, &context).await
}

async fn music(
    State(server): State<Arc<Server>>,
    ExtractGeneration(context, body): ExtractGeneration,
) -> Result<ClientEnvelope> {
    server.handle(Kind::Music, &body, &context).await
}

async fn video(
    State(server): State<Arc<Server>>,
    ExtractGeneration(context, body): ExtractGeneration,
) -> Result<ClientEnvelope> {
    server.handle(Kind::Video, &body, &context).await
}

/// Generic route where the kind is named in the path
async fn generate(
    State(server): State<Arc<Server>>,
    Path(kind): Path<String>,
    ExtractGeneration(context, body): ExtractGeneration,
) -> Result<ClientEnvelope> {
    let kind = Kind::from_str(&kind)
        .map_err(|_| GenerationError::InvalidInput(format!("Unknown generation kind: {kind}")))?;

    tracing::debug!(kind = %kind, "generic generation handler called");

    server.handle(kind, &body, &context).await
}
