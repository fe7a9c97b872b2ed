use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use base64::{Engine, engine::general_purpose::STANDARD};
use creati_config::{Config, KindPolicies};
use creati_core::{Kind, RequestContext};
use creati_telemetry::GenerationMetrics;
use rand::Rng;
use strum::IntoEnumIterator;
use url::Url;

use crate::{
    error::{GenerationError, Result},
    http_client::http_client,
    provider::{
        ImageParameters, ProviderAdapter, ProviderError, ProviderRequest, ProviderResponse,
        gemini::{self, GeminiAdapter},
        huggingface::{self, HuggingFaceAdapter},
    },
    request::parse_request,
    types::{ClientEnvelope, GenerationOptions, ImageUrl, MediaPayload},
};

/// Seeds are drawn from `[0, IMAGE_SEED_BOUND)`
const IMAGE_SEED_BOUND: u32 = 1_000_000;

/// Generation proxy: gates a request, calls its provider and normalizes the result
pub struct Server {
    adapters: HashMap<Kind, Arc<dyn ProviderAdapter>>,
    policies: KindPolicies,
    timeout: Duration,
    retry: bool,
    retry_backoff: Duration,
    max_images: u32,
    body_limit: usize,
    metrics: GenerationMetrics,
}

impl Server {
    /// Largest request body accepted, in bytes
    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    /// Run one generation request through every gate
    ///
    /// Authentication and configuration are checked before the body is
    /// parsed, and nothing reaches an upstream until all three pass.
    pub async fn handle(&self, kind: Kind, body: &[u8], context: &RequestContext) -> Result<ClientEnvelope> {
        let start = Instant::now();
        let result = self.run(kind, body, context).await;

        let outcome = match &result {
            Ok(_) => {
                tracing::debug!(kind = %kind, elapsed_ms = start.elapsed().as_millis(), "generation complete");
                "success"
            }
            Err(err) => {
                match err {
                    GenerationError::InvalidInput(_) | GenerationError::Unauthorized => {
                        tracing::debug!(kind = %kind, error = %err, "generation request rejected");
                    }
                    GenerationError::UpstreamFailure { .. } => {
                        tracing::warn!(kind = %kind, error = %err, "generation failed upstream");
                    }
                    GenerationError::Configuration(_) | GenerationError::InternalError(_) => {
                        tracing::error!(kind = %kind, error = %err, "generation failed");
                    }
                }
                err.outcome()
            }
        };

        self.metrics.record_request(kind, outcome, start);

        result
    }

    async fn run(&self, kind: Kind, body: &[u8], context: &RequestContext) -> Result<ClientEnvelope> {
        if self.policies.get(kind).require_auth && context.caller_id().is_none() {
            return Err(GenerationError::Unauthorized);
        }

        let adapter = self
            .adapters
            .get(&kind)
            .ok_or_else(|| GenerationError::Configuration(format!("no credential configured for the {kind} provider")))?;

        let request = parse_request(kind, body, self.max_images)?;

        tracing::debug!(
            kind = %kind,
            provider = adapter.name(),
            caller = context.caller_id().unwrap_or("anonymous"),
            "dispatching generation request"
        );

        match request.options {
            GenerationOptions::Conversation { turns } => {
                let response = self
                    .call_upstream(kind, adapter.as_ref(), &ProviderRequest::Conversation { turns })
                    .await?;
                Ok(ClientEnvelope::Message(expect_text(kind, response)?))
            }
            GenerationOptions::Image { count, width, height } => {
                self.generate_images(kind, adapter.as_ref(), request.prompt, count, width, height)
                    .await
            }
            GenerationOptions::Prompt => {
                let response = self
                    .call_upstream(
                        kind,
                        adapter.as_ref(),
                        &ProviderRequest::Prompt {
                            prompt: request.prompt,
                            image: None,
                        },
                    )
                    .await?;
                let (bytes, content_type) = expect_binary(kind, response)?;
                Ok(ClientEnvelope::Media(MediaPayload { bytes, content_type }))
            }
        }
    }

    /// One upstream call per image, in order; the first failure discards everything
    async fn generate_images(
        &self,
        kind: Kind,
        adapter: &dyn ProviderAdapter,
        prompt: String,
        count: u32,
        width: u32,
        height: u32,
    ) -> Result<ClientEnvelope> {
        let mut images = Vec::with_capacity(count as usize);

        for index in 0..count {
            let seed = rand::rng().random_range(0..IMAGE_SEED_BOUND);
            tracing::debug!(kind = %kind, index, seed, "generating image");

            let request = ProviderRequest::Prompt {
                prompt: prompt.clone(),
                image: Some(ImageParameters { width, height, seed }),
            };

            let response = self.call_upstream(kind, adapter, &request).await?;
            let (bytes, mime_type) = expect_binary(kind, response)?;

            images.push(ImageUrl {
                url: format!("data:{mime_type};base64,{}", STANDARD.encode(&bytes)),
            });
        }

        Ok(ClientEnvelope::Images(images))
    }

    /// Call the provider under the configured deadline, retrying one transient failure
    async fn call_upstream(
        &self,
        kind: Kind,
        adapter: &dyn ProviderAdapter,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse> {
        let max_attempts = if self.retry { 2 } else { 1 };
        let mut attempt = 1;

        loop {
            self.metrics.record_upstream_attempt(kind, adapter.name());

            let result = tokio::time::timeout(self.timeout, adapter.send(request))
                .await
                .unwrap_or(Err(ProviderError::Timeout(self.timeout)));

            match result {
                Ok(response) => return Ok(response),
                Err(err) if attempt < max_attempts && err.is_transient() => {
                    tracing::warn!(
                        kind = %kind,
                        provider = adapter.name(),
                        attempt,
                        error = %err,
                        "transient upstream failure, retrying"
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(provider_failure(kind, adapter.name(), err)),
            }
        }
    }
}

fn provider_failure(kind: Kind, provider: &str, err: ProviderError) -> GenerationError {
    match err {
        ProviderError::Status { status, body } => GenerationError::upstream(kind, status, &body),
        ProviderError::Timeout(deadline) => GenerationError::UpstreamFailure {
            kind,
            status: 504,
            detail: format!("no response within {deadline:?}"),
        },
        other => GenerationError::InternalError(format!("{provider} provider: {other}")),
    }
}

fn expect_text(kind: Kind, response: ProviderResponse) -> Result<String> {
    match response {
        ProviderResponse::Text(text) => Ok(text),
        ProviderResponse::Binary { mime_type, .. } => Err(GenerationError::InternalError(format!(
            "{kind} provider returned {mime_type} where text was expected"
        ))),
    }
}

fn expect_binary(kind: Kind, response: ProviderResponse) -> Result<(bytes::Bytes, String)> {
    match response {
        ProviderResponse::Binary { bytes, mime_type } => Ok((bytes, mime_type)),
        ProviderResponse::Text(_) => Err(GenerationError::InternalError(format!(
            "{kind} provider returned text where media was expected"
        ))),
    }
}

/// Builder for constructing the generation proxy from configuration
///
/// A provider adapter is only created when its credential is present; kinds
/// without one fail the configuration gate at request time.
pub struct GenerationServerBuilder<'a> {
    config: &'a Config,
    overrides: Vec<(Kind, Arc<dyn ProviderAdapter>)>,
    metrics: Option<GenerationMetrics>,
}

impl<'a> GenerationServerBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            overrides: Vec::new(),
            metrics: None,
        }
    }

    /// Serve a kind with the given adapter regardless of configured credentials
    #[must_use]
    pub fn with_adapter(mut self, kind: Kind, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.overrides.push((kind, adapter));
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: GenerationMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Result<Server> {
        let client = http_client()
            .map_err(|e| GenerationError::InternalError(format!("failed to build HTTP client: {e}")))?;

        let mut adapters: HashMap<Kind, Arc<dyn ProviderAdapter>> = HashMap::new();
        let providers = &self.config.providers;

        if let Some(api_key) = providers.text.credential() {
            let base_url = base_url(providers.text.base_url.as_ref(), gemini::DEFAULT_BASE_URL)?;
            let model = &providers.text.model;

            adapters.insert(
                Kind::Chat,
                Arc::new(GeminiAdapter::new("gemini", client.clone(), &base_url, model, api_key.clone())),
            );
            adapters.insert(
                Kind::Code,
                Arc::new(
                    GeminiAdapter::new("gemini", client.clone(), &base_url, model, api_key.clone())
                        .with_system_instruction(gemini::CODE_INSTRUCTION),
                ),
            );
        } else {
            tracing::warn!("no text provider API key configured; chat and code requests will fail");
        }

        if let Some(api_token) = providers.inference.credential() {
            let inference = &providers.inference;
            let base_url = base_url(inference.base_url.as_ref(), huggingface::DEFAULT_BASE_URL)?;

            for (kind, model, mime_type) in [
                (Kind::Image, &inference.image_model, "image/jpeg"),
                (Kind::Music, &inference.music_model, "audio/wav"),
                (Kind::Video, &inference.video_model, "video/mp4"),
            ] {
                adapters.insert(
                    kind,
                    Arc::new(HuggingFaceAdapter::new(
                        "huggingface",
                        client.clone(),
                        &base_url,
                        model,
                        api_token.clone(),
                        mime_type,
                    )),
                );
            }
        } else {
            tracing::warn!("no inference API token configured; image, music and video requests will fail");
        }

        for (kind, adapter) in self.overrides {
            adapters.insert(kind, adapter);
        }

        let generation = &self.config.generation;

        if self.config.identity.is_none() {
            for kind in Kind::iter() {
                if generation.policies.get(kind).require_auth {
                    tracing::warn!(kind = %kind, "kind requires authentication but no identity is configured");
                }
            }
        }

        tracing::debug!("Generation server initialized with {} provider adapter(s)", adapters.len());

        Ok(Server {
            adapters,
            policies: generation.policies.clone(),
            timeout: generation.timeout,
            retry: generation.retry,
            retry_backoff: generation.retry_backoff,
            max_images: generation.max_images,
            body_limit: self.config.server.body_limit_bytes,
            metrics: self.metrics.unwrap_or_default(),
        })
    }
}

fn base_url(configured: Option<&Url>, default: &str) -> Result<Url> {
    match configured {
        Some(url) => Ok(url.clone()),
        None => Url::parse(default).map_err(|e| GenerationError::InternalError(format!("invalid default URL: {e}"))),
    }
}
