//! Hugging Face inference adapter for image, music and video

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use url::Url;

use super::{ProviderAdapter, ProviderError, ProviderRequest, ProviderResponse, status_error};

/// Default inference API base URL
pub(crate) const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
}

/// One hosted model producing binary media of a fixed type
pub struct HuggingFaceAdapter {
    name: String,
    client: Client,
    endpoint: String,
    api_token: SecretString,
    mime_type: &'static str,
}

impl HuggingFaceAdapter {
    pub fn new(
        name: impl Into<String>,
        client: Client,
        base_url: &Url,
        model: &str,
        api_token: SecretString,
        mime_type: &'static str,
    ) -> Self {
        let base = base_url.as_str().trim_end_matches('/');

        Self {
            name: name.into(),
            client,
            endpoint: format!("{base}/models/{model}"),
            api_token,
            mime_type,
        }
    }
}

fn wire_request(request: &ProviderRequest) -> Result<InferenceRequest<'_>, ProviderError> {
    match request {
        ProviderRequest::Prompt { prompt, image } => Ok(InferenceRequest {
            inputs: prompt,
            width: image.map(|i| i.width),
            height: image.map(|i| i.height),
            seed: image.map(|i| i.seed),
        }),
        ProviderRequest::Conversation { .. } => Err(ProviderError::Transport(
            "inference models take a prompt, not a conversation".to_string(),
        )),
    }
}

#[async_trait]
impl ProviderAdapter for HuggingFaceAdapter {
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_token.expose_secret())
            .json(&wire_request(request)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let bytes = response.bytes().await?;

        Ok(ProviderResponse::Binary {
            bytes,
            mime_type: self.mime_type.to_string(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
