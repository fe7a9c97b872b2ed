//! Gemini `generateContent` adapter for chat and code

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{ProviderAdapter, ProviderError, ProviderRequest, ProviderResponse, status_error};

/// Default Generative Language API base URL
pub(crate) const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Instruction prepended to code assistant conversations
pub(crate) const CODE_INSTRUCTION: &str = "You are a code generator. For all future responses, provide code examples in \
     markdown format. Include explanations as code comments within the code. After the code block, provide an \
     explanation of the code's functionality 'Explanation:[explanation]'. Always start your response with \
     'Here's an example of [description]:'";

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        (!text.is_empty()).then_some(text)
    }
}

/// Text model behind the Gemini API
pub struct GeminiAdapter {
    name: String,
    client: Client,
    endpoint: String,
    api_key: SecretString,
    system_instruction: Option<&'static str>,
}

impl GeminiAdapter {
    pub fn new(name: impl Into<String>, client: Client, base_url: &Url, model: &str, api_key: SecretString) -> Self {
        let base = base_url.as_str().trim_end_matches('/');

        Self {
            name: name.into(),
            client,
            endpoint: format!("{base}/models/{model}:generateContent"),
            api_key,
            system_instruction: None,
        }
    }

    /// Send a fixed system instruction with every conversation
    #[must_use]
    pub fn with_system_instruction(mut self, instruction: &'static str) -> Self {
        self.system_instruction = Some(instruction);
        self
    }

    fn wire_request<'a>(&self, request: &'a ProviderRequest) -> GenerateContentRequest<'a> {
        let contents = match request {
            ProviderRequest::Conversation { turns } => turns
                .iter()
                .map(|turn| Content {
                    role: Some(turn.role.as_str()),
                    parts: vec![Part { text: &turn.content }],
                })
                .collect(),
            ProviderRequest::Prompt { prompt, .. } => vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
        };

        GenerateContentRequest {
            contents,
            system_instruction: self.system_instruction.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
        }
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&self.wire_request(request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let payload: GenerateContentResponse = response.json().await?;

        payload
            .into_text()
            .map(ProviderResponse::Text)
            .ok_or_else(|| ProviderError::Decode("response carried no candidate text".to_string()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
