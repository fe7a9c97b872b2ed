use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

/// Upstream provider configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    /// Conversational text model serving chat and code
    #[serde(default)]
    pub text: TextProviderConfig,
    /// Hosted inference API serving image, music and video
    #[serde(default)]
    pub inference: InferenceProviderConfig,
}

/// Text model provider (Gemini `generateContent` API)
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextProviderConfig {
    /// API key; unset or empty leaves chat and code unconfigured
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Model identifier
    #[serde(default = "default_text_model")]
    pub model: String,
}

impl Default for TextProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: default_text_model(),
        }
    }
}

impl TextProviderConfig {
    /// Configured API key, ignoring empty values
    pub fn credential(&self) -> Option<&SecretString> {
        non_empty(self.api_key.as_ref())
    }
}

/// Hosted inference provider (Hugging Face inference API)
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InferenceProviderConfig {
    /// Bearer token shared by the image, music and video models
    #[serde(default)]
    pub api_token: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Text-to-image model
    #[serde(default = "default_image_model")]
    pub image_model: String,
    /// Text-to-audio model
    #[serde(default = "default_music_model")]
    pub music_model: String,
    /// Text-to-video model
    #[serde(default = "default_video_model")]
    pub video_model: String,
}

impl Default for InferenceProviderConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: None,
            image_model: default_image_model(),
            music_model: default_music_model(),
            video_model: default_video_model(),
        }
    }
}

impl InferenceProviderConfig {
    /// Configured bearer token, ignoring empty values
    pub fn credential(&self) -> Option<&SecretString> {
        non_empty(self.api_token.as_ref())
    }
}

fn non_empty(secret: Option<&SecretString>) -> Option<&SecretString> {
    secret.filter(|s| !s.expose_secret().trim().is_empty())
}

fn default_text_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_image_model() -> String {
    "black-forest-labs/FLUX.1-schnell".to_string()
}

fn default_music_model() -> String {
    "facebook/musicgen-small".to_string()
}

fn default_video_model() -> String {
    "MCG-NJU/videomae-base-short".to_string()
}
