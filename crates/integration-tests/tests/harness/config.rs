//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::time::Duration;

use creati_config::{Config, CorsConfig, IdentityConfig, KindPolicy};
use creati_core::Kind;
use secrecy::SecretString;

use super::mock_upstream::{INFERENCE_TOKEN, TEXT_API_KEY};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults and a short retry backoff
    pub fn new() -> Self {
        let mut config = Config::default();
        config.server.listen_address = Some(SocketAddr::from(([127, 0, 0, 1], 0)));
        config.generation.retry_backoff = Duration::from_millis(10);

        Self { config }
    }

    /// Point the text provider at a mock backend
    pub fn with_text_provider(mut self, base_url: &str) -> Self {
        let text = &mut self.config.providers.text;
        text.api_key = Some(SecretString::from(TEXT_API_KEY));
        text.base_url = Some(base_url.parse().expect("valid URL"));
        self
    }

    /// Point the inference provider at a mock backend
    pub fn with_inference_provider(mut self, base_url: &str) -> Self {
        let inference = &mut self.config.providers.inference;
        inference.api_token = Some(SecretString::from(INFERENCE_TOKEN));
        inference.base_url = Some(base_url.parse().expect("valid URL"));
        self
    }

    /// Verify caller tokens signed with `secret`
    pub fn with_identity(mut self, secret: &str) -> Self {
        self.config.identity = Some(identity_config(secret));
        self
    }

    /// Override the access policy for one kind
    pub fn with_policy(mut self, kind: Kind, policy: KindPolicy) -> Self {
        let policies = &mut self.config.generation.policies;
        let slot = match kind {
            Kind::Chat => &mut policies.chat,
            Kind::Code => &mut policies.code,
            Kind::Image => &mut policies.image,
            Kind::Music => &mut policies.music,
            Kind::Video => &mut policies.video,
        };
        *slot = policy;
        self
    }

    /// Set the per-call upstream deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.generation.timeout = timeout;
        self
    }

    /// Set the largest accepted request body
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.config.server.body_limit_bytes = bytes;
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}

fn identity_config(secret: &str) -> IdentityConfig {
    IdentityConfig {
        secret: SecretString::from(secret),
        issuer: None,
        audience: None,
        session_cookie: "__session".to_owned(),
        leeway_seconds: 5,
    }
}
