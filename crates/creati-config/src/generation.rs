use std::time::Duration;

use creati_core::Kind;
use serde::{Deserialize, Deserializer};

/// Generation proxy behavior shared by every kind
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Upper bound on a single upstream call (e.g. "120s")
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    /// Whether a transient upstream failure is retried once
    #[serde(default = "default_true")]
    pub retry: bool,
    /// Pause before the retry attempt (e.g. "500ms")
    #[serde(default = "default_retry_backoff", deserialize_with = "deserialize_duration")]
    pub retry_backoff: Duration,
    /// Largest image count accepted in a single request
    #[serde(default = "default_max_images")]
    pub max_images: u32,
    /// Per-kind access policy
    #[serde(default)]
    pub policies: KindPolicies,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            retry: true,
            retry_backoff: default_retry_backoff(),
            max_images: default_max_images(),
            policies: KindPolicies::default(),
        }
    }
}

/// Access policy for every kind
///
/// Defaults require a verified caller for music and video only. Chat, code
/// and image stay open until the product decides otherwise.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KindPolicies {
    pub chat: KindPolicy,
    pub code: KindPolicy,
    pub image: KindPolicy,
    pub music: KindPolicy,
    pub video: KindPolicy,
}

impl Default for KindPolicies {
    fn default() -> Self {
        Self {
            chat: KindPolicy::open(),
            code: KindPolicy::open(),
            image: KindPolicy::open(),
            music: KindPolicy::authenticated(),
            video: KindPolicy::authenticated(),
        }
    }
}

impl KindPolicies {
    /// Policy for a kind
    pub const fn get(&self, kind: Kind) -> &KindPolicy {
        match kind {
            Kind::Chat => &self.chat,
            Kind::Code => &self.code,
            Kind::Image => &self.image,
            Kind::Music => &self.music,
            Kind::Video => &self.video,
        }
    }

    /// Policy that applies the same rule to every kind
    pub const fn uniform(policy: KindPolicy) -> Self {
        Self {
            chat: policy,
            code: policy,
            image: policy,
            music: policy,
            video: policy,
        }
    }
}

/// Access policy for a single kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KindPolicy {
    /// Reject callers without a verified identity
    pub require_auth: bool,
}

impl KindPolicy {
    /// Anyone may call
    pub const fn open() -> Self {
        Self { require_auth: false }
    }

    /// Only verified callers may call
    pub const fn authenticated() -> Self {
        Self { require_auth: true }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    duration_str::parse(&raw).map_err(|e| serde::de::Error::custom(format!("invalid duration '{raw}': {e}")))
}

#[allow(clippy::missing_const_for_fn)]
fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

#[allow(clippy::missing_const_for_fn)]
fn default_retry_backoff() -> Duration {
    Duration::from_millis(500)
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_images() -> u32 {
    8
}

#[allow(clippy::missing_const_for_fn)]
fn default_true() -> bool {
    true
}
