#![allow(clippy::must_use_candidate)]

pub mod cors;
mod env;
pub mod generation;
pub mod identity;
mod loader;
pub mod providers;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use cors::*;
pub use generation::*;
pub use identity::*;
pub use providers::*;
pub use server::*;
pub use telemetry::TelemetryConfig;

/// Top-level Creati gateway configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Identity provider configuration; absent means every caller is anonymous
    #[serde(default)]
    pub identity: Option<IdentityConfig>,
    /// Upstream provider credentials and endpoints
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Per-kind policy, timeouts and retries
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
