use std::path::Path;

use secrecy::ExposeSecret;

use crate::Config;

/// Largest clock skew accepted on identity token checks
const MAX_LEEWAY_SECONDS: u64 = 3600;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text with placeholder expansion
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if limits are out of range or the identity
    /// configuration cannot verify anything
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_generation()?;
        self.validate_identity()?;
        Ok(())
    }

    fn validate_generation(&self) -> anyhow::Result<()> {
        let generation = &self.generation;

        if generation.timeout.is_zero() {
            anyhow::bail!("generation.timeout must be greater than 0");
        }

        if generation.max_images == 0 {
            anyhow::bail!("generation.max_images must be at least 1");
        }

        if self.server.body_limit_bytes == 0 {
            anyhow::bail!("server.body_limit_bytes must be greater than 0");
        }

        Ok(())
    }

    fn validate_identity(&self) -> anyhow::Result<()> {
        let Some(ref identity) = self.identity else {
            return Ok(());
        };

        if identity.secret.expose_secret().is_empty() {
            anyhow::bail!("identity.secret must not be empty");
        }

        if identity.session_cookie.trim().is_empty() {
            anyhow::bail!("identity.session_cookie must not be empty");
        }

        if identity.audience.as_ref().is_some_and(Vec::is_empty) {
            anyhow::bail!("identity.audience must list at least one value when set");
        }

        if identity.leeway_seconds > MAX_LEEWAY_SECONDS {
            anyhow::bail!("identity.leeway_seconds must be at most {MAX_LEEWAY_SECONDS}");
        }

        Ok(())
    }
}
