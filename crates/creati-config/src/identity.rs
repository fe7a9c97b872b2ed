use secrecy::SecretString;
use serde::Deserialize;

/// Identity provider configuration for verifying caller session tokens
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// HMAC secret shared with the identity provider (HS256)
    pub secret: SecretString,
    /// Expected issuer claim value
    #[serde(default)]
    pub issuer: Option<String>,
    /// Accepted audience values; any match passes
    #[serde(default)]
    pub audience: Option<Vec<String>>,
    /// Cookie carrying the session token when no bearer header is sent
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    /// Clock skew tolerated on expiry checks, in seconds
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

fn default_session_cookie() -> String {
    "__session".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_leeway() -> u64 {
    5
}
