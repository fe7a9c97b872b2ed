use std::time::Duration;

use serde::Deserialize;

/// CORS configuration for browser clients
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins ("*" or a list)
    #[serde(default)]
    pub origins: AnyOrList,
    /// Allowed HTTP methods ("*" or a list)
    #[serde(default)]
    pub methods: AnyOrList,
    /// Allowed request headers ("*" or a list)
    #[serde(default)]
    pub headers: AnyOrList,
    /// Response headers readable by the browser
    #[serde(default = "default_expose_headers")]
    pub expose_headers: Vec<String>,
    /// Allow credentials (cookies carrying the session token)
    #[serde(default)]
    pub credentials: bool,
    /// Preflight cache lifetime in seconds
    #[serde(default)]
    pub max_age: Option<u64>,
}

impl CorsConfig {
    /// Preflight cache lifetime
    pub fn max_age_duration(&self) -> Option<Duration> {
        self.max_age.map(Duration::from_secs)
    }
}

/// Either the wildcard or an explicit list of values
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawList")]
pub enum AnyOrList {
    /// Match any value
    #[default]
    Any,
    /// Explicit list
    List(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawList {
    One(String),
    Many(Vec<String>),
}

impl From<RawList> for AnyOrList {
    fn from(raw: RawList) -> Self {
        let values = match raw {
            RawList::One(value) => vec![value],
            RawList::Many(values) => values,
        };

        if values.iter().any(|v| v == "*") {
            Self::Any
        } else {
            Self::List(values)
        }
    }
}

fn default_expose_headers() -> Vec<String> {
    vec!["content-type".to_string(), "content-length".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_string_means_any() {
        let config: CorsConfig = toml::from_str(r#"origins = "*""#).unwrap();
        assert_eq!(config.origins, AnyOrList::Any);
        assert_eq!(config.methods, AnyOrList::Any);
    }

    #[test]
    fn wildcard_inside_list_means_any() {
        let config: CorsConfig = toml::from_str(r#"origins = ["https://creati.ai", "*"]"#).unwrap();
        assert_eq!(config.origins, AnyOrList::Any);
    }

    #[test]
    fn explicit_origins_and_exposed_framing_headers() {
        let config: CorsConfig = toml::from_str(
            r#"
            origins = ["https://creati.ai"]
            max_age = 600
            "#,
        )
        .unwrap();
        assert_eq!(config.origins, AnyOrList::List(vec!["https://creati.ai".to_string()]));
        assert_eq!(config.expose_headers, vec!["content-type", "content-length"]);
        assert_eq!(config.max_age_duration(), Some(Duration::from_secs(600)));
    }
}
