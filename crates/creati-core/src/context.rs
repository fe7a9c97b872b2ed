use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Runtime context for a generation request
///
/// Built by the server middleware and handed to the generation proxy
/// alongside the raw request body
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// HTTP request parts (method, URI, headers, extensions)
    pub parts: http::request::Parts,
    /// Authentication state from identity token validation
    pub authentication: Authentication,
}

impl RequestContext {
    /// Create a minimal context for non-HTTP use
    ///
    /// Contains empty headers and an anonymous caller
    pub fn empty() -> Self {
        let (parts, ()) = http::Request::builder()
            .method(http::Method::POST)
            .uri("/")
            .body(())
            .expect("valid minimal request")
            .into_parts();

        Self {
            parts,
            authentication: Authentication::default(),
        }
    }

    /// Create a context carrying an already verified identity
    pub fn authenticated(token: IdentityToken) -> Self {
        let mut context = Self::empty();
        context.authentication.identity = Some(token);
        context
    }

    /// Identifier of the verified caller, if any
    pub fn caller_id(&self) -> Option<&str> {
        self.authentication.caller_id()
    }
}

/// Authentication state extracted from incoming requests
#[derive(Default, Clone, Debug)]
pub struct Authentication {
    /// Verified identity token, if the request carried a valid one
    pub identity: Option<IdentityToken>,
}

impl Authentication {
    /// Subject of the verified identity token
    pub fn caller_id(&self) -> Option<&str> {
        self.identity
            .as_ref()
            .and_then(|token| token.claims().custom.subject.as_deref())
            .filter(|subject| !subject.is_empty())
    }
}

/// Verified identity token with raw and parsed representations
#[derive(Clone, Debug)]
pub struct IdentityToken {
    /// Raw token string
    pub raw: SecretString,
    /// Parsed and validated JWT
    pub token: jwt_compact::Token<CallerClaims>,
}

impl std::ops::Deref for IdentityToken {
    type Target = jwt_compact::Token<CallerClaims>;
    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

/// Identity claims issued by the session provider
#[serde_with::serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallerClaims {
    /// Issuer
    #[serde(default, rename = "iss", skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// Audience (single value or array)
    #[serde_as(deserialize_as = "Option<serde_with::OneOrMany<_>>")]
    #[serde(default, rename = "aud", skip_serializing_if = "Option::is_none")]
    pub audience: Option<Vec<String>>,
    /// Subject, the caller's opaque user id
    #[serde(default, rename = "sub", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl CallerClaims {
    /// Claims for a plain subject
    pub fn for_subject(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            ..Self::default()
        }
    }

    /// Whether any audience entry matches one of the accepted values
    pub fn has_audience(&self, accepted: &[String]) -> bool {
        self.audience
            .as_ref()
            .is_some_and(|audiences| audiences.iter().any(|aud| accepted.contains(aud)))
    }
}
