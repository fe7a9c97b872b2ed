use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use creati_config::IdentityConfig;
use creati_core::{Authentication, CallerClaims, IdentityToken};
use http::HeaderMap;
use jwt_compact::{
    AlgorithmExt, TimeOptions, UntrustedToken,
    alg::{Hs256, Hs256Key},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Why a presented identity token was not accepted
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token rejected: {0}")]
    Invalid(String),
    #[error("token issuer does not match")]
    Issuer,
    #[error("token audience does not match")]
    Audience,
}

/// Verifies session tokens issued by the identity provider
pub struct IdentityVerifier {
    key: Hs256Key,
    issuer: Option<String>,
    audience: Option<Vec<String>>,
    session_cookie: String,
    time_options: TimeOptions,
}

impl IdentityVerifier {
    pub fn new(config: &IdentityConfig) -> Self {
        let leeway = i64::try_from(config.leeway_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(|| {
                tracing::warn!(leeway_seconds = config.leeway_seconds, "identity leeway out of range, using none");
                chrono::Duration::zero()
            });

        Self {
            key: Hs256Key::new(config.secret.expose_secret().as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            session_cookie: config.session_cookie.clone(),
            time_options: TimeOptions::from_leeway(leeway),
        }
    }

    /// Token presented by the request: bearer header first, then the session cookie
    pub fn token_from<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        let bearer = headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .filter(|token| !token.is_empty());

        bearer.or_else(|| session_cookie(headers, &self.session_cookie))
    }

    /// Check signature, lifetime, issuer and audience
    pub fn verify(&self, raw: &str) -> Result<IdentityToken, IdentityError> {
        let untrusted = UntrustedToken::new(raw).map_err(|e| IdentityError::Malformed(e.to_string()))?;

        let token = Hs256
            .validator::<CallerClaims>(&self.key)
            .validate(&untrusted)
            .map_err(|e| IdentityError::Invalid(e.to_string()))?;

        let claims = token.claims();
        claims
            .validate_expiration(&self.time_options)
            .map_err(|e| IdentityError::Invalid(e.to_string()))?;
        if claims.not_before.is_some() {
            claims
                .validate_maturity(&self.time_options)
                .map_err(|e| IdentityError::Invalid(e.to_string()))?;
        }

        if let Some(ref issuer) = self.issuer
            && claims.custom.issuer.as_ref() != Some(issuer)
        {
            return Err(IdentityError::Issuer);
        }

        if let Some(ref audience) = self.audience
            && !claims.custom.has_audience(audience)
        {
            return Err(IdentityError::Audience);
        }

        Ok(IdentityToken {
            raw: SecretString::from(raw.to_string()),
            token,
        })
    }

    fn authenticate(&self, headers: &HeaderMap) -> Authentication {
        let Some(raw) = self.token_from(headers) else {
            return Authentication::default();
        };

        match self.verify(raw) {
            Ok(token) => Authentication { identity: Some(token) },
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unverifiable identity token");
                Authentication::default()
            }
        }
    }
}

fn session_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

/// Resolve the caller identity and record it for the generation handlers
///
/// Never rejects: a missing or invalid token leaves the caller anonymous and
/// each kind's policy decides whether that matters.
pub async fn identity_middleware(
    State(verifier): State<Arc<IdentityVerifier>>,
    mut request: Request,
    next: Next,
) -> Response {
    let authentication = verifier.authenticate(request.headers());

    if let Some(caller) = authentication.caller_id() {
        tracing::debug!(caller, "identity verified");
    }

    request.extensions_mut().insert(authentication);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jwt_compact::{Claims, Header};

    use super::*;

    const SECRET: &str = "identity-test-secret";

    fn config(extra: &str) -> IdentityConfig {
        toml::from_str(&format!("secret = \"{SECRET}\"\n{extra}")).unwrap()
    }

    fn token(claims: CallerClaims, ttl: Duration, secret: &str) -> String {
        let claims = Claims::new(claims).set_duration_and_issuance(&TimeOptions::default(), ttl);
        Hs256.token(&Header::empty(), &claims, &Hs256Key::new(secret.as_bytes())).unwrap()
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        headers
    }

    #[test]
    fn valid_bearer_token_identifies_the_caller() {
        let verifier = IdentityVerifier::new(&config(""));
        let raw = token(CallerClaims::for_subject("user_42"), Duration::minutes(5), SECRET);

        let authentication = verifier.authenticate(&bearer(&raw));
        assert_eq!(authentication.caller_id(), Some("user_42"));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        let verifier = IdentityVerifier::new(&config(""));
        let raw = token(CallerClaims::for_subject("user_42"), Duration::minutes(5), SECRET);

        for scheme in ["bearer", "BEARER"] {
            let mut headers = HeaderMap::new();
            headers.insert(http::header::AUTHORIZATION, format!("{scheme} {raw}").parse().unwrap());
            assert_eq!(verifier.authenticate(&headers).caller_id(), Some("user_42"));
        }

        let mut headers = HeaderMap::new();
        headers.insert(http::header::AUTHORIZATION, format!("Basic {raw}").parse().unwrap());
        assert!(verifier.token_from(&headers).is_none());
    }

    #[test]
    fn out_of_range_leeway_falls_back_to_none() {
        let verifier = IdentityVerifier::new(&config("leeway_seconds = 100000000000000000"));
        let raw = token(CallerClaims::for_subject("user_42"), Duration::minutes(-5), SECRET);

        assert!(matches!(verifier.verify(&raw), Err(IdentityError::Invalid(_))));
    }

    #[test]
    fn session_cookie_is_read_when_no_bearer() {
        let verifier = IdentityVerifier::new(&config(""));
        let raw = token(CallerClaims::for_subject("user_7"), Duration::minutes(5), SECRET);

        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::COOKIE,
            format!("theme=dark; __session={raw}; other=1").parse().unwrap(),
        );

        assert_eq!(verifier.token_from(&headers), Some(raw.as_str()));
        assert_eq!(verifier.authenticate(&headers).caller_id(), Some("user_7"));
    }

    #[test]
    fn wrong_secret_is_anonymous() {
        let verifier = IdentityVerifier::new(&config(""));
        let raw = token(CallerClaims::for_subject("user_42"), Duration::minutes(5), "someone-else");

        assert!(matches!(verifier.verify(&raw), Err(IdentityError::Invalid(_))));
        assert!(verifier.authenticate(&bearer(&raw)).caller_id().is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = IdentityVerifier::new(&config("leeway_seconds = 0"));
        let raw = token(CallerClaims::for_subject("user_42"), Duration::minutes(-5), SECRET);

        assert!(matches!(verifier.verify(&raw), Err(IdentityError::Invalid(_))));
    }

    #[test]
    fn issuer_and_audience_are_enforced_when_configured() {
        let verifier = IdentityVerifier::new(&config(
            "issuer = \"https://clerk.creati.ai\"\naudience = [\"creati\"]",
        ));

        let mut claims = CallerClaims::for_subject("user_42");
        let raw = token(claims.clone(), Duration::minutes(5), SECRET);
        assert!(matches!(verifier.verify(&raw), Err(IdentityError::Issuer)));

        claims.issuer = Some("https://clerk.creati.ai".to_string());
        let raw = token(claims.clone(), Duration::minutes(5), SECRET);
        assert!(matches!(verifier.verify(&raw), Err(IdentityError::Audience)));

        claims.audience = Some(vec!["creati".to_string()]);
        let raw = token(claims, Duration::minutes(5), SECRET);
        assert!(verifier.verify(&raw).is_ok());
    }

    #[test]
    fn garbage_is_malformed() {
        let verifier = IdentityVerifier::new(&config(""));
        assert!(matches!(verifier.verify("not-a-jwt"), Err(IdentityError::Malformed(_))));
        assert!(verifier.token_from(&HeaderMap::new()).is_none());
    }
}
