//! Session tokens as the identity provider would issue them

use chrono::Duration;
use creati_core::CallerClaims;
use jwt_compact::{
    AlgorithmExt, Claims, Header, TimeOptions,
    alg::{Hs256, Hs256Key},
};

/// Shared secret used by identity-enabled test servers
pub const IDENTITY_SECRET: &str = "integration-identity-secret";

/// A valid token for `subject`, signed with `secret`
pub fn session_token(secret: &str, subject: &str) -> String {
    token_with_ttl(secret, subject, Duration::minutes(10))
}

/// A token whose expiry lies `ttl` from now (negative for expired)
pub fn token_with_ttl(secret: &str, subject: &str, ttl: Duration) -> String {
    let claims = Claims::new(CallerClaims::for_subject(subject)).set_duration_and_issuance(&TimeOptions::default(), ttl);
    Hs256
        .token(&Header::empty(), &claims, &Hs256Key::new(secret.as_bytes()))
        .expect("token signing")
}
