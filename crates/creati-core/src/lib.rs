//! Shared request context and error contracts for the Creati gateway

mod context;
mod error;
mod kind;

pub use context::{Authentication, CallerClaims, IdentityToken, RequestContext};
pub use error::HttpError;
pub use kind::Kind;
