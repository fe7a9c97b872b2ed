mod auth;
mod cors;
mod health;

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use creati_config::Config;
use http::StatusCode;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

pub use auth::{IdentityError, IdentityVerifier};

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the generation proxy fails to initialize
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let generation = creati_generation::build_server(config)?;
        Ok(Self::with_generation(config, generation))
    }

    /// Build the server around an already constructed generation proxy
    pub fn with_generation(config: &Config, generation: Arc<creati_generation::Server>) -> Self {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let mut app = Router::new();

        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        app = app.merge(creati_generation::endpoint_router().with_state(generation));

        // Apply middleware layers (innermost first)

        // Identity (innermost, runs just before handlers)
        if let Some(ref identity) = config.identity {
            let verifier = Arc::new(IdentityVerifier::new(identity));
            app = app.layer(axum::middleware::from_fn_with_state(verifier, auth::identity_middleware));
        } else {
            tracing::info!("no identity configured; every caller is anonymous");
        }

        app = app.layer(TraceLayer::new_for_http());

        if let Some(ref cors_config) = config.server.cors {
            app = app.layer(cors::cors_layer(cors_config));
        }

        // Outermost, so a panic anywhere below still yields the error envelope
        app = app.layer(CatchPanicLayer::custom(panic_response));

        Self {
            router: app,
            listen_address,
        }
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");

    tracing::error!(panic = detail, "request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Internal server error" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    async fn get(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(http::Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let router = Server::new(&Config::default()).unwrap().into_router();
        assert_eq!(get(router, "/health").await, (StatusCode::OK, "ok".to_string()));
    }

    #[tokio::test]
    async fn health_can_be_disabled() {
        let mut config = Config::default();
        config.server.health.enabled = false;

        let router = Server::new(&config).unwrap().into_router();
        assert_eq!(get(router, "/health").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn panics_become_the_internal_error_envelope() {
        let router: Router = Router::new()
            .route(
                "/boom",
                axum::routing::get(|| async {
                    if true {
                        panic!("handler exploded");
                    }
                    "unreachable"
                }),
            )
            .layer(CatchPanicLayer::custom(panic_response));

        let (status, body) = get(router, "/boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"error":"Internal server error"}"#);
    }
}
