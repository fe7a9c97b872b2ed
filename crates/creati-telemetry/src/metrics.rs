//! Generation metric names and recording helpers

use std::time::Instant;

use creati_core::Kind;
use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram};

pub const GENERATION_REQUEST_COUNT: &str = "generation.request.count";
pub const GENERATION_REQUEST_DURATION: &str = "generation.request.duration";
pub const GENERATION_UPSTREAM_ATTEMPTS: &str = "generation.upstream.attempts";

/// Instruments recorded by the generation proxy
///
/// Built from the global meter provider, so instruments are no-ops until
/// telemetry export is configured
#[derive(Clone)]
pub struct GenerationMetrics {
    requests: Counter<u64>,
    duration: Histogram<f64>,
    upstream_attempts: Counter<u64>,
}

impl GenerationMetrics {
    pub fn new() -> Self {
        let meter = opentelemetry::global::meter("creati");

        Self {
            requests: meter
                .u64_counter(GENERATION_REQUEST_COUNT)
                .with_description("Generation requests by kind and outcome")
                .build(),
            duration: meter
                .f64_histogram(GENERATION_REQUEST_DURATION)
                .with_description("Generation request latency")
                .with_unit("s")
                .build(),
            upstream_attempts: meter
                .u64_counter(GENERATION_UPSTREAM_ATTEMPTS)
                .with_description("Upstream provider calls, including retries")
                .build(),
        }
    }

    /// Record a finished request
    pub fn record_request(&self, kind: Kind, outcome: &'static str, start: Instant) {
        let attributes = [
            KeyValue::new("kind", kind.to_string()),
            KeyValue::new("outcome", outcome),
        ];
        self.requests.add(1, &attributes);
        self.duration.record(start.elapsed().as_secs_f64(), &attributes);
    }

    /// Record one call to an upstream provider
    pub fn record_upstream_attempt(&self, kind: Kind, provider: &str) {
        self.upstream_attempts.add(
            1,
            &[KeyValue::new("kind", kind.to_string()), KeyValue::new("provider", provider.to_string())],
        );
    }
}

impl Default for GenerationMetrics {
    fn default() -> Self {
        Self::new()
    }
}
