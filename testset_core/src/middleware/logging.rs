//! Per-request tracing for the test-set routes

use axum::{body::Body, Router};
use http::{Request, Response};
use std::time::Duration;
use tower_http::{classify::ServerErrorsFailureClass, trace::TraceLayer};
use tracing::{field, info_span, Span};

/// Wraps `router` in a span per request.
///
/// The span carries empty `testset_file` and `rows` fields that handlers fill
/// in through [`record_testset_file`] and [`record_rows`].
pub fn with_request_logging<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            info_span!(
                "testset_request",
                method = %request.method(),
                path = %request.uri().path(),
                testset_file = field::Empty,
                rows = field::Empty,
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::debug!("started {} {}", request.method(), request.uri().path());
        })
        .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
            let status = response.status().as_u16();
            let latency_ms = latency.as_millis();

            if response.status().is_client_error() {
                tracing::warn!(status, latency_ms, "request rejected");
            } else {
                tracing::info!(status, latency_ms, "request finished");
            }
        })
        .on_failure(|error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
            tracing::error!(latency_ms = latency.as_millis(), error = ?error, "request failed");
        });

    router.layer(layer)
}

pub fn record_testset_file(filename: &str) {
    Span::current().record("testset_file", filename);
}

pub fn record_rows(rows: usize) {
    Span::current().record("rows", rows);
}
