//! Request spans for the affiliate API.

use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Trace layer wrapped around the affiliate routes when request logging is on.
///
/// Each request gets an `INFO` span with method, URI and version; the
/// response line carries status and latency in milliseconds. Redirects are
/// high volume, so headers are left out of the span to keep reader user
/// agents and cookies out of the log.
///
/// ```text
/// INFO request{method=GET uri=/api/affiliate/redirect?p=P1&pr=X1 version=HTTP/1.1}: finished processing request latency=3 ms status=302
/// ```
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(
            DefaultMakeSpan::new()
                .level(Level::INFO)
                .include_headers(false),
        )
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
}
