//! Service middleware for request metrics.
//!
//! ## Metrics Exposed (as structured log events)
//!
//! - `request` - path pattern, method, status and latency of every request
//! - `resolution` - which table answered a lookup

use axum::{extract::Request, middleware::Next, response::Response};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::info;

use crate::cache::{Resolution, ResolutionSource};

/// Metrics middleware that records request counts and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "redirect_kernel::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

/// Normalize a path for metrics to avoid high cardinality.
///
/// Document URLs collapse to `/:locale/docs/*`.
fn normalize_path(path: &str) -> String {
    static DOCUMENT: OnceLock<Option<regex_lite::Regex>> = OnceLock::new();
    let pattern = DOCUMENT.get_or_init(|| regex_lite::Regex::new(r"^/[^/]+/docs(/.*)?$").ok());

    match pattern {
        Some(re) if re.is_match(path) => "/:locale/docs/*".to_string(),
        _ => path.to_string(),
    }
}

/// Record which table answered a lookup.
pub fn record_resolution(resolution: &Resolution) {
    let source = match resolution.source {
        ResolutionSource::Table => "table",
        ResolutionSource::Fundamental(_) => "fundamental",
        ResolutionSource::Unchanged => "unchanged",
    };
    info!(
        target: "redirect_kernel::metrics",
        metric_type = "resolution",
        source = source,
        "resolution_metric"
    );
}
