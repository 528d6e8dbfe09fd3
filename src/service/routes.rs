//! Axum routes for the redirect service.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};

use crate::cache::ResolutionSource;
use crate::documents::{DocumentStore, FsDocumentStore};
use crate::fundamental::MOVED_PERMANENTLY;

use super::middleware::record_resolution;
use super::state::ServiceState;

/// Type alias for the service state with the filesystem document store.
pub type AppState = ServiceState<FsDocumentStore>;

/// Characters escaped in a `Location` header.
const LOCATION: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to resolve a batch of URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectsRequest {
    /// URLs to resolve.
    #[serde(default)]
    pub urls: Option<Vec<String>>,
}

/// Batch resolution result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectsResponse {
    /// URL -> resolved URL, or `null` when it does not redirect.
    pub redirects: BTreeMap<String, Option<String>>,
}

/// Query for a single resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveQuery {
    /// URL to resolve.
    pub url: String,
}

/// Single resolution result.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveResponse {
    /// URL as requested.
    pub url: String,
    /// Where it resolves (the URL itself when not redirecting).
    pub resolved: String,
    /// Whether it redirects.
    pub redirects: bool,
    /// Which table answered.
    pub source: ResolutionSource,
}

/// Proposed redirect to validate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    /// From-URL.
    pub from: String,
    /// To-URL.
    pub to: String,
}

/// Validation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    /// Whether both ends are acceptable.
    pub valid: bool,
    /// One message per failing end.
    pub errors: Vec<String>,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Redirect table summary; absent when the files do not load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirects: Option<TableHealth>,
    pub fundamental_rules: usize,
}

/// Redirect table information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableHealth {
    pub files: usize,
    pub entries: usize,
    pub fingerprint: String,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Readiness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub details: Option<String>,
}

/// Structured error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        tracing::warn!(code = %self.code, error = %self.error, "Request error");
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Resolve a batch of URLs.
async fn redirects_handler<D: DocumentStore + 'static>(
    State(state): State<Arc<ServiceState<D>>>,
    Json(request): Json<RedirectsRequest>,
) -> Result<Json<RedirectsResponse>, ErrorResponse> {
    let urls = request
        .urls
        .ok_or_else(|| ErrorResponse::new("MISSING_URLS", "No .urls array sent in JSON"))?;

    let redirects = urls
        .into_iter()
        .map(|url| {
            let resolution = state.engine.lookup(&url);
            record_resolution(&resolution);
            let target = resolution.is_redirect().then_some(resolution.target);
            (url, target)
        })
        .collect();

    Ok(Json(RedirectsResponse { redirects }))
}

/// Resolve one URL.
async fn resolve_handler<D: DocumentStore + 'static>(
    State(state): State<Arc<ServiceState<D>>>,
    Query(query): Query<ResolveQuery>,
) -> Json<ResolveResponse> {
    let resolution = state.engine.lookup(&query.url);
    record_resolution(&resolution);
    Json(ResolveResponse {
        redirects: resolution.is_redirect(),
        source: resolution.source,
        resolved: resolution.target,
        url: query.url,
    })
}

/// Validate both ends of a proposed redirect.
async fn validate_handler<D: DocumentStore + 'static>(
    State(state): State<Arc<ServiceState<D>>>,
    Json(request): Json<ValidateRequest>,
) -> Json<ValidateResponse> {
    let mut errors = Vec::new();
    if let Err(e) = state.engine.validate_from_url(&request.from) {
        errors.push(format!("from: {}", e));
    }
    if let Err(e) = state.engine.validate_to_url(&request.to) {
        errors.push(format!("to: {}", e));
    }
    Json(ValidateResponse {
        valid: errors.is_empty(),
        errors,
    })
}

/// Health check endpoint (detailed).
async fn health_handler<D: DocumentStore + 'static>(
    State(state): State<Arc<ServiceState<D>>>,
) -> Json<HealthResponse> {
    let cache = state.engine.cache();
    let redirects = cache.try_table().ok().map(|table| TableHealth {
        files: table.files(),
        entries: table.len(),
        fingerprint: table.fingerprint().to_string(),
    });

    Json(HealthResponse {
        status: if redirects.is_some() { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        redirects,
        fundamental_rules: cache.fundamental().len(),
    })
}

/// Liveness probe endpoint. Does NOT check the redirect files.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 once the redirect files load, 503 otherwise.
async fn readiness_handler<D: DocumentStore + 'static>(
    State(state): State<Arc<ServiceState<D>>>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    match state.engine.cache().try_table() {
        Ok(table) => Ok(Json(ReadinessResponse {
            ready: true,
            details: Some(format!("{} redirects from {} files", table.len(), table.files())),
        })),
        Err(e) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                details: Some(e.to_string()),
            }),
        )),
    }
}

/// Redirect any other URL that resolves elsewhere.
async fn fallback_handler<D: DocumentStore + 'static>(
    State(state): State<Arc<ServiceState<D>>>,
    uri: Uri,
) -> Response {
    let resolution = state.engine.lookup(uri.path());
    record_resolution(&resolution);

    let status = match resolution.source {
        ResolutionSource::Unchanged => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("NOT_FOUND", "Not found").with_details(uri.path().to_string())),
            )
                .into_response();
        }
        ResolutionSource::Table => MOVED_PERMANENTLY,
        ResolutionSource::Fundamental(status) => status,
    };

    let mut location = utf8_percent_encode(&resolution.target, LOCATION).to_string();
    if let Some(query) = uri.query() {
        location.push('?');
        location.push_str(query);
    }
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::MOVED_PERMANENTLY);
    (status, [(header::LOCATION, location)]).into_response()
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the redirect service.
pub fn create_router<D: DocumentStore + 'static>(state: ServiceState<D>) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Resolution
        .route("/_redirects", post(redirects_handler::<D>))
        .route("/api/resolve", get(resolve_handler::<D>))
        .route("/api/validate", post(validate_handler::<D>))
        // Health checks
        .route("/health", get(health_handler::<D>))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler::<D>))
        .fallback(fallback_handler::<D>)
        .with_state(state)
}
