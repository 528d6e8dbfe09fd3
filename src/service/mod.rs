//! Redirect REST Service
//!
//! Exposes redirect resolution and validation over HTTP.
//!
//! ## Endpoints
//!
//! - `POST /_redirects` - Resolve a batch of URLs (`null` for non-redirects)
//! - `GET /api/resolve?url=...` - Resolve one URL
//! - `POST /api/validate` - Validate a proposed redirect
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe (redirect files load cleanly)
//! - anything else - `301` to the resolved URL, or `404`

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, record_resolution};
pub use routes::{create_router, AppState};
pub use state::{ServiceState, StateError};
