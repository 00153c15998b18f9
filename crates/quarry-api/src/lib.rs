//! # quarry-api — Axum API Service for the Quarry Stack
//!
//! The HTTP surface over the block registry: registration with QR
//! identity issuance, the guarded dispatch operation, and the
//! buyer-facing catalog filter.
//!
//! ## API Surface
//!
//! | Prefix                    | Module              | Domain                    |
//! |---------------------------|---------------------|---------------------------|
//! | `/v1/blocks/*`            | [`routes::blocks`]  | Registry and dispatch     |
//! | `/v1/catalog`             | [`routes::catalog`] | Catalog filter/sort       |
//! | `/v1/blobs/*`             | [`routes::blobs`]   | Photos and QR artifacts   |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Auto-generated OpenAPI spec via utoipa derive macros at `/openapi.json`.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Upload limit for registration bodies. Block photos from yard phones
/// run a few megabytes; 10 MiB leaves headroom.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    // Authenticated API routes.
    let api = Router::new()
        .merge(routes::blocks::router())
        .merge(routes::catalog::router())
        .merge(routes::blobs::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state.clone());

    // Unauthenticated health probes.
    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .with_state(state);

    Router::new().merge(health).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the database is reachable when one is
/// configured. In-memory mode is always ready.
async fn readiness(State(state): State<AppState>) -> Response {
    if let Some(pool) = &state.db_pool {
        if let Err(error) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(%error, "readiness probe: database unreachable");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }
    "ready".into_response()
}
