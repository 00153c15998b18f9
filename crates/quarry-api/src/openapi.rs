//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quarry Stack API",
        version = "0.1.0",
        description = "Stone block inventory: registration with QR identity issuance, guarded dispatch-by-scan, and the buyer-facing catalog filter.",
        license(name = "Apache-2.0")
    ),
    paths(
        // Blocks
        crate::routes::blocks::register_block,
        crate::routes::blocks::list_blocks,
        crate::routes::blocks::remove_block,
        crate::routes::blocks::get_block_by_token,
        crate::routes::blocks::dispatch_block,
        // Catalog
        crate::routes::catalog::query_catalog,
        // Blobs
        crate::routes::blobs::fetch_blob,
    ),
    components(schemas(
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Block DTOs
        crate::routes::blocks::RegisterBlockResponse,
        crate::routes::blocks::BlockListResponse,
        crate::routes::blocks::RemoveBlockResponse,
        crate::routes::blocks::DispatchRequest,
        crate::routes::blocks::DispatchResponse,
        // Catalog DTOs
        crate::routes::catalog::CatalogResponse,
    )),
    tags(
        (name = "blocks", description = "Block registry — registration, lifecycle, dispatch"),
        (name = "catalog", description = "Catalog query API"),
        (name = "blobs", description = "Blob retrieval API"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
///
/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
