//! # Catalog API
//!
//! The read-side filter surface over the block inventory. Dispatched
//! blocks never appear here; buyers only see what is physically in the
//! yard.
//!
//! ## Endpoints
//!
//! - `GET /v1/catalog` — filter and sort available blocks

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use quarry_catalog::{CatalogQuery, RawCatalogQuery};
use quarry_state::StoneBlock;

use crate::error::AppError;
use crate::state::AppState;

/// Catalog query results.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogResponse {
    pub count: usize,
    #[schema(value_type = Vec<Object>)]
    pub blocks: Vec<StoneBlock>,
}

/// Build the catalog router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/catalog", get(query_catalog))
}

/// GET /v1/catalog — Filter and sort available blocks.
///
/// All criteria are optional query parameters; `"all"` and blank values
/// impose no constraint. Criteria compose with AND; keywords match as a
/// case-insensitive substring across name, dimensions, category, and
/// subcategory.
#[utoipa::path(
    get,
    path = "/v1/catalog",
    params(
        ("category" = Option<String>, Query, description = "Exact category match ('all' for none)"),
        ("subcategory" = Option<String>, Query, description = "Exact subcategory match"),
        ("min_price" = Option<f64>, Query, description = "Inclusive lower price bound"),
        ("max_price" = Option<f64>, Query, description = "Inclusive upper price bound"),
        ("stock_availability" = Option<String>, Query, description = "Exact availability label"),
        ("keywords" = Option<String>, Query, description = "Case-insensitive substring search"),
        ("source" = Option<String>, Query, description = "Legacy spelling of category"),
        ("sort_by" = Option<String>, Query, description = "newest | oldest | price_low | price_high | name_asc | name_desc"),
    ),
    responses(
        (status = 200, description = "Matching blocks", body = CatalogResponse),
        (status = 400, description = "Malformed query string", body = crate::error::ErrorBody),
    ),
    tag = "catalog"
)]
pub(crate) async fn query_catalog(
    State(state): State<AppState>,
    raw: Result<Query<RawCatalogQuery>, QueryRejection>,
) -> Result<Json<CatalogResponse>, AppError> {
    let Query(raw) = raw.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let query = CatalogQuery::from_raw(raw);

    let blocks = query.apply(state.blocks.list());
    Ok(Json(CatalogResponse {
        count: blocks.len(),
        blocks,
    }))
}
