//! # Blob Retrieval API
//!
//! Serves stored block photos and QR identity artifacts. References are
//! validated before touching the filesystem, so a request can never read
//! outside the blob root.
//!
//! ## Endpoints
//!
//! - `GET /v1/blobs/:kind/:name` — fetch a stored blob

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use quarry_blob::{BlobError, BlobRef};

use crate::error::AppError;
use crate::state::AppState;

/// Build the blobs router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/blobs/:kind/:name", get(fetch_blob))
}

/// Content type for a blob, from its extension.
fn content_type_for(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// GET /v1/blobs/:kind/:name — Fetch a stored blob.
///
/// Malformed references and absent blobs both return 404; the response
/// does not distinguish "never valid" from "not stored".
#[utoipa::path(
    get,
    path = "/v1/blobs/{kind}/{name}",
    params(
        ("kind" = String, Path, description = "Blob kind: images or artifacts"),
        ("name" = String, Path, description = "Digest-named blob file"),
    ),
    responses(
        (status = 200, description = "Blob content"),
        (status = 404, description = "Blob not found", body = crate::error::ErrorBody),
    ),
    tag = "blobs"
)]
pub(crate) async fn fetch_blob(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let raw = format!("{kind}/{name}");
    let reference = BlobRef::parse(&raw)
        .map_err(|_| AppError::NotFound(format!("blob {raw} not found")))?;

    let bytes = match state.blobs.retrieve(&reference).await {
        Ok(bytes) => bytes,
        Err(BlobError::NotFound(_)) => {
            return Err(AppError::NotFound(format!("blob {raw} not found")))
        }
        Err(e) => return Err(AppError::Internal(format!("blob retrieval failed: {e}"))),
    };

    Ok(([(header::CONTENT_TYPE, content_type_for(&name))], bytes))
}
