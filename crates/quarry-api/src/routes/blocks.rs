//! # Block Registry API
//!
//! Handles block registration, listing, removal, token lookup, and the
//! dispatch operation.
//!
//! ## Endpoints
//!
//! - `POST /v1/blocks` — register a block (multipart: fields + photo)
//! - `GET /v1/blocks` — list all blocks, storage order
//! - `DELETE /v1/blocks/:id` — remove a block and its blobs
//! - `GET /v1/blocks/token/:token` — look up a block by identity token
//! - `POST /v1/blocks/dispatch` — dispatch the block bound to a scanned token
//!
//! ## Registration ordering
//!
//! Validation runs before the identity tag is issued, so invalid input
//! never consumes a token. Blob writes happen before the record becomes
//! visible; if any step fails, already-written blobs are deleted
//! best-effort and no record is inserted.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use quarry_blob::{BlobKind, BlobRef};
use quarry_core::{validate, BlockId, IdentityToken, ValidationError};
use quarry_state::{BlockStatus, StockAvailability, StoneBlock, DEFAULT_GRADE};
use quarry_tag::TagMetadata;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Response to a successful registration.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterBlockResponse {
    /// The new block's record identifier.
    #[schema(value_type = String)]
    pub id: BlockId,
    /// The identity token encoded into the QR artifact.
    #[schema(value_type = String)]
    pub token: IdentityToken,
    /// Blob reference to the rendered QR identity artifact.
    pub artifact_ref: String,
}

/// Response to a block listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct BlockListResponse {
    pub count: usize,
    #[schema(value_type = Vec<Object>)]
    pub blocks: Vec<StoneBlock>,
}

/// Response to a block removal.
///
/// `blob_warnings` reports blobs that could not be deleted; metadata
/// removal proceeds regardless, so the caller learns about orphaned
/// files instead of the request failing halfway.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RemoveBlockResponse {
    pub removed: Uuid,
    pub blob_warnings: Vec<String>,
}

/// Request to dispatch a block by scanned identity token.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DispatchRequest {
    /// The token decoded from the QR artifact.
    pub token: String,
}

impl Validate for DispatchRequest {
    fn validate(&self) -> Result<(), String> {
        if self.token.trim().is_empty() {
            return Err("token must not be empty".to_string());
        }
        Ok(())
    }
}

/// Confirmation returned on successful dispatch.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DispatchResponse {
    #[schema(value_type = String)]
    pub id: BlockId,
    pub name: String,
    pub dimensions: String,
    #[schema(value_type = String)]
    pub status: BlockStatus,
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the blocks router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/blocks", get(list_blocks).post(register_block))
        .route("/v1/blocks/dispatch", post(dispatch_block))
        .route("/v1/blocks/token/:token", get(get_block_by_token))
        .route(
            "/v1/blocks/:id",
            axum::routing::delete(remove_block),
        )
}

// ── Multipart form assembly ─────────────────────────────────────────

/// Raw registration fields collected from the multipart body before
/// validation.
#[derive(Default)]
struct RegistrationForm {
    name: Option<String>,
    dimensions: Option<String>,
    category: Option<String>,
    subcategory: Option<String>,
    price: Option<String>,
    price_unit: Option<String>,
    stock_availability: Option<String>,
    stock_quantity: Option<String>,
    grade: Option<String>,
    image: Option<(Vec<u8>, &'static str)>,
}

/// Map an uploaded image content type to a storage extension.
fn image_ext(content_type: Option<&str>) -> &'static str {
    match content_type {
        Some("image/png") => "png",
        Some("image/jpeg") => "jpg",
        Some("image/webp") => "webp",
        _ => "bin",
    }
}

async fn collect_form(mut multipart: Multipart) -> Result<RegistrationForm, AppError> {
    let mut form = RegistrationForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "image" => {
                let ext = image_ext(field.content_type());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("failed to read image: {e}")))?;
                form.image = Some((bytes.to_vec(), ext));
            }
            name => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("failed to read field '{name}': {e}"))
                })?;
                match name {
                    "name" => form.name = Some(text),
                    "dimensions" => form.dimensions = Some(text),
                    "category" => form.category = Some(text),
                    "subcategory" => form.subcategory = Some(text),
                    "price" => form.price = Some(text),
                    "price_unit" => form.price_unit = Some(text),
                    "stock_availability" => form.stock_availability = Some(text),
                    "stock_quantity" => form.stock_quantity = Some(text),
                    "grade" => form.grade = Some(text),
                    // Unknown fields are ignored so clients can evolve ahead
                    // of the server.
                    _ => {}
                }
            }
        }
    }

    Ok(form)
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/blocks — Register a new block.
#[utoipa::path(
    post,
    path = "/v1/blocks",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Block registered", body = RegisterBlockResponse),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
        (status = 409, description = "Identity token collision", body = crate::error::ErrorBody),
    ),
    tag = "blocks"
)]
pub(crate) async fn register_block(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<RegisterBlockResponse>), AppError> {
    let form = collect_form(multipart).await?;

    // Validate every field before issuing a token: a rejected
    // registration must not consume an identity.
    let name = validate::non_empty("name", form.name.as_deref().unwrap_or(""))?;
    let dimensions = validate::non_empty("dimensions", form.dimensions.as_deref().unwrap_or(""))?;
    let category = validate::non_empty("category", form.category.as_deref().unwrap_or(""))?;
    let subcategory =
        validate::non_empty("subcategory", form.subcategory.as_deref().unwrap_or(""))?;
    let price_unit = validate::non_empty("price_unit", form.price_unit.as_deref().unwrap_or(""))?;
    let price = validate::price("price", form.price.as_deref().unwrap_or(""))?;
    let stock_quantity = validate::quantity("stock_quantity", form.stock_quantity.as_deref())?;

    let availability_label = validate::non_empty(
        "stock_availability",
        form.stock_availability.as_deref().unwrap_or(""),
    )?;
    let stock_availability = StockAvailability::parse(&availability_label).ok_or_else(|| {
        AppError::from(ValidationError::new(
            "stock_availability",
            format!("unknown label '{availability_label}'"),
        ))
    })?;

    let grade = match form.grade.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_GRADE.to_string(),
        Some(raw) => raw.to_string(),
    };

    let (image_bytes, ext) = form
        .image
        .filter(|(bytes, _)| !bytes.is_empty())
        .ok_or_else(|| AppError::from(ValidationError::required("image")))?;

    // Issue the identity: fresh token + rendered QR artifact.
    let issued = quarry_tag::issue(&TagMetadata {
        name: &name,
        dimensions: &dimensions,
        category: &category,
    })?;

    // A token collision surfaces as 409 rather than silently shadowing
    // an existing block. The database UNIQUE constraint enforces the same
    // rule across instances.
    if state.find_by_token(&issued.token).is_some() {
        return Err(AppError::Conflict(
            "identity token already bound to a registered block".to_string(),
        ));
    }

    let artifact_ref = state
        .blobs
        .store(BlobKind::Artifact, &issued.png, "png")
        .await
        .map_err(|e| AppError::Internal(format!("failed to store identity artifact: {e}")))?;

    let image_ref = match state.blobs.store(BlobKind::Image, &image_bytes, ext).await {
        Ok(reference) => reference,
        Err(e) => {
            cleanup_blob(&state, &artifact_ref).await;
            return Err(AppError::Internal(format!("failed to store block image: {e}")));
        }
    };

    let block = StoneBlock {
        id: BlockId::new(),
        identity_token: issued.token.clone(),
        artifact_ref: artifact_ref.to_string(),
        name,
        dimensions,
        category,
        subcategory,
        price,
        price_unit,
        image_ref: image_ref.to_string(),
        stock_availability,
        stock_quantity,
        grade,
        status: BlockStatus::Registered,
        created_at: issued.registered_at,
        updated_at: issued.registered_at,
    };

    // Durable write first: a record must never be visible in memory
    // without a backing row when persistence is configured.
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::blocks::insert(pool, &block).await {
            cleanup_blob(&state, &artifact_ref).await;
            cleanup_blob(&state, &image_ref).await;
            if is_unique_violation(&e) {
                return Err(AppError::Conflict(
                    "identity token already bound to a registered block".to_string(),
                ));
            }
            return Err(AppError::Internal(format!("failed to persist block: {e}")));
        }
    }

    let response = RegisterBlockResponse {
        id: block.id,
        token: block.identity_token.clone(),
        artifact_ref: block.artifact_ref.clone(),
    };
    let id = *block.id.as_uuid();
    state.blocks.insert(id, block);

    tracing::info!(block = %id, "block registered");
    Ok((StatusCode::CREATED, Json(response)))
}

/// Best-effort blob deletion during registration rollback.
async fn cleanup_blob(state: &AppState, reference: &BlobRef) {
    if let Err(e) = state.blobs.delete(reference).await {
        tracing::warn!(blob = %reference, error = %e, "failed to clean up blob after registration failure");
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// GET /v1/blocks — List all blocks.
///
/// Storage order, no sort guarantee; consumers needing an ordering go
/// through the catalog route.
#[utoipa::path(
    get,
    path = "/v1/blocks",
    responses(
        (status = 200, description = "All registered blocks", body = BlockListResponse),
    ),
    tag = "blocks"
)]
pub(crate) async fn list_blocks(State(state): State<AppState>) -> Json<BlockListResponse> {
    let blocks = state.blocks.list();
    Json(BlockListResponse {
        count: blocks.len(),
        blocks,
    })
}

/// DELETE /v1/blocks/:id — Remove a block and its blobs.
#[utoipa::path(
    delete,
    path = "/v1/blocks/{id}",
    params(("id" = Uuid, Path, description = "Block ID")),
    responses(
        (status = 200, description = "Block removed", body = RemoveBlockResponse),
        (status = 404, description = "Block not found", body = crate::error::ErrorBody),
    ),
    tag = "blocks"
)]
pub(crate) async fn remove_block(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RemoveBlockResponse>, AppError> {
    let block = state
        .blocks
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("block {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        crate::db::blocks::delete(pool, id)
            .await
            .map_err(|e| AppError::Internal(format!("failed to delete block row: {e}")))?;
    }
    state.blocks.remove(&id);

    // Blob deletion failures do not abort the removal; they are reported
    // so operators can reclaim orphaned files.
    let mut blob_warnings = Vec::new();
    for raw in [&block.image_ref, &block.artifact_ref] {
        match BlobRef::parse(raw) {
            Ok(reference) => {
                if let Err(e) = state.blobs.delete(&reference).await {
                    tracing::warn!(blob = %reference, error = %e, "failed to delete blob during block removal");
                    blob_warnings.push(format!("{raw}: {e}"));
                }
            }
            Err(e) => blob_warnings.push(format!("{raw}: {e}")),
        }
    }

    tracing::info!(block = %id, warnings = blob_warnings.len(), "block removed");
    Ok(Json(RemoveBlockResponse {
        removed: id,
        blob_warnings,
    }))
}

/// GET /v1/blocks/token/:token — Look up a block by identity token.
#[utoipa::path(
    get,
    path = "/v1/blocks/token/{token}",
    params(("token" = String, Path, description = "Identity token")),
    responses(
        (status = 200, description = "Block found", body = Object),
        (status = 404, description = "No block for token", body = crate::error::ErrorBody),
    ),
    tag = "blocks"
)]
pub(crate) async fn get_block_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<StoneBlock>, AppError> {
    let token = IdentityToken::parse(&token)
        .ok_or_else(|| AppError::Validation("identity token must not be empty".to_string()))?;

    state
        .find_by_token(&token)
        .map(|(_, block)| Json(block))
        .ok_or_else(|| {
            AppError::NotFound("no block registered for the provided identity token".to_string())
        })
}

/// POST /v1/blocks/dispatch — Dispatch the block bound to a scanned token.
///
/// The state transition runs inside a single store write lock, so of any
/// number of concurrent scans of the same tag exactly one succeeds; the
/// rest receive 409 ALREADY_DISPATCHED.
#[utoipa::path(
    post,
    path = "/v1/blocks/dispatch",
    request_body = DispatchRequest,
    responses(
        (status = 200, description = "Block dispatched", body = DispatchResponse),
        (status = 404, description = "No block for token", body = crate::error::ErrorBody),
        (status = 409, description = "Block already dispatched", body = crate::error::ErrorBody),
    ),
    tag = "blocks"
)]
pub(crate) async fn dispatch_block(
    State(state): State<AppState>,
    body: Result<Json<DispatchRequest>, JsonRejection>,
) -> Result<Json<DispatchResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let token = IdentityToken::parse(&req.token)
        .ok_or_else(|| AppError::Validation("token must not be empty".to_string()))?;

    let (id, prior) = state.find_by_token(&token).ok_or_else(|| {
        AppError::NotFound("no block registered for the provided identity token".to_string())
    })?;

    let now = Utc::now();
    let confirmation = match state.blocks.try_update(&id, |block| {
        block.dispatch(now).map(|()| DispatchResponse {
            id: block.id,
            name: block.name.clone(),
            dimensions: block.dimensions.clone(),
            status: block.status,
        })
    }) {
        // Removed between lookup and update.
        None => {
            return Err(AppError::NotFound(
                "no block registered for the provided identity token".to_string(),
            ))
        }
        Some(result) => result?,
    };

    if let Some(pool) = &state.db_pool {
        match crate::db::blocks::dispatch(pool, &token, now).await {
            Ok(true) => {}
            Ok(false) => {
                // The conditional UPDATE found no eligible row. The memory
                // transition already succeeded, so this only happens when
                // another instance dispatched the same token concurrently.
                tracing::warn!(block = %id, "database row already dispatched during write-through");
            }
            Err(e) => {
                // Undo the memory transition: the durable store still shows
                // the block as available, and a restart would hydrate it
                // that way. Leaving memory at Dispatched would turn every
                // retry into a spurious 409.
                let _ = state.blocks.try_update(&id, |block| -> Result<(), ()> {
                    block.status = prior.status;
                    block.stock_availability = prior.stock_availability;
                    block.updated_at = prior.updated_at;
                    Ok(())
                });
                return Err(AppError::Internal(format!(
                    "dispatch not persisted, transition rolled back: {e}"
                )));
            }
        }
    }

    tracing::info!(block = %id, "block dispatched");
    Ok(Json(confirmation))
}
