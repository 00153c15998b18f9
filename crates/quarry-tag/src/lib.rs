//! # quarry-tag — Identity Token Issuer
//!
//! Issues the scannable identity bound to a block at registration:
//! a UUIDv4-backed opaque token plus a QR artifact (PNG) encoding a small
//! JSON payload with the block's descriptive metadata.
//!
//! ## Uniqueness
//!
//! The token carries 128 bits of randomness; collision is treated as
//! effectively impossible and the issuer never consults storage. Tokens
//! are never reused — a failed registration simply abandons its token.
//! The registry layers its own defense-in-depth (store scan plus a
//! database UNIQUE constraint) before persistence.
//!
//! ## Scanning Conditions
//!
//! Artifacts are rendered at error-correction level H so that labels
//! remain scannable after the partial damage typical of warehouse
//! handling.

use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use quarry_core::IdentityToken;

/// Minimum rendered artifact edge, in pixels.
const ARTIFACT_MIN_DIMENSION: u32 = 300;

/// Descriptive metadata embedded in the scannable payload.
#[derive(Debug, Clone)]
pub struct TagMetadata<'a> {
    pub name: &'a str,
    pub dimensions: &'a str,
    pub category: &'a str,
}

/// The JSON payload encoded into the QR artifact.
///
/// Kept small on purpose: a scanner needs the token for lookup and just
/// enough human-readable context to sanity-check the physical block.
#[derive(Debug, Serialize)]
struct TagPayload<'a> {
    token: &'a str,
    name: &'a str,
    dimensions: &'a str,
    category: &'a str,
    registered_at: DateTime<Utc>,
}

/// A freshly issued tag: the token and its rendered artifact.
#[derive(Debug, Clone)]
pub struct IssuedTag {
    /// The opaque identity token.
    pub token: IdentityToken,
    /// PNG bytes of the rendered QR artifact.
    pub png: Vec<u8>,
    /// Registration timestamp embedded in the payload.
    pub registered_at: DateTime<Utc>,
}

/// Errors from tag issuance.
#[derive(Error, Debug)]
pub enum TagError {
    /// The artifact could not be rendered. The caller must not persist a
    /// partially-created entity when this is returned.
    #[error("artifact encoding failed: {0}")]
    Encoding(String),
}

/// Issue a new identity tag for the given metadata.
///
/// Generates the token, encodes the payload as JSON, and renders the QR
/// artifact at error-correction level H. The token is unique with
/// overwhelming probability and is burned even if the caller's
/// registration subsequently fails.
pub fn issue(meta: &TagMetadata<'_>) -> Result<IssuedTag, TagError> {
    let token = IdentityToken::from(Uuid::new_v4());
    let registered_at = Utc::now();

    let payload = TagPayload {
        token: token.as_str(),
        name: meta.name,
        dimensions: meta.dimensions,
        category: meta.category,
        registered_at,
    };
    let data =
        serde_json::to_vec(&payload).map_err(|e| TagError::Encoding(e.to_string()))?;

    let png = render_png(&data)?;

    Ok(IssuedTag {
        token,
        png,
        registered_at,
    })
}

/// Render QR data to PNG bytes at error-correction level H.
fn render_png(data: &[u8]) -> Result<Vec<u8>, TagError> {
    let code = QrCode::with_error_correction_level(data, EcLevel::H)
        .map_err(|e| TagError::Encoding(format!("QR encoding failed: {e}")))?;

    let img = code
        .render::<Luma<u8>>()
        .min_dimensions(ARTIFACT_MIN_DIMENSION, ARTIFACT_MIN_DIMENSION)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(img)
        .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| TagError::Encoding(format!("PNG encoding failed: {e}")))?;

    Ok(png)
}
