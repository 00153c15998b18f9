//! # Field Validation Helpers
//!
//! Shared validators for registration input. Each helper names the
//! offending field in its error so handlers can surface it unchanged.

use crate::error::ValidationError;

/// Validate that a required text field is non-empty after trimming.
///
/// Returns the trimmed value on success.
pub fn non_empty(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::required(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Parse and validate a price field: must parse as a number and be
/// non-negative and finite.
pub fn price(field: &str, value: &str) -> Result<f64, ValidationError> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| ValidationError::new(field, "must be a number"))?;
    if !parsed.is_finite() {
        return Err(ValidationError::new(field, "must be a finite number"));
    }
    if parsed < 0.0 {
        return Err(ValidationError::new(field, "must be non-negative"));
    }
    Ok(parsed)
}

/// Largest accepted stock quantity. Matches the storage column range so
/// an accepted value can always be persisted unchanged.
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// Parse an optional quantity field: when present and non-empty it must
/// parse as a non-negative integer no larger than [`MAX_QUANTITY`].
pub fn quantity(field: &str, value: Option<&str>) -> Result<Option<u32>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => {
            let parsed: u32 = raw
                .parse()
                .map_err(|_| ValidationError::new(field, "must be a non-negative integer"))?;
            if parsed > MAX_QUANTITY {
                return Err(ValidationError::new(
                    field,
                    format!("must not exceed {MAX_QUANTITY}"),
                ));
            }
            Ok(Some(parsed))
        }
    }
}
