//! # Error Types
//!
//! The structured validation error used across the stack. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! Validation failures always name the offending field so that API
//! clients can highlight the exact input at fault; callers switch on the
//! error kind, never on message text.

use thiserror::Error;

/// A field-level validation failure.
///
/// Produced before any storage side effect occurs — an operation that
/// returns `ValidationError` has not written anything.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid field '{field}': {reason}")]
pub struct ValidationError {
    /// The input field that failed validation.
    pub field: String,
    /// Human-readable reason for the rejection.
    pub reason: String,
}

impl ValidationError {
    /// Construct a validation error for the named field.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// A required field was missing or empty after trimming.
    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, "required and must not be empty")
    }
}
