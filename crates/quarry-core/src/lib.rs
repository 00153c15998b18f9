//! # quarry-core — Foundational Types for the Quarry Stack
//!
//! Domain-primitive newtypes ([`BlockId`], [`IdentityToken`]), field
//! validation helpers, and the structured [`ValidationError`] type used
//! throughout the stack.
//!
//! Every other crate in the workspace depends on this one; it depends on
//! nothing but serde, thiserror, and uuid.

pub mod error;
pub mod ids;
pub mod validate;

pub use error::ValidationError;
pub use ids::{BlockId, IdentityToken};
