//! # API Route Modules
//!
//! Route modules for the block registry API surface:
//!
//! - `blocks` — registration (multipart upload + QR identity issuance),
//!   listing, removal, token lookup, and the guarded dispatch operation.
//! - `catalog` — the read-side filter/sort query over available blocks.
//! - `blobs` — retrieval of stored block photos and identity artifacts.

pub mod blobs;
pub mod blocks;
pub mod catalog;
