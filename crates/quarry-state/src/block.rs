//! # Stone Block Entity & Dispatch Transitions
//!
//! [`StoneBlock`] is the sole core entity. Its status field moves through
//! a monotonic partial order: `Registered, InWarehouse -> Dispatched`,
//! with `Dispatched` terminal. All mutations of `status` and
//! `stock_availability` go through the transition methods here, so the
//! coupling invariant (`Dispatched` iff the dispatch path set
//! `OutOfStock`) holds by construction.
//!
//! ## Design Decision
//!
//! Two live states plus one terminal state do not warrant typestate
//! encoding. An enum with guarded `transition()`-style methods returning
//! `Result` rejects invalid transitions at runtime with structured
//! errors, matching how the rest of the stack reports failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use quarry_core::{BlockId, IdentityToken};

/// Grade assigned when registration omits the field.
pub const DEFAULT_GRADE: &str = "Standard";

// ─── Status ──────────────────────────────────────────────────────────

/// Lifecycle status of a block.
///
/// Serialized with the wire labels clients already scan against
/// ("Registered" / "In Warehouse" / "Dispatched").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockStatus {
    /// Registered in the system, not yet placed in a warehouse slot.
    Registered,
    /// Physically present in the warehouse.
    #[serde(rename = "In Warehouse")]
    InWarehouse,
    /// Shipped out. Terminal — no further transition is permitted.
    Dispatched,
}

impl BlockStatus {
    /// The wire-format string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "Registered",
            Self::InWarehouse => "In Warehouse",
            Self::Dispatched => "Dispatched",
        }
    }

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Dispatched)
    }

    /// Whether a block in this status is available for dispatch.
    pub fn is_available(&self) -> bool {
        !self.is_terminal()
    }

    /// Parse a wire-format status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Registered" => Some(Self::Registered),
            "In Warehouse" => Some(Self::InWarehouse),
            "Dispatched" => Some(Self::Dispatched),
            _ => None,
        }
    }
}

impl std::fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Stock Availability ──────────────────────────────────────────────

/// Stock availability label.
///
/// `OutOfStock` is forced by the dispatch transition; outside dispatch it
/// only carries whatever the operator declared at registration or edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockAvailability {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl StockAvailability {
    /// The wire-format label for this availability.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "In Stock",
            Self::OutOfStock => "Out of Stock",
        }
    }

    /// Parse a wire-format availability label.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "In Stock" => Some(Self::InStock),
            "Out of Stock" => Some(Self::OutOfStock),
            _ => None,
        }
    }
}

impl std::fmt::Display for StockAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from block status transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The block has already been dispatched — re-scanning a dispatched
    /// token must be rejected without side effects.
    #[error("block with token {token} has already been dispatched")]
    AlreadyDispatched {
        /// The token that was scanned.
        token: IdentityToken,
    },

    /// Attempted transition is not valid from the current status.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: BlockStatus,
        /// Attempted target status.
        to: BlockStatus,
    },
}

// ─── StoneBlock ──────────────────────────────────────────────────────

/// One physical stone unit in the inventory.
///
/// Created by the registry with `status = Registered`; thereafter mutated
/// only through the transition methods or explicit field edits. The blob
/// references point into the content-addressed blob store and are owned
/// by this record — removal releases them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoneBlock {
    /// System-assigned record key, immutable.
    pub id: BlockId,
    /// Globally unique scannable token, immutable, never reissued.
    pub identity_token: IdentityToken,
    /// Blob reference of the rendered QR artifact.
    pub artifact_ref: String,
    pub name: String,
    pub dimensions: String,
    pub category: String,
    pub subcategory: String,
    pub price: f64,
    pub price_unit: String,
    /// Blob reference of the block photo.
    pub image_ref: String,
    pub stock_availability: StockAvailability,
    pub stock_quantity: Option<u32>,
    pub grade: String,
    pub status: BlockStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoneBlock {
    /// Move the block into the warehouse (Registered -> InWarehouse).
    pub fn mark_in_warehouse(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        match self.status {
            BlockStatus::Registered => {
                self.status = BlockStatus::InWarehouse;
                self.updated_at = now;
                Ok(())
            }
            BlockStatus::Dispatched => Err(TransitionError::AlreadyDispatched {
                token: self.identity_token.clone(),
            }),
            from => Err(TransitionError::InvalidTransition {
                from,
                to: BlockStatus::InWarehouse,
            }),
        }
    }

    /// Dispatch the block (available -> Dispatched).
    ///
    /// This is the core guard: a block may be dispatched exactly once.
    /// On success, `status` and `stock_availability` are written together
    /// so that no reader can observe one without the other. The caller
    /// must invoke this under its storage serialization point (see the
    /// API layer's `Store::try_update`).
    pub fn dispatch(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.status == BlockStatus::Dispatched {
            return Err(TransitionError::AlreadyDispatched {
                token: self.identity_token.clone(),
            });
        }
        self.status = BlockStatus::Dispatched;
        self.stock_availability = StockAvailability::OutOfStock;
        self.updated_at = now;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
