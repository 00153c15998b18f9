//! # quarry-state — Block Lifecycle State Machine
//!
//! The [`StoneBlock`] entity and its dispatch state machine.
//!
//! ## States
//!
//! ```text
//! Registered ──▶ InWarehouse
//!      │              │
//!      └──────┬───────┘
//!             ▼
//!         Dispatched (terminal)
//! ```
//!
//! `Registered` and `InWarehouse` are both "available" — the only safety
//! property that matters operationally is that a physical block cannot be
//! shipped twice. Dispatch is the sole terminal transition and couples
//! `status = Dispatched` with `stock_availability = OutOfStock` in a
//! single mutation.

pub mod block;

pub use block::{
    BlockStatus, StockAvailability, StoneBlock, TransitionError, DEFAULT_GRADE,
};
