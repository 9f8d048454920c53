//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! This crate is the **heart** of Stockroom. It contains the order, pricing,
//! and loyalty-tier rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (axum)                              │   │
//! │  │   /products/buy ──► /order ──► /order/status/update            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            stockroom-engine (ledger + fulfillment)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ stockroom-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  types   │ │  basket  │ │   tier   │ │ pricing  │          │   │
//! │  │   │ Product  │ │ Basket   │ │ Catalog  │ │ Priced   │          │   │
//! │  │   │ Order    │ │ Item     │ │ resolve  │ │ Basket   │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockroom-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Product, User, Tier, Order, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`basket`] - Validated purchase baskets
//! - [`tier`] - Tier catalog and resolution
//! - [`pricing`] - Line totals and discounted order totals
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let subtotal = Money::from_cents(250);
//! let total = subtotal.apply_discount_percent(10);
//! assert_eq!(total.cents(), 225);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod basket;
pub mod error;
pub mod money;
pub mod pricing;
pub mod tier;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use basket::{Basket, BasketItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{price_basket, PricedBasket, PricedLine};
pub use tier::{default_ladder, TierCatalog};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products allowed in a single basket.
pub const MAX_BASKET_ITEMS: usize = 100;

/// Maximum quantity of a single product in one basket.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Identifier of the synthesized zero-discount tier.
///
/// Returned by [`TierCatalog::resolve`] when no stored tier qualifies.
pub const BASELINE_TIER_ID: &str = "baseline";
