//! # stockroom-engine: Inventory Ledger and Order Fulfillment
//!
//! The only crate that changes product stock or order status.
//!
//! ## Components
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   FulfillmentEngine ──────────────┬───────────────────┐                │
//! │   create_order, buy_products,     │                   │                │
//! │   update_order_status, reads      ▼                   ▼                │
//! │                            InventoryLedger       TierRegistry          │
//! │                            reserve / release     ladder cache,         │
//! │                            commit / restock      resolve, create       │
//! │                                   ▲                                     │
//! │                                   │                                     │
//! │                          ReservationSweeper      SupplierRecorder      │
//! │                          (background task)       (records only)        │
//! │                                                                         │
//! │   Locks: product and order ids through KeyedLocks, ascending order,    │
//! │   always taken before a pooled connection.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_engine::{FulfillmentEngine, InventoryLedger, TierRegistry};
//!
//! let tiers = TierRegistry::load(db.clone()).await?;
//! let engine = FulfillmentEngine::new(db.clone(), InventoryLedger::new(db.clone()), tiers);
//!
//! let order = engine.buy_product(&user_id, &product_id, 2).await?;
//! ```

pub mod error;
pub mod fulfillment;
pub mod ledger;
pub mod locks;
pub mod suppliers;
pub mod sweeper;
pub mod tiers;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{EngineError, EngineResult};
pub use fulfillment::FulfillmentEngine;
pub use ledger::{InventoryLedger, ReservationToken};
pub use locks::KeyedLocks;
pub use suppliers::{SupplierDetails, SupplierRecorder};
pub use sweeper::{ReservationSweeper, SweeperConfig, SweeperHandle};
pub use tiers::TierRegistry;
