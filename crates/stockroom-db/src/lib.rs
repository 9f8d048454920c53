//! # stockroom-db: Database Layer for Stockroom
//!
//! SQLite persistence for every Stockroom record, through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  HTTP handler ──► stockroom-engine (locks, compensation)               │
//! │                          │                                              │
//! │                          ▼                                              │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockroom-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ users, tiers  │    │ 0001 schema  │  │   │
//! │  │   │ SqlitePool    │◄───│ products      │    │ 0002 ledger  │  │   │
//! │  │   │ begin_write() │    │ orders, txs   │    │ 0003 supply  │  │   │
//! │  │   │               │    │ reservations  │    │              │  │   │
//! │  │   └───────────────┘    │ suppliers     │    └──────────────┘  │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                     stockroom.db (WAL)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./stockroom.db")).await?;
//! let products = db.products().list().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{
    new_id, NewSupplierOrderLine, NewUser, OrderRepository, ProductFilter, ProductRepository,
    ReservationRepository, SupplierRepository, TierRepository, TransactionRepository,
    UserRepository,
};
pub use repository::user::UserCredentials;
