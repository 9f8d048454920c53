//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Two Kinds of Access
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Pool-backed repository methods          Connection-scoped functions   │
//! │  ─────────────────────────────           ───────────────────────────   │
//! │  db.products().get_by_id(id)             product::try_take_stock(      │
//! │  db.orders().list_by_user(uid)               &mut tx, id, qty)         │
//! │  db.suppliers().list()                   order::insert_order(          │
//! │                                              &mut tx, &order)          │
//! │  One statement, own connection.          Run inside a transaction the  │
//! │  Reads and standalone writes.            engine opened, so several     │
//! │                                          writes commit or roll back    │
//! │                                          together.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`] - users, credentials, spend and tier
//! - [`TierRepository`] - discount tier ladder
//! - [`ProductRepository`] - products and stock counters
//! - [`OrderRepository`] - orders and order lines
//! - [`TransactionRepository`] - payment audit records
//! - [`ReservationRepository`] - inventory ledger reservations
//! - [`SupplierRepository`] - suppliers and supplier order lists

pub mod order;
pub mod product;
pub mod reservation;
pub mod supplier;
pub mod tier;
pub mod transaction;
pub mod user;

pub use order::OrderRepository;
pub use product::{ProductFilter, ProductRepository};
pub use reservation::ReservationRepository;
pub use supplier::{NewSupplierOrderLine, SupplierRepository};
pub use tier::TierRepository;
pub use transaction::TransactionRepository;
pub use user::{NewUser, UserRepository};

/// Fresh UUID v4 identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
