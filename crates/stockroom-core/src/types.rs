//! # Domain Types
//!
//! Records shared by every layer of Stockroom.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌───────────────┐      ┌───────────────┐      ┌───────────────┐       │
//! │  │    User       │ 1  * │    Order      │ 1  * │  OrderLine    │       │
//! │  │  spend, tier  │─────►│  status       │─────►│  qty × unit   │       │
//! │  └───────┬───────┘      │  subtotal     │      └───────┬───────┘       │
//! │          │              │  discount %   │              │               │
//! │          ▼              │  total        │              ▼               │
//! │  ┌───────────────┐      └──────┬────────┘      ┌───────────────┐       │
//! │  │    Tier       │             │ 0..1          │   Product     │       │
//! │  │  threshold, % │             ▼               │  price, stock │       │
//! │  └───────────────┘      ┌───────────────┐      └───────┬───────┘       │
//! │                         │  Transaction  │              │ *             │
//! │                         └───────────────┘      ┌───────▼───────┐       │
//! │                                                │  Reservation  │       │
//! │  ┌───────────────┐ 1  * ┌───────────────────┐  │  held/...     │       │
//! │  │   Supplier    │─────►│ SupplierOrderList │  └───────────────┘       │
//! │  └───────────────┘      └───────────────────┘                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All identifiers are UUID v4 strings. Amounts are `*_cents` integers;
//! use the accessor methods to get [`Money`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product that can be ordered.
///
/// `stock` is only ever changed by the inventory ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Current list price in cents.
    pub price_cents: i64,
    /// Units available for reservation. Never negative.
    pub stock: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// User
// =============================================================================

/// Role carried in access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum UserRole {
    Admin,
    Customer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Customer => "customer",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Customer
    }
}

/// A registered user.
///
/// The password hash never leaves the database layer; it is not part of
/// this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Sum of the totals of every order that reached Paid and was not
    /// later cancelled.
    pub cumulative_spend_cents: i64,
    /// Tier resolved from `cumulative_spend_cents`. Recomputable.
    pub tier_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[inline]
    pub fn cumulative_spend(&self) -> Money {
        Money::from_cents(self.cumulative_spend_cents)
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// =============================================================================
// Tier
// =============================================================================

/// A loyalty tier: spending at least `min_spend_cents` earns
/// `discount_percent` off every later order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Tier {
    pub id: String,
    pub name: String,
    pub min_spend_cents: i64,
    /// Whole percent, 0..=100.
    pub discount_percent: u32,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of an order.
///
/// ```text
///   Created ──► Paid ──► Fulfilled
///      │          │
///      └────┬─────┘
///           ▼
///       Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum OrderStatus {
    Created,
    Paid,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Paid => "paid",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether `next` is a legal single step from `self`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Created, OrderStatus::Paid)
                | (OrderStatus::Created, OrderStatus::Cancelled)
                | (OrderStatus::Paid, OrderStatus::Fulfilled)
                | (OrderStatus::Paid, OrderStatus::Cancelled)
        )
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Fulfilled | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Created
    }
}

// =============================================================================
// Order + Lines
// =============================================================================

/// A customer order.
///
/// `subtotal_cents` always equals the sum of its lines' totals.
/// `total_cents` is `subtotal_cents` with `discount_percent` applied once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    /// Discount frozen at creation time.
    pub discount_percent: u32,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// One product line of an order. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Product price at the moment the order was priced.
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// An order together with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

impl OrderDetail {
    /// Sum of line totals. Equal to `order.subtotal_cents` for any stored order.
    pub fn lines_total(&self) -> Money {
        self.lines.iter().map(OrderLine::line_total).sum()
    }
}

/// An order, its lines and the user who placed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderWithUser {
    #[serde(flatten)]
    pub detail: OrderDetail,
    pub user: User,
}

// =============================================================================
// Transaction
// =============================================================================

/// Audit record written exactly once, when an order becomes Paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    pub order_id: String,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Reservation
// =============================================================================

/// State of a stock reservation.
///
/// ```text
///   Held ──► Committed
///     │          │
///     └────┬─────┘
///          ▼
///      Released   (stock returned, exactly once)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ReservationState {
    Held,
    Committed,
    Released,
}

impl ReservationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Held => "held",
            ReservationState::Committed => "committed",
            ReservationState::Released => "released",
        }
    }
}

/// Stock taken out of a product's counter on behalf of a pending order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Reservation {
    pub id: String,
    pub product_id: String,
    /// Set when the reservation is committed to an order.
    pub order_id: Option<String>,
    pub quantity: i64,
    pub state: ReservationState,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Suppliers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Status of a supplier order list. Pending is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SupplierOrderStatus {
    Pending,
    Received,
    Cancelled,
}

impl SupplierOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplierOrderStatus::Pending => "pending",
            SupplierOrderStatus::Received => "received",
            SupplierOrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: SupplierOrderStatus) -> bool {
        *self == SupplierOrderStatus::Pending && next != SupplierOrderStatus::Pending
    }
}

impl fmt::Display for SupplierOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A restock document sent to a supplier. Record-keeping only: recording
/// or receiving it never changes product stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SupplierOrderList {
    pub id: String,
    pub supplier_id: String,
    pub status: SupplierOrderStatus,
    pub total_cost_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub lines: Vec<SupplierOrderLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SupplierOrderLine {
    pub id: String,
    pub list_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 4] = [
        OrderStatus::Created,
        OrderStatus::Paid,
        OrderStatus::Fulfilled,
        OrderStatus::Cancelled,
    ];

    #[test]
    fn test_order_status_forward_steps() {
        assert!(OrderStatus::Created.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Fulfilled));
        assert!(OrderStatus::Created.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_order_status_rejects_skips_and_backward_moves() {
        assert!(!OrderStatus::Created.can_transition_to(OrderStatus::Fulfilled));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Created));
        assert!(!OrderStatus::Fulfilled.can_transition_to(OrderStatus::Cancelled));
        for s in ALL {
            assert!(!s.can_transition_to(s), "{s} -> {s} must be rejected");
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in ALL.into_iter().filter(OrderStatus::is_terminal) {
            assert!(ALL.iter().all(|to| !from.can_transition_to(*to)));
        }
    }

    #[test]
    fn test_order_status_serde_lowercase() {
        assert_eq!(serde_json::to_string(&OrderStatus::Paid).unwrap(), "\"paid\"");
        let parsed: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }

    #[test]
    fn test_supplier_order_status_transitions() {
        use SupplierOrderStatus::*;
        assert!(Pending.can_transition_to(Received));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Received.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Pending));
    }
}
