//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockroom-db errors                                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  stockroom-engine errors                                               │
//! │  └── EngineError      - CoreError | DbError (PersistenceError)         │
//! │                                                                         │
//! │  API errors                                                            │
//! │  └── ApiError         - What HTTP clients see (code + message)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → ApiError → Client   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::{OrderStatus, SupplierOrderStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These map one-to-one onto the client-visible failure classes of the
/// fulfillment engine; none of them leaves partial state behind.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The purchase basket is malformed.
    ///
    /// ## When This Occurs
    /// - Basket has no items
    /// - The same product appears twice
    /// - A quantity is zero, negative, or above the per-item maximum
    #[error("Invalid basket: {reason}")]
    InvalidBasket { reason: String },

    /// Insufficient stock to reserve the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Buy (qty: 5)
    ///      │
    ///      ▼
    /// Reserve: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Every earlier reservation in the basket is released
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Order status change is not a forward step of the state machine.
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// User cannot be found.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Supplier cannot be found.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(String),

    /// Supplier order list cannot be found.
    #[error("Supplier order list not found: {0}")]
    SupplierOrderListNotFound(String),

    /// A supplier order list can only leave `pending`, once.
    #[error("Supplier order list {list_id} cannot move from {from} to {to}")]
    InvalidSupplierOrderTransition {
        list_id: String,
        from: SupplierOrderStatus,
        to: SupplierOrderStatus,
    },

    /// A tier with the same spend threshold already exists.
    ///
    /// Two tiers on one threshold would make resolution ambiguous.
    #[error("A tier with minimum spend {min_spend_cents} already exists")]
    DuplicateTierThreshold { min_spend_cents: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidBasket error.
    pub fn invalid_basket(reason: impl Into<String>) -> Self {
        CoreError::InvalidBasket {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product p-1: available 3, requested 5"
        );

        let err = CoreError::InvalidTransition {
            order_id: "o-1".to_string(),
            from: OrderStatus::Created,
            to: OrderStatus::Fulfilled,
        };
        assert_eq!(err.to_string(), "Order o-1 cannot move from created to fulfilled");
    }

    #[test]
    fn test_supplier_transition_message() {
        let err = CoreError::InvalidSupplierOrderTransition {
            list_id: "s-1".to_string(),
            from: SupplierOrderStatus::Received,
            to: SupplierOrderStatus::Cancelled,
        };
        assert_eq!(
            err.to_string(),
            "Supplier order list s-1 cannot move from received to cancelled"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        };
        assert_eq!(err.to_string(), "password must be at least 8 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "email".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
