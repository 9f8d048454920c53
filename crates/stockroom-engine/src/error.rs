//! # Engine Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Engine Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────────┐  ┌─────────────────────┐  ┌────────────────┐  │
//! │  │   Business (Core)   │  │  Persistence (Db)   │  │   Engine       │  │
//! │  │                     │  │                     │  │                │  │
//! │  │  InvalidBasket      │  │  QueryFailed        │  │  Reservation   │  │
//! │  │  InsufficientStock  │  │  ConnectionFailed   │  │  Expired       │  │
//! │  │  InvalidTransition  │  │  UniqueViolation    │  │  TaskFailed    │  │
//! │  │  *NotFound          │  │  ...                │  │                │  │
//! │  └─────────────────────┘  └─────────────────────┘  └────────────────┘  │
//! │                                                                         │
//! │  Persistence failures during order placement release every            │
//! │  reservation taken for the order before the error is returned.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stockroom_core::CoreError;
use stockroom_db::DbError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A business rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The database failed underneath the operation.
    #[error("Persistence error: {0}")]
    Persistence(#[from] DbError),

    /// A reservation was released before it could be committed.
    ///
    /// ## When This Occurs
    /// The expiry sweeper released a held reservation while its order was
    /// still being persisted. The order is rolled back.
    #[error("Reservation {reservation_id} expired before commit")]
    ReservationExpired { reservation_id: String },

    /// The spawned task running the operation panicked or was aborted.
    #[error("Engine task failed: {0}")]
    TaskFailed(String),
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(err: tokio::task::JoinError) -> Self {
        EngineError::TaskFailed(err.to_string())
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Persistence(DbError::from(err))
    }
}

impl From<stockroom_core::ValidationError> for EngineError {
    fn from(err: stockroom_core::ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

impl EngineError {
    /// The business error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            EngineError::Core(e) => Some(e),
            _ => None,
        }
    }

    /// Whether the failure is an infrastructure fault rather than a rejection.
    pub fn is_internal(&self) -> bool {
        !matches!(self, EngineError::Core(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_pass_through_display() {
        let err: EngineError = CoreError::ProductNotFound("p-1".into()).into();
        assert_eq!(err.to_string(), "Product not found: p-1");
        assert!(!err.is_internal());
        assert!(matches!(err.as_core(), Some(CoreError::ProductNotFound(_))));
    }

    #[test]
    fn test_sqlx_errors_become_persistence() {
        let err: EngineError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, EngineError::Persistence(DbError::PoolExhausted)));
        assert!(err.is_internal());
    }

    #[test]
    fn test_db_errors_are_internal() {
        let err: EngineError = DbError::QueryFailed("disk I/O error".into()).into();
        assert!(err.is_internal());
        assert!(err.as_core().is_none());
    }
}
