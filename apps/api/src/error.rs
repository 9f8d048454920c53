//! # API Error Type
//!
//! Every handler returns `ApiResult<T>`. Errors from the lower layers are
//! folded into one JSON body and an HTTP status.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ValidationError ─┐                                                     │
//! │  CoreError ───────┼──► EngineError ──► ApiError { code, message }      │
//! │  DbError ─────────┘                          │                          │
//! │                                              ▼                          │
//! │                                   (StatusCode, Json<ApiError>)          │
//! │                                                                         │
//! │  400  VALIDATION_ERROR, INVALID_BASKET                                  │
//! │  401  UNAUTHORIZED          403  FORBIDDEN                              │
//! │  404  NOT_FOUND                                                         │
//! │  409  INSUFFICIENT_STOCK, INVALID_TRANSITION, CONFLICT                  │
//! │  500  DATABASE_ERROR, INTERNAL (details logged, never returned)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Response Body
//! ```json
//! { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for product p-1: available 0, requested 1" }
//! ```

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use stockroom_core::{CoreError, ValidationError};
use stockroom_db::DbError;
use stockroom_engine::EngineError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed body or a field out of range (400)
    ValidationError,

    /// Empty, oversized, or repeating basket (400)
    InvalidBasket,

    /// Missing or invalid access token (401)
    Unauthorized,

    /// Valid token without the required role (403)
    Forbidden,

    /// Resource not found (404)
    NotFound,

    /// Not enough stock to reserve (409)
    InsufficientStock,

    /// Illegal order or supplier order list status change (409)
    InvalidTransition,

    /// Duplicate email or tier threshold (409)
    Conflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError | ErrorCode::InvalidBasket => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InsufficientStock | ErrorCode::InvalidTransition | ErrorCode::Conflict => {
                StatusCode::CONFLICT
            }
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::CheckViolation(message) => {
                tracing::warn!("Check constraint violation: {}", message);
                ApiError::validation("Value violates a constraint")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database is busy")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!(error = %other, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::InvalidBasket { .. } => ErrorCode::InvalidBasket,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::InvalidTransition { .. } | CoreError::InvalidSupplierOrderTransition { .. } => {
                ErrorCode::InvalidTransition
            }
            CoreError::ProductNotFound(_)
            | CoreError::UserNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::SupplierNotFound(_)
            | CoreError::SupplierOrderListNotFound(_) => ErrorCode::NotFound,
            CoreError::DuplicateTierThreshold { .. } => ErrorCode::Conflict,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Core(e) => e.into(),
            EngineError::Persistence(e) => e.into(),
            EngineError::ReservationExpired { reservation_id } => {
                tracing::error!(%reservation_id, "Reservation expired during order placement");
                ApiError::internal("Order could not be completed, please retry")
            }
            EngineError::TaskFailed(e) => {
                tracing::error!(error = %e, "Engine task failed");
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::OrderStatus;

    #[test]
    fn test_core_errors_map_to_status() {
        let cases = [
            (CoreError::invalid_basket("empty"), StatusCode::BAD_REQUEST),
            (
                CoreError::InsufficientStock {
                    product_id: "p".into(),
                    available: 0,
                    requested: 1,
                },
                StatusCode::CONFLICT,
            ),
            (
                CoreError::InvalidTransition {
                    order_id: "o".into(),
                    from: OrderStatus::Created,
                    to: OrderStatus::Fulfilled,
                },
                StatusCode::CONFLICT,
            ),
            (CoreError::UserNotFound("u".into()), StatusCode::NOT_FOUND),
            (
                CoreError::DuplicateTierThreshold { min_spend_cents: 0 },
                StatusCode::CONFLICT,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).code.status(), status);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err: ApiError = EngineError::Persistence(DbError::QueryFailed("near \"SELEC\"".into())).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("SELEC"));

        let err: ApiError = EngineError::TaskFailed("panicked".into()).into();
        assert_eq!(err.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let json = serde_json::to_value(ApiError::new(ErrorCode::InsufficientStock, "x")).unwrap();
        assert_eq!(json["code"], "INSUFFICIENT_STOCK");
        assert_eq!(json["message"], "x");
    }
}
