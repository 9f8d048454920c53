//! Read-only payment records, written once when an order becomes paid.

use axum::extract::{Path, State};
use stockroom_core::Transaction;
use stockroom_db::DbError;

use super::ApiJson;
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /transactions
pub async fn list_transactions(
    State(state): State<AppState>,
) -> ApiResult<ApiJson<Vec<Transaction>>> {
    Ok(ApiJson(state.db.transactions().list().await?))
}

/// GET /transaction/{id}
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiJson<Transaction>> {
    let tx = state
        .db
        .transactions()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| DbError::not_found("Transaction", &id))?;
    Ok(ApiJson(tx))
}

/// GET /transaction/order/{order_id}
///
/// 404 for an unknown order and for an order that was never paid.
pub async fn transaction_of_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<ApiJson<Transaction>> {
    let tx = state
        .db
        .transactions()
        .get_by_order(&order_id)
        .await?
        .ok_or_else(|| DbError::not_found("Transaction for order", &order_id))?;
    Ok(ApiJson(tx))
}
