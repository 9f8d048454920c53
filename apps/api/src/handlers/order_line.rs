//! Read-only order lines. Lines are written only when an order is placed.

use axum::extract::{Path, State};
use stockroom_core::OrderLine;
use stockroom_db::DbError;

use super::ApiJson;
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /orderLines
pub async fn list_lines(State(state): State<AppState>) -> ApiResult<ApiJson<Vec<OrderLine>>> {
    Ok(ApiJson(state.db.orders().list_lines().await?))
}

/// GET /orderLines/{id}
pub async fn get_line(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiJson<OrderLine>> {
    let line = state
        .db
        .orders()
        .get_line(&id)
        .await?
        .ok_or_else(|| DbError::not_found("Order line", &id))?;
    Ok(ApiJson(line))
}

/// GET /orders/{id}/orderLines
pub async fn lines_of_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<ApiJson<Vec<OrderLine>>> {
    Ok(ApiJson(state.engine.get_order(&order_id).await?.lines))
}

/// GET /orderLines/{id}/{product_id}
pub async fn line_by_order_and_product(
    State(state): State<AppState>,
    Path((order_id, product_id)): Path<(String, String)>,
) -> ApiResult<ApiJson<OrderLine>> {
    let line = state
        .db
        .orders()
        .get_line_by_order_and_product(&order_id, &product_id)
        .await?
        .ok_or_else(|| DbError::not_found("Order line", format!("{}/{}", order_id, product_id)))?;
    Ok(ApiJson(line))
}
