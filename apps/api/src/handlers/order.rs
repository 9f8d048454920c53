//! # Order Handlers
//!
//! ```text
//!   POST /order  { user_id, items }       ──► CREATED  (stock reserved)
//!   PUT  /order/status/update
//!        { order_id, status: "paid" }     ──► PAID       transaction + spend
//!        { order_id, status: "fulfilled" }──► FULFILLED
//!        { order_id, status: "cancelled" }──► CANCELLED  stock returned
//! ```
//!
//! Illegal steps (such as created → fulfilled) answer 409.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use stockroom_core::{Basket, BasketItem, Order, OrderDetail, OrderStatus, OrderWithUser};

use super::ApiJson;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub items: Vec<BasketItem>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub order_id: String,
    pub status: OrderStatus,
}

/// POST /order, POST /orders
pub async fn create_order(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> ApiResult<(StatusCode, ApiJson<OrderDetail>)> {
    let basket = Basket::new(req.items)?;
    let order = state.engine.create_order(&req.user_id, basket).await?;
    Ok((StatusCode::CREATED, ApiJson(order)))
}

/// GET /orders
pub async fn list_orders(State(state): State<AppState>) -> ApiResult<ApiJson<Vec<Order>>> {
    Ok(ApiJson(state.engine.list_orders().await?))
}

/// GET /order/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiJson<OrderDetail>> {
    Ok(ApiJson(state.engine.get_order(&id).await?))
}

/// GET /order/user/{id}
pub async fn orders_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<ApiJson<Vec<Order>>> {
    Ok(ApiJson(state.engine.orders_by_user(&user_id).await?))
}

/// GET /order/user/detail/{id}
pub async fn order_with_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiJson<OrderWithUser>> {
    Ok(ApiJson(state.engine.get_order_with_user(&id).await?))
}

/// PUT /order/status/update
pub async fn update_order_status(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> ApiResult<ApiJson<Order>> {
    Ok(ApiJson(
        state.engine.update_order_status(&req.order_id, req.status).await?,
    ))
}
