//! Suppliers and supplier order lists.
//!
//! Recording or receiving a list is bookkeeping only. Stock moves through
//! `PUT /products/{id}/restock`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use stockroom_core::{Supplier, SupplierOrderList, SupplierOrderStatus};
use stockroom_db::NewSupplierOrderLine;
use stockroom_engine::SupplierDetails;

use super::ApiJson;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SupplierRequest {
    pub name: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl From<SupplierRequest> for SupplierDetails {
    fn from(req: SupplierRequest) -> Self {
        SupplierDetails {
            name: req.name,
            contact_email: req.contact_email,
            phone: req.phone,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderListRequest {
    pub supplier_id: String,
    pub lines: Vec<NewSupplierOrderLine>,
}

#[derive(Debug, Deserialize)]
pub struct OrderListStatusRequest {
    pub status: SupplierOrderStatus,
}

/// POST /suppliers
pub async fn create_supplier(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SupplierRequest>,
) -> ApiResult<(StatusCode, ApiJson<Supplier>)> {
    let supplier = state.suppliers.create_supplier(&req.into()).await?;
    Ok((StatusCode::CREATED, ApiJson(supplier)))
}

/// PUT /suppliers/{id}
pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<SupplierRequest>,
) -> ApiResult<ApiJson<Supplier>> {
    Ok(ApiJson(state.suppliers.update_supplier(&id, &req.into()).await?))
}

/// GET /suppliers/{id}
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiJson<Supplier>> {
    Ok(ApiJson(state.suppliers.supplier(&id).await?))
}

/// GET /suppliers
pub async fn list_suppliers(State(state): State<AppState>) -> ApiResult<ApiJson<Vec<Supplier>>> {
    Ok(ApiJson(state.suppliers.list_suppliers().await?))
}

/// POST /supplierOrderLists
pub async fn record_order_list(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<OrderListRequest>,
) -> ApiResult<(StatusCode, ApiJson<SupplierOrderList>)> {
    let list = state
        .suppliers
        .record_order_list(&req.supplier_id, &req.lines)
        .await?;
    Ok((StatusCode::CREATED, ApiJson(list)))
}

/// GET /supplierOrderLists/{id}
pub async fn get_order_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiJson<SupplierOrderList>> {
    Ok(ApiJson(state.suppliers.order_list(&id).await?))
}

/// GET /suppliers/{id}/supplierOrderLists
pub async fn order_lists_of_supplier(
    State(state): State<AppState>,
    Path(supplier_id): Path<String>,
) -> ApiResult<ApiJson<Vec<SupplierOrderList>>> {
    Ok(ApiJson(state.suppliers.order_lists_of(&supplier_id).await?))
}

/// GET /supplierOrderLists
pub async fn list_order_lists(
    State(state): State<AppState>,
) -> ApiResult<ApiJson<Vec<SupplierOrderList>>> {
    Ok(ApiJson(state.suppliers.list_order_lists().await?))
}

/// PUT /supplierOrderLists/{id}
///
/// Pending lists only; 409 otherwise.
pub async fn set_order_list_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<OrderListStatusRequest>,
) -> ApiResult<ApiJson<SupplierOrderList>> {
    Ok(ApiJson(
        state.suppliers.set_order_list_status(&id, req.status).await?,
    ))
}
