//! # Product Handlers
//!
//! Catalogue maintenance and the two purchase shortcuts.
//!
//! ```text
//!   PUT /product/buy   { user_id, product_id, quantity }  ──┐
//!   PUT /products/buy  { user_id, items: [...] }          ──┴──► FulfillmentEngine
//!                                                                 (reserve, price,
//!                                                                  persist, pay)
//!   PUT /products/{id}          name / description / price only
//!   PUT /products/{id}/restock  admin; stock through the inventory ledger
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::Deserialize;
use stockroom_core::validation::{
    validate_name, validate_price_cents, validate_restock_quantity, validate_stock,
};
use stockroom_core::{Basket, BasketItem, CoreError, OrderDetail, Product, ValidationError};
use stockroom_db::{new_id, ProductFilter};
use tracing::info;

use super::ApiJson;
use crate::auth::AdminClaims;
use crate::error::ApiResult;
use crate::state::AppState;

/// Most products accepted by one `POST /products`.
pub const MAX_PRODUCTS_PER_REQUEST: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct NewProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
}

impl NewProductRequest {
    fn into_product(self) -> ApiResult<Product> {
        validate_name("name", &self.name)?;
        validate_price_cents("price_cents", self.price_cents)?;
        validate_stock(self.stock)?;

        let now = Utc::now();
        Ok(Product {
            id: new_id(),
            name: self.name.trim().to_string(),
            description: self.description,
            price_cents: self.price_cents,
            stock: self.stock,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Editable product fields. Stock is not one of them.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct BuyProductRequest {
    pub user_id: String,
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct BuyProductsRequest {
    pub user_id: String,
    pub items: Vec<BasketItem>,
}

/// POST /product
pub async fn create_product(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NewProductRequest>,
) -> ApiResult<(StatusCode, ApiJson<Product>)> {
    let product = state.db.products().insert(&req.into_product()?).await?;
    info!(id = %product.id, stock = product.stock, "Product created");
    Ok((StatusCode::CREATED, ApiJson(product)))
}

/// POST /products
///
/// All or nothing: one invalid entry rejects the whole batch.
pub async fn create_products(
    State(state): State<AppState>,
    ApiJson(reqs): ApiJson<Vec<NewProductRequest>>,
) -> ApiResult<(StatusCode, ApiJson<Vec<Product>>)> {
    if reqs.is_empty() || reqs.len() > MAX_PRODUCTS_PER_REQUEST {
        return Err(ValidationError::OutOfRange {
            field: "products".into(),
            min: 1,
            max: MAX_PRODUCTS_PER_REQUEST as i64,
        }
        .into());
    }

    let products = reqs
        .into_iter()
        .map(NewProductRequest::into_product)
        .collect::<ApiResult<Vec<_>>>()?;

    let products = state.db.products().insert_many(&products).await?;
    info!(count = products.len(), "Products created");
    Ok((StatusCode::CREATED, ApiJson(products)))
}

/// POST /products/filter
pub async fn filter_products(
    State(state): State<AppState>,
    ApiJson(filter): ApiJson<ProductFilter>,
) -> ApiResult<ApiJson<Vec<Product>>> {
    Ok(ApiJson(state.db.products().filter(&filter).await?))
}

/// GET /products
pub async fn list_products(State(state): State<AppState>) -> ApiResult<ApiJson<Vec<Product>>> {
    Ok(ApiJson(state.db.products().list().await?))
}

/// GET /product/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiJson<Product>> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or(CoreError::ProductNotFound(id))?;
    Ok(ApiJson(product))
}

/// PUT /products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> ApiResult<ApiJson<Product>> {
    validate_name("name", &req.name)?;
    validate_price_cents("price_cents", req.price_cents)?;

    let product = state
        .db
        .products()
        .update_details(&id, req.name.trim(), req.description.as_deref(), req.price_cents)
        .await?;
    Ok(ApiJson(product))
}

/// PUT /products/{id}/restock (admin)
pub async fn restock_product(
    State(state): State<AppState>,
    AdminClaims(admin): AdminClaims,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<RestockRequest>,
) -> ApiResult<ApiJson<Product>> {
    validate_restock_quantity(req.quantity)?;
    let product = state.ledger().restock(&id, req.quantity).await?;

    info!(admin = %admin.sub, id = %id, quantity = req.quantity, "Product restocked");
    Ok(ApiJson(product))
}

/// PUT /product/buy
///
/// Places and pays a one-line order.
pub async fn buy_product(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BuyProductRequest>,
) -> ApiResult<(StatusCode, ApiJson<OrderDetail>)> {
    let order = state
        .engine
        .buy_product(&req.user_id, &req.product_id, req.quantity)
        .await?;
    Ok((StatusCode::CREATED, ApiJson(order)))
}

/// PUT /products/buy
pub async fn buy_products(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BuyProductsRequest>,
) -> ApiResult<(StatusCode, ApiJson<OrderDetail>)> {
    let basket = Basket::new(req.items)?;
    let order = state.engine.buy_products(&req.user_id, basket).await?;
    Ok((StatusCode::CREATED, ApiJson(order)))
}
