//! # HTTP Handlers
//!
//! Thin adapters: parse the body, call one engine or repository operation,
//! serialize the result. No stock or status logic lives here.
//!
//! ## Module Organization
//! ```text
//! handlers/
//! ├── health.rs         ← banner, DB health check
//! ├── auth.rs           ← register, login
//! ├── user.rs           ← users, tier recompute
//! ├── tier.rs           ← discount lookup, tier ladder
//! ├── product.rs        ← catalogue, buy, restock
//! ├── order.rs          ← create, read, status transitions
//! ├── order_line.rs     ← read-only order lines
//! ├── transaction.rs    ← read-only payment records
//! └── supplier.rs       ← suppliers and their order lists
//! ```

use axum::extract::FromRequest;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::ApiError;

pub mod auth;
pub mod health;
pub mod order;
pub mod order_line;
pub mod product;
pub mod supplier;
pub mod tier;
pub mod transaction;
pub mod user;

/// `axum::Json` whose rejections use the API error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}
