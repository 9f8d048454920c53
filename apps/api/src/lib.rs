//! # Stockroom API
//!
//! HTTP back office over the fulfillment engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Stockroom API Service                           │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Catalogue     │  │  Orders        │  │  Loyalty                   ││
//! │  │                │  │                │  │                            ││
//! │  │ • products     │  │ • create       │  │ • /tierlist                ││
//! │  │ • buy          │  │ • status       │  │ • /discount/{id}           ││
//! │  │ • restock      │  │ • lines, txns  │  │ • /users/update            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │  Suppliers     │  │  Auth          │                                │
//! │  │ • order lists  │  │ • register     │                                │
//! │  │                │  │ • login (JWT)  │                                │
//! │  └────────────────┘  └────────────────┘                                │
//! │                                                                         │
//! │         AppState { Database, FulfillmentEngine, SupplierRecorder }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! `stockroom.toml` (or the file in `STOCKROOM_CONFIG`) and `STOCKROOM_*`
//! environment variables, for example:
//! - `STOCKROOM_PORT` - HTTP port (default: 8080)
//! - `STOCKROOM_DATABASE_PATH` - SQLite file, or `:memory:`
//! - `STOCKROOM_JWT_SECRET` - Secret for JWT signing
//! - `STOCKROOM_RESERVATION_TTL_SECS` - Age at which held stock is swept back (default: 900)
//!
//! Log filtering follows `RUST_LOG`.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::handlers::{health, order, order_line, product, supplier, tier, transaction, user};

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,stockroom=debug,sqlx=warn";

/// Installs the global tracing subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Builds the router with every route.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Service
        .route("/", get(health::banner))
        .route("/health", get(health::health))
        // Auth
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        // Users and tiers
        .route("/users", get(user::list_users))
        .route("/users/{id}", get(user::get_user))
        .route("/users/update", put(user::update_user_tier))
        .route("/discount/{id}", get(tier::discount_for_user))
        .route("/tierlist", get(tier::list_tiers).post(tier::create_tier))
        // Products
        .route("/product", post(product::create_product))
        .route("/product/{id}", get(product::get_product))
        .route("/product/buy", put(product::buy_product))
        .route(
            "/products",
            get(product::list_products).post(product::create_products),
        )
        .route("/products/filter", post(product::filter_products))
        .route("/products/buy", put(product::buy_products))
        .route("/products/{id}", put(product::update_product))
        .route("/products/{id}/restock", put(product::restock_product))
        // Transactions
        .route("/transactions", get(transaction::list_transactions))
        .route("/transaction/{id}", get(transaction::get_transaction))
        .route(
            "/transaction/order/{order_id}",
            get(transaction::transaction_of_order),
        )
        // Orders
        .route("/order", post(order::create_order))
        .route("/orders", get(order::list_orders).post(order::create_order))
        .route("/order/{id}", get(order::get_order))
        .route("/order/user/{id}", get(order::orders_by_user))
        .route("/order/user/detail/{id}", get(order::order_with_user))
        .route("/order/status/update", put(order::update_order_status))
        // Order lines
        .route("/orderLines", get(order_line::list_lines))
        .route("/orderLines/{id}", get(order_line::get_line))
        .route("/orderLines/{id}/{product_id}", get(order_line::line_by_order_and_product))
        .route("/orders/{id}/orderLines", get(order_line::lines_of_order))
        // Suppliers
        .route(
            "/suppliers",
            get(supplier::list_suppliers).post(supplier::create_supplier),
        )
        .route(
            "/suppliers/{id}",
            get(supplier::get_supplier).put(supplier::update_supplier),
        )
        .route(
            "/suppliers/{id}/supplierOrderLists",
            get(supplier::order_lists_of_supplier),
        )
        .route(
            "/supplierOrderLists",
            get(supplier::list_order_lists).post(supplier::record_order_list),
        )
        .route(
            "/supplierOrderLists/{id}",
            get(supplier::get_order_list).put(supplier::set_order_list_status),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
