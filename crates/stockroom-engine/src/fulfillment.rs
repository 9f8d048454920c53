//! # Order Fulfillment Engine
//!
//! Turns a basket into a persisted order and moves orders through their
//! lifecycle.
//!
//! ## Placing an Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_order / buy_products (user, basket)                            │
//! │                                                                         │
//! │  1. user lookup ─────────────────────────────► UserNotFound            │
//! │  2. discount from the user's tier                                       │
//! │  3. ledger.reserve_basket ───────────────────► InsufficientStock /     │
//! │                                                ProductNotFound         │
//! │  4. BEGIN IMMEDIATE                                                     │
//! │       read current prices, price basket                                 │
//! │       INSERT order (+ lines)                                            │
//! │       commit reservations to the order                                  │
//! │       [paid] INSERT transaction, add spend, recompute tier              │
//! │     COMMIT ──── on any failure ──► rollback + release reservations     │
//! │  5. order + lines                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Changes
//! ```text
//!   Created ──► Paid ──► Fulfilled
//!      │          │
//!      └────┬─────┘
//!           ▼
//!       Cancelled   (stock returned, spend reversed if it was Paid)
//! ```
//!
//! Each operation runs on its own spawned task: a caller that goes away
//! mid-request cannot split a reservation from its compensation.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqliteConnection;
use stockroom_core::{
    price_basket, Basket, CoreError, Money, Order, OrderDetail, OrderLine, OrderStatus,
    OrderWithUser, TierCatalog, Transaction,
};
use stockroom_db::repository::{order, product, transaction, user};
use stockroom_db::{new_id, Database};
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::ledger::{release_in, InventoryLedger, ReservationToken};
use crate::locks::KeyedLocks;
use crate::tiers::TierRegistry;

#[derive(Debug, Clone)]
pub struct FulfillmentEngine {
    db: Database,
    ledger: InventoryLedger,
    tiers: TierRegistry,
    order_locks: Arc<KeyedLocks>,
}

impl FulfillmentEngine {
    pub fn new(db: Database, ledger: InventoryLedger, tiers: TierRegistry) -> Self {
        FulfillmentEngine {
            db,
            ledger,
            tiers,
            order_locks: Arc::new(KeyedLocks::new()),
        }
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    pub fn tiers(&self) -> &TierRegistry {
        &self.tiers
    }

    // =========================================================================
    // Placing orders
    // =========================================================================

    /// Reserves the basket and records an order in `Created`.
    pub async fn create_order(&self, user_id: &str, basket: Basket) -> EngineResult<OrderDetail> {
        let engine = self.clone();
        let user_id = user_id.to_string();
        tokio::spawn(async move { engine.place(&user_id, basket, OrderStatus::Created).await }).await?
    }

    /// Reserves the basket and records an order already `Paid`, with its
    /// transaction, in one step.
    pub async fn buy_products(&self, user_id: &str, basket: Basket) -> EngineResult<OrderDetail> {
        let engine = self.clone();
        let user_id = user_id.to_string();
        tokio::spawn(async move { engine.place(&user_id, basket, OrderStatus::Paid).await }).await?
    }

    /// Single-product form of [`FulfillmentEngine::buy_products`].
    pub async fn buy_product(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> EngineResult<OrderDetail> {
        let basket = Basket::single(product_id, quantity)?;
        self.buy_products(user_id, basket).await
    }

    async fn place(&self, user_id: &str, basket: Basket, status: OrderStatus) -> EngineResult<OrderDetail> {
        let buyer = self
            .db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;

        let catalog = self.tiers.snapshot().await;
        let discount_percent = catalog.discount_for(buyer.cumulative_spend());

        let tokens = self.ledger.reserve_basket(&basket).await?;

        match self
            .persist(user_id, &basket, discount_percent, status, &tokens, &catalog)
            .await
        {
            Ok(detail) => {
                info!(
                    order_id = %detail.order.id,
                    user_id = %user_id,
                    status = %status,
                    total_cents = detail.order.total_cents,
                    "Order placed"
                );
                Ok(detail)
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Order placement failed, releasing stock");
                self.ledger.compensate(&tokens).await;
                Err(e)
            }
        }
    }

    async fn persist(
        &self,
        user_id: &str,
        basket: &Basket,
        discount_percent: u32,
        status: OrderStatus,
        tokens: &[ReservationToken],
        catalog: &TierCatalog,
    ) -> EngineResult<OrderDetail> {
        let mut tx = self.db.begin_write().await?;

        let products = product::get_many(&mut tx, &basket.sorted_product_ids()).await?;
        let priced = price_basket(basket, &products, discount_percent)?;

        let now = Utc::now();
        let placed = Order {
            id: new_id(),
            user_id: user_id.to_string(),
            status,
            subtotal_cents: priced.subtotal.cents(),
            discount_percent: priced.discount_percent,
            total_cents: priced.total.cents(),
            created_at: now,
            updated_at: now,
        };
        order::insert_order(&mut tx, &placed).await?;

        let mut lines = Vec::with_capacity(priced.lines.len());
        for priced_line in &priced.lines {
            let line = OrderLine {
                id: new_id(),
                order_id: placed.id.clone(),
                product_id: priced_line.product_id.clone(),
                quantity: priced_line.quantity,
                unit_price_cents: priced_line.unit_price.cents(),
                line_total_cents: priced_line.line_total.cents(),
                created_at: now,
            };
            order::insert_line(&mut tx, &line).await?;
            lines.push(line);
        }

        self.ledger.commit_in(&mut tx, tokens, &placed.id).await?;

        if status == OrderStatus::Paid {
            record_payment(&mut tx, &placed, catalog).await?;
        }

        tx.commit().await?;

        Ok(OrderDetail {
            order: placed,
            lines,
        })
    }

    // =========================================================================
    // Status changes
    // =========================================================================

    /// Moves an order one step along its lifecycle.
    ///
    /// ## Errors
    /// - `OrderNotFound` for an unknown order
    /// - `InvalidTransition` for anything but Created → Paid, Paid →
    ///   Fulfilled, or Created/Paid → Cancelled
    pub async fn update_order_status(&self, order_id: &str, next: OrderStatus) -> EngineResult<Order> {
        let engine = self.clone();
        let order_id = order_id.to_string();
        tokio::spawn(async move { engine.transition(&order_id, next).await }).await?
    }

    async fn transition(&self, order_id: &str, next: OrderStatus) -> EngineResult<Order> {
        let _order_guard = self.order_locks.lock(order_id).await;

        let current = self.order(order_id).await?;
        if !current.status.can_transition_to(next) {
            warn!(order_id = %order_id, from = %current.status, to = %next, "Rejected status change");
            return Err(CoreError::InvalidTransition {
                order_id: order_id.to_string(),
                from: current.status,
                to: next,
            }
            .into());
        }

        let catalog = self.tiers.snapshot().await;

        // Product locks go before the connection; the token list is read first.
        let to_release = if next == OrderStatus::Cancelled {
            self.ledger.unreleased_tokens(order_id).await?
        } else {
            Vec::new()
        };
        let _product_guard = self
            .ledger
            .lock_products(to_release.iter().map(|t| t.product_id.as_str()))
            .await;

        let mut tx = self.db.begin_write().await?;

        if !order::update_status(&mut tx, order_id, current.status, next).await? {
            // Only this task moves the order while it holds the order lock.
            return Err(EngineError::TaskFailed(format!(
                "order {order_id} changed status concurrently"
            )));
        }

        match next {
            OrderStatus::Paid => {
                record_payment(&mut tx, &current, &catalog).await?;
            }
            OrderStatus::Cancelled => {
                for token in &to_release {
                    release_in(&mut tx, token).await?;
                }
                if current.status == OrderStatus::Paid {
                    let spend = user::add_spend(&mut tx, &current.user_id, -current.total_cents).await?;
                    let tier = catalog.resolve(Money::from_cents(spend));
                    user::set_tier(&mut tx, &current.user_id, &tier.id).await?;
                }
            }
            OrderStatus::Fulfilled | OrderStatus::Created => {}
        }

        tx.commit().await?;

        info!(order_id = %order_id, from = %current.status, to = %next, "Order status changed");
        self.order(order_id).await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_order(&self, order_id: &str) -> EngineResult<OrderDetail> {
        Ok(self
            .db
            .orders()
            .get_detail(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?)
    }

    pub async fn orders_by_user(&self, user_id: &str) -> EngineResult<Vec<Order>> {
        if self.db.users().get_by_id(user_id).await?.is_none() {
            return Err(CoreError::UserNotFound(user_id.to_string()).into());
        }
        Ok(self.db.orders().list_by_user(user_id).await?)
    }

    pub async fn list_orders(&self) -> EngineResult<Vec<Order>> {
        Ok(self.db.orders().list().await?)
    }

    /// Order, its lines, and the user who placed it.
    pub async fn get_order_with_user(&self, order_id: &str) -> EngineResult<OrderWithUser> {
        let detail = self.get_order(order_id).await?;
        let owner = self
            .db
            .users()
            .get_by_id(&detail.order.user_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(detail.order.user_id.clone()))?;

        Ok(OrderWithUser { detail, user: owner })
    }

    async fn order(&self, order_id: &str) -> EngineResult<Order> {
        Ok(self
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?)
    }
}

/// Writes the order's transaction and credits its total to the buyer.
async fn record_payment(
    conn: &mut SqliteConnection,
    paid: &Order,
    catalog: &TierCatalog,
) -> EngineResult<()> {
    transaction::insert_transaction(
        &mut *conn,
        &Transaction {
            id: new_id(),
            order_id: paid.id.clone(),
            amount_cents: paid.total_cents,
            created_at: Utc::now(),
        },
    )
    .await?;

    let spend = user::add_spend(&mut *conn, &paid.user_id, paid.total_cents).await?;
    let tier = catalog.resolve(Money::from_cents(spend));
    user::set_tier(&mut *conn, &paid.user_id, &tier.id).await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
