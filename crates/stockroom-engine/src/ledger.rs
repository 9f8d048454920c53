//! # Inventory Ledger
//!
//! Owns every change to product stock. A purchase takes stock out as a
//! `held` reservation, binds it to its order on commit, and gives it back
//! on release.
//!
//! ## Reservation Lifecycle
//! ```text
//!                 reserve()                  commit_in(tx, order)
//!   stock ──────────────────► HELD ───────────────────────────► COMMITTED
//!     ▲                        │                                    │
//!     │        release()       │           release_for_order()      │
//!     └──────────────────── RELEASED ◄──────────────────────────────┘
//!                               ▲
//!                               │ release_expired(ttl)   (held only)
//! ```
//!
//! ## Atomicity
//! - Reserve runs `UPDATE products SET stock = stock - q WHERE stock >= q`
//!   and inserts the reservation row in one database transaction, while
//!   holding the product's lock.
//! - Release moves a reservation to `released` with a conditional update;
//!   only the call that performs the move returns the stock.
//! - Basket reservation locks all products in ascending id order and keeps
//!   a compensation list; on the first failure the list is released in
//!   reverse and the failure is returned.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::SqliteConnection;
use stockroom_core::validation::validate_restock_quantity;
use stockroom_core::{
    Basket, CoreError, Product, Reservation, ReservationState, ValidationError,
};
use stockroom_db::repository::{product, reservation};
use stockroom_db::{new_id, Database, DbError};
use tracing::{debug, error, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::locks::KeyedLocks;

/// Handle to a reservation taken by [`InventoryLedger::reserve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationToken {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
}

impl From<&Reservation> for ReservationToken {
    fn from(r: &Reservation) -> Self {
        ReservationToken {
            id: r.id.clone(),
            product_id: r.product_id.clone(),
            quantity: r.quantity,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InventoryLedger {
    db: Database,
    locks: Arc<KeyedLocks>,
}

impl InventoryLedger {
    pub fn new(db: Database) -> Self {
        InventoryLedger {
            db,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    // =========================================================================
    // Reserve
    // =========================================================================

    /// Takes `quantity` units of a product out of stock.
    ///
    /// ## Errors
    /// - `ProductNotFound` for an unknown product
    /// - `InsufficientStock` when fewer than `quantity` units remain
    pub async fn reserve(&self, product_id: &str, quantity: i64) -> EngineResult<ReservationToken> {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".into(),
            }
            .into());
        }

        let _guard = self.locks.lock(product_id).await;
        self.reserve_locked(product_id, quantity).await
    }

    /// Reserves every basket line or none of them.
    ///
    /// Products are locked together in ascending id order for the whole
    /// call. Tokens come back in that same order.
    pub async fn reserve_basket(&self, basket: &Basket) -> EngineResult<Vec<ReservationToken>> {
        let product_ids = basket.sorted_product_ids();
        let _guard = self.locks.lock_all(product_ids.iter().copied()).await;

        let mut taken: Vec<ReservationToken> = Vec::with_capacity(basket.len());
        for product_id in product_ids {
            let quantity = basket
                .items()
                .iter()
                .find(|item| item.product_id == product_id)
                .map(|item| item.quantity)
                .unwrap_or_default();

            match self.reserve_locked(product_id, quantity).await {
                Ok(token) => taken.push(token),
                Err(e) => {
                    warn!(
                        product_id = %product_id,
                        reserved = taken.len(),
                        error = %e,
                        "Basket reservation failed, releasing earlier lines"
                    );
                    for token in taken.iter().rev() {
                        if let Err(release_err) = self.release_locked(token).await {
                            error!(
                                reservation_id = %token.id,
                                error = %release_err,
                                "Compensating release failed; left for the sweeper"
                            );
                        }
                    }
                    return Err(e);
                }
            }
        }

        debug!(lines = taken.len(), "Basket reserved");
        Ok(taken)
    }

    async fn reserve_locked(&self, product_id: &str, quantity: i64) -> EngineResult<ReservationToken> {
        let mut tx = self.db.begin_write().await?;

        if !product::try_take_stock(&mut tx, product_id, quantity).await? {
            let available = product::stock_of(&mut tx, product_id).await?;
            return Err(match available {
                None => CoreError::ProductNotFound(product_id.to_string()),
                Some(available) => CoreError::InsufficientStock {
                    product_id: product_id.to_string(),
                    available,
                    requested: quantity,
                },
            }
            .into());
        }

        let now = Utc::now();
        let row = Reservation {
            id: new_id(),
            product_id: product_id.to_string(),
            order_id: None,
            quantity,
            state: ReservationState::Held,
            created_at: now,
            updated_at: now,
        };
        reservation::insert_reservation(&mut tx, &row).await?;
        tx.commit().await?;

        debug!(reservation_id = %row.id, product_id = %product_id, quantity, "Stock reserved");
        Ok(ReservationToken::from(&row))
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Binds held reservations to `order_id` inside the caller's transaction.
    ///
    /// ## Errors
    /// - `ReservationExpired` if any token is no longer held; the caller
    ///   must roll the transaction back
    pub async fn commit_in(
        &self,
        conn: &mut SqliteConnection,
        tokens: &[ReservationToken],
        order_id: &str,
    ) -> EngineResult<()> {
        for token in tokens {
            if !reservation::mark_committed(&mut *conn, &token.id, order_id).await? {
                return Err(EngineError::ReservationExpired {
                    reservation_id: token.id.clone(),
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Release
    // =========================================================================

    /// Returns a reservation's stock. Repeated calls are no-ops.
    ///
    /// Returns `true` only for the call that actually released it.
    pub async fn release(&self, token: &ReservationToken) -> EngineResult<bool> {
        let _guard = self.locks.lock(&token.product_id).await;
        self.release_locked(token).await
    }

    /// Releases a list of tokens in reverse order, logging failures.
    ///
    /// Used to undo a basket reservation after a later step failed.
    pub async fn compensate(&self, tokens: &[ReservationToken]) {
        for token in tokens.iter().rev() {
            if let Err(e) = self.release(token).await {
                error!(
                    reservation_id = %token.id,
                    error = %e,
                    "Compensating release failed; left for the sweeper"
                );
            }
        }
    }

    async fn release_locked(&self, token: &ReservationToken) -> EngineResult<bool> {
        let mut tx = self.db.begin_write().await?;
        let released = release_in(&mut tx, token).await?;
        tx.commit().await?;
        Ok(released)
    }

    /// Releases every unreleased reservation of an order.
    ///
    /// Returns how many were released by this call.
    pub async fn release_for_order(&self, order_id: &str) -> EngineResult<usize> {
        let pending = self.unreleased_tokens(order_id).await?;
        if pending.is_empty() {
            return Ok(0);
        }

        let _guard = self
            .locks
            .lock_all(pending.iter().map(|t| t.product_id.as_str()))
            .await;

        let mut tx = self.db.begin_write().await?;
        let mut released = 0;
        for token in &pending {
            if release_in(&mut tx, token).await? {
                released += 1;
            }
        }
        tx.commit().await?;

        info!(order_id = %order_id, released, "Released order reservations");
        Ok(released)
    }

    /// Reservations of an order still holding stock, as tokens.
    pub async fn unreleased_tokens(&self, order_id: &str) -> EngineResult<Vec<ReservationToken>> {
        let rows = self.db.reservations().list_for_order(order_id).await?;
        Ok(rows
            .iter()
            .filter(|r| r.state != ReservationState::Released)
            .map(ReservationToken::from)
            .collect())
    }

    /// Releases `held` reservations older than `ttl`.
    ///
    /// Committed reservations belong to an order and are never expired.
    pub async fn release_expired(&self, ttl: Duration) -> EngineResult<usize> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| ValidationError::OutOfRange {
            field: "reservation_ttl".into(),
            min: 0,
            max: i64::MAX,
        })?;
        let cutoff = Utc::now() - ttl;

        let stale = self.db.reservations().list_held_before(cutoff).await?;
        let mut released = 0;
        for row in &stale {
            if self.expire(&ReservationToken::from(row)).await? {
                released += 1;
            }
        }

        if released > 0 {
            info!(released, "Released expired reservations");
        }
        Ok(released)
    }

    /// Releases a reservation only if it is still held.
    ///
    /// An order may commit the reservation after it was listed as stale;
    /// that reservation is left with its order.
    async fn expire(&self, token: &ReservationToken) -> EngineResult<bool> {
        let _guard = self.locks.lock(&token.product_id).await;
        let mut tx = self.db.begin_write().await?;
        if !reservation::mark_released_if_held(&mut tx, &token.id).await? {
            debug!(reservation_id = %token.id, "Reservation no longer held, not expired");
            return Ok(false);
        }
        return_reserved_stock(&mut tx, token).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Locks the given products for a caller that will release reservations
    /// through [`release_in`] inside its own transaction.
    pub async fn lock_products<'a>(
        &self,
        product_ids: impl IntoIterator<Item = &'a str>,
    ) -> crate::locks::KeyGuard {
        self.locks.lock_all(product_ids).await
    }

    // =========================================================================
    // Restock and reads
    // =========================================================================

    /// Adds stock to a product and returns it.
    pub async fn restock(&self, product_id: &str, quantity: i64) -> EngineResult<Product> {
        validate_restock_quantity(quantity)?;

        let _guard = self.locks.lock(product_id).await;
        {
            let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
            if !product::return_stock(&mut conn, product_id, quantity).await? {
                return Err(CoreError::ProductNotFound(product_id.to_string()).into());
            }
        }

        let restocked = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        info!(product_id = %product_id, quantity, stock = restocked.stock, "Product restocked");
        Ok(restocked)
    }

    /// Units currently available for a product.
    pub async fn available(&self, product_id: &str) -> EngineResult<i64> {
        let product = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
        Ok(product.stock)
    }
}

/// Releases one reservation inside the caller's transaction.
///
/// The caller must hold the product's lock. Returns `false` when the
/// reservation was already released.
pub async fn release_in(conn: &mut SqliteConnection, token: &ReservationToken) -> EngineResult<bool> {
    if !reservation::mark_released(&mut *conn, &token.id).await? {
        debug!(reservation_id = %token.id, "Reservation already released");
        return Ok(false);
    }

    return_reserved_stock(conn, token).await?;
    Ok(true)
}

async fn return_reserved_stock(conn: &mut SqliteConnection, token: &ReservationToken) -> EngineResult<()> {
    if !product::return_stock(&mut *conn, &token.product_id, token.quantity).await? {
        return Err(CoreError::ProductNotFound(token.product_id.clone()).into());
    }

    debug!(reservation_id = %token.id, product_id = %token.product_id, quantity = token.quantity, "Stock released");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{db, stock_of, with_product};
    use stockroom_core::BasketItem;

    #[tokio::test]
    async fn test_reserve_decrements_and_release_restores() {
        let db = db().await;
        let p = with_product(&db, "Bolt", 100, 5).await;
        let ledger = InventoryLedger::new(db.clone());

        let token = ledger.reserve(&p.id, 3).await.unwrap();
        assert_eq!(stock_of(&db, &p.id).await, 2);

        assert!(ledger.release(&token).await.unwrap());
        assert_eq!(stock_of(&db, &p.id).await, 5);
    }

    #[tokio::test]
    async fn test_release_twice_is_noop() {
        let db = db().await;
        let p = with_product(&db, "Nut", 10, 4).await;
        let ledger = InventoryLedger::new(db.clone());

        let token = ledger.reserve(&p.id, 4).await.unwrap();
        assert!(ledger.release(&token).await.unwrap());
        assert!(!ledger.release(&token).await.unwrap());
        assert_eq!(stock_of(&db, &p.id).await, 4);
    }

    #[tokio::test]
    async fn test_reserve_errors() {
        let db = db().await;
        let p = with_product(&db, "Hinge", 10, 2).await;
        let ledger = InventoryLedger::new(db.clone());

        let err = ledger.reserve(&p.id, 3).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            })
        ));

        let err = ledger.reserve("missing", 1).await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::ProductNotFound(_))));

        let err = ledger.reserve(&p.id, 0).await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::Validation(_))));

        assert_eq!(stock_of(&db, &p.id).await, 2);
    }

    #[tokio::test]
    async fn test_basket_is_all_or_nothing() {
        let db = db().await;
        let a = with_product(&db, "A", 100, 5).await;
        let b = with_product(&db, "B", 50, 1).await;
        let ledger = InventoryLedger::new(db.clone());

        let basket = Basket::new(vec![
            BasketItem::new(a.id.clone(), 2),
            BasketItem::new(b.id.clone(), 2),
        ])
        .unwrap();

        let err = ledger.reserve_basket(&basket).await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::InsufficientStock { .. })));
        assert_eq!(stock_of(&db, &a.id).await, 5);
        assert_eq!(stock_of(&db, &b.id).await, 1);
        assert_eq!(
            db.reservations().count_in_state(ReservationState::Held).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_basket_with_unknown_product_restores_stock() {
        let db = db().await;
        let a = with_product(&db, "A", 100, 5).await;
        let ledger = InventoryLedger::new(db.clone());

        // "zzz" sorts after the real uuid, so A is reserved first
        let basket = Basket::new(vec![
            BasketItem::new("zzz", 1),
            BasketItem::new(a.id.clone(), 5),
        ])
        .unwrap();

        let err = ledger.reserve_basket(&basket).await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::ProductNotFound(_))));
        assert_eq!(stock_of(&db, &a.id).await, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reserves_never_oversell() {
        let db = db().await;
        let p = with_product(&db, "Scarce", 100, 7).await;
        let ledger = InventoryLedger::new(db.clone());

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = ledger.clone();
            let id = p.id.clone();
            handles.push(tokio::spawn(async move { ledger.reserve(&id, 1).await }));
        }

        let mut ok = 0;
        let mut short = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => ok += 1,
                Err(EngineError::Core(CoreError::InsufficientStock { .. })) => short += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(ok, 7);
        assert_eq!(short, 13);
        assert_eq!(stock_of(&db, &p.id).await, 0);
    }

    #[tokio::test]
    async fn test_commit_then_release_for_order() {
        let db = db().await;
        let p = with_product(&db, "Pipe", 100, 10).await;
        let user = db
            .users()
            .create(&crate::test_support::customer("c@example.com"))
            .await
            .unwrap();
        let ledger = InventoryLedger::new(db.clone());
        let token = ledger.reserve(&p.id, 4).await.unwrap();

        let order = crate::test_support::bare_order(&user.id);
        let mut tx = db.begin_write().await.unwrap();
        stockroom_db::repository::order::insert_order(&mut tx, &order)
            .await
            .unwrap();
        ledger.commit_in(&mut tx, &[token.clone()], &order.id).await.unwrap();
        tx.commit().await.unwrap();

        let row = db.reservations().get_by_id(&token.id).await.unwrap().unwrap();
        assert_eq!(row.state, ReservationState::Committed);

        assert_eq!(ledger.release_for_order(&order.id).await.unwrap(), 1);
        assert_eq!(ledger.release_for_order(&order.id).await.unwrap(), 0);
        assert_eq!(stock_of(&db, &p.id).await, 10);
    }

    #[tokio::test]
    async fn test_commit_of_released_token_fails() {
        let db = db().await;
        let p = with_product(&db, "Seal", 100, 3).await;
        let user = db
            .users()
            .create(&crate::test_support::customer("d@example.com"))
            .await
            .unwrap();
        let ledger = InventoryLedger::new(db.clone());
        let token = ledger.reserve(&p.id, 1).await.unwrap();
        ledger.release(&token).await.unwrap();

        let order = crate::test_support::bare_order(&user.id);
        let mut tx = db.begin_write().await.unwrap();
        stockroom_db::repository::order::insert_order(&mut tx, &order)
            .await
            .unwrap();
        let err = ledger.commit_in(&mut tx, &[token], &order.id).await.unwrap_err();
        assert!(matches!(err, EngineError::ReservationExpired { .. }));
    }

    #[tokio::test]
    async fn test_release_expired_only_touches_old_held() {
        let db = db().await;
        let p = with_product(&db, "Fuse", 100, 6).await;
        let ledger = InventoryLedger::new(db.clone());

        ledger.reserve(&p.id, 2).await.unwrap();
        assert_eq!(ledger.release_expired(Duration::from_secs(3600)).await.unwrap(), 0);
        assert_eq!(stock_of(&db, &p.id).await, 4);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(ledger.release_expired(Duration::from_millis(1)).await.unwrap(), 1);
        assert_eq!(stock_of(&db, &p.id).await, 6);
    }

    #[tokio::test]
    async fn test_expiry_leaves_reservation_committed_after_listing() {
        let db = db().await;
        let p = with_product(&db, "Gasket", 100, 5).await;
        let user = db
            .users()
            .create(&crate::test_support::customer("e@example.com"))
            .await
            .unwrap();
        let ledger = InventoryLedger::new(db.clone());
        let token = ledger.reserve(&p.id, 2).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        let cutoff = Utc::now();
        let stale = db.reservations().list_held_before(cutoff).await.unwrap();
        assert_eq!(stale.len(), 1);

        // The order commits between the sweeper's listing and its release
        let order = crate::test_support::bare_order(&user.id);
        let mut tx = db.begin_write().await.unwrap();
        stockroom_db::repository::order::insert_order(&mut tx, &order)
            .await
            .unwrap();
        ledger.commit_in(&mut tx, &[token.clone()], &order.id).await.unwrap();
        tx.commit().await.unwrap();

        assert!(!ledger.expire(&ReservationToken::from(&stale[0])).await.unwrap());

        let row = db.reservations().get_by_id(&token.id).await.unwrap().unwrap();
        assert_eq!(row.state, ReservationState::Committed);
        assert_eq!(stock_of(&db, &p.id).await, 3);

        // Cancelling the order still returns the stock exactly once
        assert_eq!(ledger.release_for_order(&order.id).await.unwrap(), 1);
        assert_eq!(stock_of(&db, &p.id).await, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_reserves_on_file_database() {
        let (_dir, db) = crate::test_support::file_db().await;
        let scarce = with_product(&db, "Scarce", 100, 5).await;
        let ledger = InventoryLedger::new(db.clone());

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = ledger.clone();
            let id = scarce.id.clone();
            handles.push(tokio::spawn(async move { ledger.reserve(&id, 1).await }));
        }

        let mut ok = 0;
        let mut short = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => ok += 1,
                Err(EngineError::Core(CoreError::InsufficientStock { .. })) => short += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(ok, 5);
        assert_eq!(short, 15);
        assert_eq!(stock_of(&db, &scarce.id).await, 0);
    }

    #[tokio::test]
    async fn test_restock() {
        let db = db().await;
        let p = with_product(&db, "Tap", 100, 0).await;
        let ledger = InventoryLedger::new(db.clone());

        let restocked = ledger.restock(&p.id, 12).await.unwrap();
        assert_eq!(restocked.stock, 12);
        assert_eq!(ledger.available(&p.id).await.unwrap(), 12);

        assert!(matches!(
            ledger.restock("missing", 1).await.unwrap_err(),
            EngineError::Core(CoreError::ProductNotFound(_))
        ));
        assert!(matches!(
            ledger.restock(&p.id, 0).await.unwrap_err(),
            EngineError::Core(CoreError::Validation(_))
        ));
    }
}
