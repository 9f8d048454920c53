//! # Reservation Repository
//!
//! Rows behind the inventory ledger's reservation tokens.
//!
//! ## State Guards
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  mark_committed:  UPDATE ... SET state='committed', order_id=?         │
//! │                   WHERE id=? AND state='held'                          │
//! │                                                                         │
//! │  mark_released:   UPDATE ... SET state='released'                      │
//! │                   WHERE id=? AND state<>'released'                     │
//! │                                                                         │
//! │  rows_affected tells the caller whether THIS call made the move.       │
//! │  Only the caller that moved a row to 'released' returns its stock,     │
//! │  so stock comes back exactly once however many times release runs.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::{Reservation, ReservationState};

#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: SqlitePool,
}

impl ReservationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReservationRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Reservation>> {
        let mut conn = self.pool.acquire().await?;
        get_reservation(&mut conn, id).await
    }

    pub async fn list_for_order(&self, order_id: &str) -> DbResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, product_id, order_id, quantity, state, created_at, updated_at
            FROM reservations
            WHERE order_id = ?1
            ORDER BY product_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Held reservations created before `cutoff`, oldest first.
    pub async fn list_held_before(&self, cutoff: DateTime<Utc>) -> DbResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, product_id, order_id, quantity, state, created_at, updated_at
            FROM reservations
            WHERE state = 'held' AND created_at < ?1
            ORDER BY created_at
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn count_in_state(&self, state: ReservationState) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE state = ?1")
            .bind(state)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Connection-scoped functions
// =============================================================================

pub async fn get_reservation(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Reservation>> {
    let row = sqlx::query_as::<_, Reservation>(
        r#"
        SELECT id, product_id, order_id, quantity, state, created_at, updated_at
        FROM reservations
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

pub async fn insert_reservation(conn: &mut SqliteConnection, r: &Reservation) -> DbResult<()> {
    debug!(id = %r.id, product_id = %r.product_id, quantity = r.quantity, "Recording reservation");

    sqlx::query(
        r#"
        INSERT INTO reservations (
            id, product_id, order_id, quantity, state, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&r.id)
    .bind(&r.product_id)
    .bind(&r.order_id)
    .bind(r.quantity)
    .bind(r.state)
    .bind(r.created_at)
    .bind(r.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// `held → committed`, binding the reservation to `order_id`.
///
/// Returns `false` if the reservation is no longer held.
pub async fn mark_committed(
    conn: &mut SqliteConnection,
    id: &str,
    order_id: &str,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE reservations
        SET state = 'committed', order_id = ?2, updated_at = ?3
        WHERE id = ?1 AND state = 'held'
        "#,
    )
    .bind(id)
    .bind(order_id)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// `held|committed → released`.
///
/// Returns `true` only for the call that performed the move.
pub async fn mark_released(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE reservations
        SET state = 'released', updated_at = ?2
        WHERE id = ?1 AND state <> 'released'
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// `held → released`, leaving committed reservations alone.
///
/// Used by expiry, which must never take stock back from an order.
pub async fn mark_released_if_held(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE reservations
        SET state = 'released', updated_at = ?2
        WHERE id = ?1 AND state = 'held'
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Reservations of an order that still hold stock.
pub async fn unreleased_for_order(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<Reservation>> {
    let rows = sqlx::query_as::<_, Reservation>(
        r#"
        SELECT id, product_id, order_id, quantity, state, created_at, updated_at
        FROM reservations
        WHERE order_id = ?1 AND state <> 'released'
        ORDER BY product_id
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;

    Ok(rows)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::new_id;
    use crate::test_support::{db, product};

    fn held(product_id: &str, qty: i64) -> Reservation {
        let now = Utc::now();
        Reservation {
            id: new_id(),
            product_id: product_id.to_string(),
            order_id: None,
            quantity: qty,
            state: ReservationState::Held,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_release_moves_once() {
        let db = db().await;
        let p = product("P", 1, 5);
        db.products().insert(&p).await.unwrap();
        let r = held(&p.id, 2);

        let mut conn = db.pool().acquire().await.unwrap();
        insert_reservation(&mut conn, &r).await.unwrap();

        assert!(mark_released(&mut conn, &r.id).await.unwrap());
        assert!(!mark_released(&mut conn, &r.id).await.unwrap());
        assert!(!mark_committed(&mut conn, &r.id, "o").await.unwrap());

        let stored = get_reservation(&mut conn, &r.id).await.unwrap().unwrap();
        assert_eq!(stored.state, ReservationState::Released);
    }

    #[tokio::test]
    async fn test_held_before_cutoff() {
        let db = db().await;
        let p = product("P", 1, 5);
        db.products().insert(&p).await.unwrap();

        let mut old = held(&p.id, 1);
        old.created_at = Utc::now() - chrono::Duration::minutes(30);
        let fresh = held(&p.id, 1);

        let mut conn = db.pool().acquire().await.unwrap();
        insert_reservation(&mut conn, &old).await.unwrap();
        insert_reservation(&mut conn, &fresh).await.unwrap();
        drop(conn);

        let cutoff = Utc::now() - chrono::Duration::minutes(5);
        let stale = db.reservations().list_held_before(cutoff).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, old.id);
        assert_eq!(db.reservations().count_in_state(ReservationState::Held).await.unwrap(), 2);
    }
}
