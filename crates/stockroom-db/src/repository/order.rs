//! # Order Repository
//!
//! Orders and their lines.
//!
//! ## Order Lifecycle in SQL
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. CREATE (inside the engine's transaction)                           │
//! │     └── insert_order()       → orders row, status created|paid         │
//! │     └── insert_line() × n    → order_lines rows (immutable)            │
//! │                                                                         │
//! │  2. STATUS CHANGE                                                      │
//! │     └── update_status(from, to)                                        │
//! │         UPDATE orders SET status = to WHERE id = ? AND status = from   │
//! │         0 rows → someone else moved it first                           │
//! │                                                                         │
//! │  No other column of an order or line is ever updated.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::{Order, OrderDetail, OrderLine, OrderStatus};

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        get_order(&mut conn, id).await
    }

    /// Order plus its lines.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<OrderDetail>> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = get_order(&mut conn, id).await? else {
            return Ok(None);
        };
        let lines = lines_of(&mut conn, id).await?;
        Ok(Some(OrderDetail { order, lines }))
    }

    /// All orders, newest first.
    pub async fn list(&self) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, status, subtotal_cents, discount_percent, total_cents,
                   created_at, updated_at
            FROM orders
            ORDER BY created_at DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Orders of one user, newest first.
    pub async fn list_by_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, status, subtotal_cents, discount_percent, total_cents,
                   created_at, updated_at
            FROM orders
            WHERE user_id = ?1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    pub async fn lines_of(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let mut conn = self.pool.acquire().await?;
        lines_of(&mut conn, order_id).await
    }

    /// Every order line in the system.
    pub async fn list_lines(&self) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price_cents, line_total_cents,
                   created_at
            FROM order_lines
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    pub async fn get_line(&self, id: &str) -> DbResult<Option<OrderLine>> {
        let line = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price_cents, line_total_cents,
                   created_at
            FROM order_lines
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }

    /// The line for `product_id` within `order_id`. At most one exists.
    pub async fn get_line_by_order_and_product(
        &self,
        order_id: &str,
        product_id: &str,
    ) -> DbResult<Option<OrderLine>> {
        let line = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price_cents, line_total_cents,
                   created_at
            FROM order_lines
            WHERE order_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(order_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }
}

// =============================================================================
// Connection-scoped functions
// =============================================================================

pub async fn get_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        r#"
        SELECT id, user_id, status, subtotal_cents, discount_percent, total_cents,
               created_at, updated_at
        FROM orders
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(order)
}

pub async fn lines_of(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderLine>> {
    let lines = sqlx::query_as::<_, OrderLine>(
        r#"
        SELECT id, order_id, product_id, quantity, unit_price_cents, line_total_cents,
               created_at
        FROM order_lines
        WHERE order_id = ?1
        ORDER BY created_at, id
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;

    Ok(lines)
}

pub async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    debug!(
        id = %order.id,
        user_id = %order.user_id,
        status = %order.status,
        total_cents = order.total_cents,
        "Inserting order"
    );

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, user_id, status, subtotal_cents, discount_percent, total_cents,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&order.id)
    .bind(&order.user_id)
    .bind(order.status)
    .bind(order.subtotal_cents)
    .bind(order.discount_percent)
    .bind(order.total_cents)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn insert_line(conn: &mut SqliteConnection, line: &OrderLine) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_lines (
            id, order_id, product_id, quantity, unit_price_cents, line_total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&line.id)
    .bind(&line.order_id)
    .bind(&line.product_id)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .bind(line.line_total_cents)
    .bind(line.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Moves an order from `from` to `to` if it is still in `from`.
///
/// Returns `false` when the order is missing or already left `from`.
pub async fn update_status(
    conn: &mut SqliteConnection,
    id: &str,
    from: OrderStatus,
    to: OrderStatus,
) -> DbResult<bool> {
    debug!(id = %id, from = %from, to = %to, "Updating order status");

    let result = sqlx::query(
        r#"
        UPDATE orders SET status = ?3, updated_at = ?4
        WHERE id = ?1 AND status = ?2
        "#,
    )
    .bind(id)
    .bind(from)
    .bind(to)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::new_id;
    use crate::test_support::{customer, db, product};

    fn order(user_id: &str, status: OrderStatus, subtotal: i64) -> Order {
        let now = Utc::now();
        Order {
            id: new_id(),
            user_id: user_id.to_string(),
            status,
            subtotal_cents: subtotal,
            discount_percent: 0,
            total_cents: subtotal,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(order_id: &str, product_id: &str, qty: i64, unit: i64) -> OrderLine {
        OrderLine {
            id: new_id(),
            order_id: order_id.to_string(),
            product_id: product_id.to_string(),
            quantity: qty,
            unit_price_cents: unit,
            line_total_cents: qty * unit,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_order_with_lines_round_trip() {
        let db = db().await;
        let user = db.users().create(&customer("o@b.co")).await.unwrap();
        let p = product("Widget", 100, 10);
        db.products().insert(&p).await.unwrap();

        let o = order(&user.id, OrderStatus::Created, 200);
        let l = line(&o.id, &p.id, 2, 100);

        let mut tx = db.begin_write().await.unwrap();
        insert_order(&mut tx, &o).await.unwrap();
        insert_line(&mut tx, &l).await.unwrap();
        tx.commit().await.unwrap();

        let detail = db.orders().get_detail(&o.id).await.unwrap().unwrap();
        assert_eq!(detail.order.status, OrderStatus::Created);
        assert_eq!(detail.lines, vec![l.clone()]);
        assert_eq!(detail.lines_total().cents(), detail.order.subtotal_cents);

        assert_eq!(db.orders().list_by_user(&user.id).await.unwrap().len(), 1);
        assert_eq!(db.orders().get_line(&l.id).await.unwrap(), Some(l.clone()));
        assert_eq!(
            db.orders()
                .get_line_by_order_and_product(&o.id, &p.id)
                .await
                .unwrap(),
            Some(l)
        );
    }

    #[tokio::test]
    async fn test_rolled_back_order_leaves_nothing() {
        let db = db().await;
        let user = db.users().create(&customer("r@b.co")).await.unwrap();
        let o = order(&user.id, OrderStatus::Created, 0);

        {
            let mut tx = db.begin_write().await.unwrap();
            insert_order(&mut tx, &o).await.unwrap();
            // unknown product violates the foreign key
            assert!(insert_line(&mut tx, &line(&o.id, "ghost", 1, 1)).await.is_err());
        }

        assert!(db.orders().get_by_id(&o.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_status_is_conditional() {
        let db = db().await;
        let user = db.users().create(&customer("u@b.co")).await.unwrap();
        let o = order(&user.id, OrderStatus::Created, 0);

        let mut conn = db.pool().acquire().await.unwrap();
        insert_order(&mut conn, &o).await.unwrap();

        assert!(update_status(&mut conn, &o.id, OrderStatus::Created, OrderStatus::Paid)
            .await
            .unwrap());
        assert!(!update_status(&mut conn, &o.id, OrderStatus::Created, OrderStatus::Cancelled)
            .await
            .unwrap());
        assert_eq!(
            get_order(&mut conn, &o.id).await.unwrap().unwrap().status,
            OrderStatus::Paid
        );
    }
}
