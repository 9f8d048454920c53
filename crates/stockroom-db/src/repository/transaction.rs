//! # Transaction Repository
//!
//! Payment audit records. One row per order (UNIQUE on `order_id`), written
//! in the same database transaction that moves the order to Paid, and never
//! updated or deleted.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::Transaction;

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Transaction>> {
        let txs = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, order_id, amount_cents, created_at
            FROM transactions
            ORDER BY created_at DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(txs)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let tx = sqlx::query_as::<_, Transaction>(
            "SELECT id, order_id, amount_cents, created_at FROM transactions WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tx)
    }

    pub async fn get_by_order(&self, order_id: &str) -> DbResult<Option<Transaction>> {
        let tx = sqlx::query_as::<_, Transaction>(
            "SELECT id, order_id, amount_cents, created_at FROM transactions WHERE order_id = ?1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tx)
    }

    /// Number of transactions recorded for an order: 0 or 1.
    pub async fn count_for_order(&self, order_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE order_id = ?1")
            .bind(order_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Records the transaction. Fails with `UniqueViolation` if the order
/// already has one.
pub async fn insert_transaction(conn: &mut SqliteConnection, tx: &Transaction) -> DbResult<()> {
    debug!(id = %tx.id, order_id = %tx.order_id, amount_cents = tx.amount_cents, "Recording transaction");

    sqlx::query(
        r#"
        INSERT INTO transactions (id, order_id, amount_cents, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&tx.id)
    .bind(&tx.order_id)
    .bind(tx.amount_cents)
    .bind(tx.created_at)
    .execute(conn)
    .await?;

    Ok(())
}
