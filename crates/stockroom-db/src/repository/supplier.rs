//! # Supplier Repository
//!
//! Suppliers and the restock documents (supplier order lists) sent to them.
//! Record-keeping only: nothing here touches product stock.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use stockroom_core::{Supplier, SupplierOrderLine, SupplierOrderList, SupplierOrderStatus};

/// One requested line of a new supplier order list.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSupplierOrderLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    pub async fn create(
        &self,
        name: &str,
        contact_email: Option<&str>,
        phone: Option<&str>,
    ) -> DbResult<Supplier> {
        let now = Utc::now();
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (id, name, contact_email, phone, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING id, name, contact_email, phone, created_at, updated_at
            "#,
        )
        .bind(new_id())
        .bind(name.trim())
        .bind(contact_email)
        .bind(phone)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        debug!(id = %supplier.id, name = %supplier.name, "Created supplier");
        Ok(supplier)
    }

    pub async fn update(
        &self,
        id: &str,
        name: &str,
        contact_email: Option<&str>,
        phone: Option<&str>,
    ) -> DbResult<Supplier> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE suppliers SET name = ?2, contact_email = ?3, phone = ?4, updated_at = ?5
            WHERE id = ?1
            RETURNING id, name, contact_email, phone, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name.trim())
        .bind(contact_email)
        .bind(phone)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        supplier.ok_or_else(|| DbError::not_found("Supplier", id))
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, contact_email, phone, created_at, updated_at
            FROM suppliers WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(supplier)
    }

    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, contact_email, phone, created_at, updated_at
            FROM suppliers ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    // =========================================================================
    // Supplier order lists
    // =========================================================================

    /// Records a list and its lines in one transaction, status Pending.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - unknown supplier or product
    pub async fn create_order_list(
        &self,
        supplier_id: &str,
        lines: &[NewSupplierOrderLine],
    ) -> DbResult<SupplierOrderList> {
        let total_cost_cents = lines
            .iter()
            .try_fold(0i64, |acc, l| {
                l.unit_cost_cents
                    .checked_mul(l.quantity)
                    .and_then(|line| acc.checked_add(line))
            })
            .ok_or_else(|| DbError::CheckViolation("supplier order total overflows".to_string()))?;

        let now = Utc::now();
        let list_id = new_id();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO supplier_order_lists (
                id, supplier_id, status, total_cost_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(&list_id)
        .bind(supplier_id)
        .bind(SupplierOrderStatus::Pending)
        .bind(total_cost_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let mut stored = Vec::with_capacity(lines.len());
        for l in lines {
            let line = SupplierOrderLine {
                id: new_id(),
                list_id: list_id.clone(),
                product_id: l.product_id.clone(),
                quantity: l.quantity,
                unit_cost_cents: l.unit_cost_cents,
            };
            sqlx::query(
                r#"
                INSERT INTO supplier_order_lines (id, list_id, product_id, quantity, unit_cost_cents)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&line.id)
            .bind(&line.list_id)
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(line.unit_cost_cents)
            .execute(&mut *tx)
            .await?;
            stored.push(line);
        }

        tx.commit().await?;

        debug!(id = %list_id, supplier_id = %supplier_id, lines = stored.len(), "Recorded supplier order list");

        Ok(SupplierOrderList {
            id: list_id,
            supplier_id: supplier_id.to_string(),
            status: SupplierOrderStatus::Pending,
            total_cost_cents,
            created_at: now,
            updated_at: now,
            lines: stored,
        })
    }

    pub async fn get_order_list(&self, id: &str) -> DbResult<Option<SupplierOrderList>> {
        let mut conn = self.pool.acquire().await?;

        let list = sqlx::query_as::<_, SupplierOrderList>(
            r#"
            SELECT id, supplier_id, status, total_cost_cents, created_at, updated_at
            FROM supplier_order_lists WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        match list {
            Some(mut list) => {
                list.lines = order_list_lines(&mut conn, &list.id).await?;
                Ok(Some(list))
            }
            None => Ok(None),
        }
    }

    pub async fn list_order_lists(&self) -> DbResult<Vec<SupplierOrderList>> {
        let mut conn = self.pool.acquire().await?;
        let lists = sqlx::query_as::<_, SupplierOrderList>(
            r#"
            SELECT id, supplier_id, status, total_cost_cents, created_at, updated_at
            FROM supplier_order_lists ORDER BY created_at DESC, id
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        with_lines(&mut conn, lists).await
    }

    pub async fn list_order_lists_by_supplier(
        &self,
        supplier_id: &str,
    ) -> DbResult<Vec<SupplierOrderList>> {
        let mut conn = self.pool.acquire().await?;
        let lists = sqlx::query_as::<_, SupplierOrderList>(
            r#"
            SELECT id, supplier_id, status, total_cost_cents, created_at, updated_at
            FROM supplier_order_lists WHERE supplier_id = ?1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(supplier_id)
        .fetch_all(&mut *conn)
        .await?;

        with_lines(&mut conn, lists).await
    }

    /// Moves a list from `from` to `to` if it is still in `from`.
    pub async fn set_order_list_status(
        &self,
        id: &str,
        from: SupplierOrderStatus,
        to: SupplierOrderStatus,
    ) -> DbResult<bool> {
        debug!(id = %id, from = %from, to = %to, "Updating supplier order list status");

        let result = sqlx::query(
            r#"
            UPDATE supplier_order_lists SET status = ?3, updated_at = ?4
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

async fn order_list_lines(
    conn: &mut SqliteConnection,
    list_id: &str,
) -> DbResult<Vec<SupplierOrderLine>> {
    let lines = sqlx::query_as::<_, SupplierOrderLine>(
        r#"
        SELECT id, list_id, product_id, quantity, unit_cost_cents
        FROM supplier_order_lines WHERE list_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(list_id)
    .fetch_all(conn)
    .await?;

    Ok(lines)
}

async fn with_lines(
    conn: &mut SqliteConnection,
    mut lists: Vec<SupplierOrderList>,
) -> DbResult<Vec<SupplierOrderList>> {
    for list in &mut lists {
        list.lines = order_list_lines(conn, &list.id).await?;
    }
    Ok(lists)
}

// =============================================================================
// Unit Tests
// =============================================================================
