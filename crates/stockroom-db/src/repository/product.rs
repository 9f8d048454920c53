//! # Product Repository
//!
//! Product records and their stock counters.
//!
//! ## Stock Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ read stock, check in Rust, write absolute value                    │
//! │     (two buyers both read 1, both write 0, both "win")                 │
//! │                                                                         │
//! │  ✅ one conditional delta statement                                    │
//! │     UPDATE products SET stock = stock - ?qty                           │
//! │     WHERE id = ?id AND stock >= ?qty                                   │
//! │                                                                         │
//! │  rows_affected == 1 → taken                                            │
//! │  rows_affected == 0 → missing product OR not enough stock              │
//! │                       (caller reads stock to tell which)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only the inventory ledger calls the stock functions. `update_details`
//! never touches `stock`.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::Product;

/// Optional criteria for `POST /products/filter`. All set fields must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring of the product name.
    pub name: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    /// `Some(true)` keeps products with stock > 0, `Some(false)` those with none.
    pub in_stock: Option<bool>,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price_cents, stock, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// All products, by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price_cents, stock, created_at, updated_at
            FROM products
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Products matching every criterion set in `filter`.
    pub async fn filter(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        debug!(?filter, "Filtering products");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, name, description, price_cents, stock, created_at, updated_at \
             FROM products WHERE 1 = 1",
        );

        if let Some(name) = filter.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            qb.push(" AND name LIKE ")
                .push_bind(format!("%{}%", escape_like(name)))
                .push(" ESCAPE '\\'");
        }
        if let Some(min) = filter.min_price_cents {
            qb.push(" AND price_cents >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price_cents {
            qb.push(" AND price_cents <= ").push_bind(max);
        }
        match filter.in_stock {
            Some(true) => {
                qb.push(" AND stock > 0");
            }
            Some(false) => {
                qb.push(" AND stock = 0");
            }
            None => {}
        }
        qb.push(" ORDER BY name, id");

        let products = qb
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Filter returned products");
        Ok(products)
    }

    /// Inserts a new product. The id is generated by the caller.
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        let mut conn = self.pool.acquire().await?;
        insert_product(&mut conn, product).await?;
        Ok(product.clone())
    }

    /// Inserts several products in one transaction; none are stored if any
    /// insert fails.
    pub async fn insert_many(&self, products: &[Product]) -> DbResult<Vec<Product>> {
        let mut tx = self.pool.begin().await?;
        for product in products {
            insert_product(&mut tx, product).await?;
        }
        tx.commit().await?;

        debug!(count = products.len(), "Inserted products");
        Ok(products.to_vec())
    }

    /// Updates name, description and price. Stock is left alone.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update_details(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
        price_cents: i64,
    ) -> DbResult<Product> {
        debug!(id = %id, "Updating product details");

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                updated_at = ?5
            WHERE id = ?1
            RETURNING id, name, description, price_cents, stock, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(price_cents)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        product.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Counts products (for diagnostics and the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-scoped functions
// =============================================================================

pub async fn insert_product(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    debug!(id = %product.id, name = %product.name, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (id, name, description, price_cents, stock, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price_cents)
    .bind(product.stock)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Products with the given ids, in id order. Unknown ids are skipped.
pub async fn get_many(conn: &mut SqliteConnection, ids: &[&str]) -> DbResult<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, name, description, price_cents, stock, created_at, updated_at \
         FROM products WHERE id IN (",
    );
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY id");

    Ok(qb.build_query_as::<Product>().fetch_all(conn).await?)
}

/// Current stock, or `None` for an unknown product.
pub async fn stock_of(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<i64>> {
    let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(stock)
}

/// Takes `qty` units if at least that many are available.
///
/// Returns `false` when nothing was taken (unknown product or short stock).
pub async fn try_take_stock(conn: &mut SqliteConnection, id: &str, qty: i64) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        "#,
    )
    .bind(id)
    .bind(qty)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Adds `qty` units back. Returns `false` for an unknown product.
pub async fn return_stock(conn: &mut SqliteConnection, id: &str, qty: i64) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock + ?2, updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(qty)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
