//! Fixtures shared by the engine tests.

use chrono::Utc;
use stockroom_core::{Order, OrderStatus, Product, UserRole, BASELINE_TIER_ID};
use stockroom_db::{new_id, Database, DbConfig, NewUser};

pub async fn db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

/// A file-backed database with a multi-connection WAL pool.
///
/// Keep the returned directory alive for as long as the database is used.
pub async fn file_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = Database::new(DbConfig::new(dir.path().join("stockroom.db")).max_connections(8))
        .await
        .expect("file database");
    (dir, db)
}

/// Inserts a product and returns it.
pub async fn with_product(db: &Database, name: &str, price_cents: i64, stock: i64) -> Product {
    let now = Utc::now();
    let product = Product {
        id: new_id(),
        name: name.to_string(),
        description: None,
        price_cents,
        stock,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.expect("insert product")
}

pub async fn stock_of(db: &Database, product_id: &str) -> i64 {
    db.products()
        .get_by_id(product_id)
        .await
        .expect("read product")
        .expect("product exists")
        .stock
}

pub fn customer(email: &str) -> NewUser {
    NewUser {
        name: "Engine Customer".to_string(),
        email: email.to_string(),
        password_hash: "hash".to_string(),
        role: UserRole::Customer,
        tier_id: BASELINE_TIER_ID.to_string(),
    }
}

/// An empty Created order for ledger tests that drive commit by hand.
pub fn bare_order(user_id: &str) -> Order {
    let now = Utc::now();
    Order {
        id: new_id(),
        user_id: user_id.to_string(),
        status: OrderStatus::Created,
        subtotal_cents: 0,
        discount_percent: 0,
        total_cents: 0,
        created_at: now,
        updated_at: now,
    }
}
