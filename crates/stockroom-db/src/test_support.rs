//! Fixtures shared by the repository tests.

use chrono::Utc;
use stockroom_core::{Product, Tier, UserRole, BASELINE_TIER_ID};

use crate::pool::{Database, DbConfig};
use crate::repository::{new_id, NewUser};

pub async fn db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

pub fn product(name: &str, price_cents: i64, stock: i64) -> Product {
    let now = Utc::now();
    Product {
        id: new_id(),
        name: name.to_string(),
        description: None,
        price_cents,
        stock,
        created_at: now,
        updated_at: now,
    }
}

pub fn customer(email: &str) -> NewUser {
    NewUser {
        name: "Test Customer".to_string(),
        email: email.to_string(),
        password_hash: "hash".to_string(),
        role: UserRole::Customer,
        tier_id: BASELINE_TIER_ID.to_string(),
    }
}

pub fn tier(id: &str, min_spend_cents: i64, discount_percent: u32) -> Tier {
    Tier {
        id: id.to_string(),
        name: id.to_string(),
        min_spend_cents,
        discount_percent,
    }
}
