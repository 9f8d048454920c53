//! # Tier Repository
//!
//! Storage for the discount tier ladder. Tiers are insert-only.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::Tier;

#[derive(Debug, Clone)]
pub struct TierRepository {
    pool: SqlitePool,
}

impl TierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TierRepository { pool }
    }

    /// Tiers in ascending threshold order.
    pub async fn list(&self) -> DbResult<Vec<Tier>> {
        let tiers = sqlx::query_as::<_, Tier>(
            r#"
            SELECT id, name, min_spend_cents, discount_percent
            FROM tiers
            ORDER BY min_spend_cents
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tiers)
    }

    /// Stores a tier.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - threshold already used
    pub async fn insert(&self, tier: &Tier) -> DbResult<()> {
        debug!(
            id = %tier.id,
            min_spend_cents = tier.min_spend_cents,
            discount_percent = tier.discount_percent,
            "Inserting tier"
        );

        sqlx::query(
            r#"
            INSERT INTO tiers (id, name, min_spend_cents, discount_percent, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&tier.id)
        .bind(&tier.name)
        .bind(tier.min_spend_cents)
        .bind(tier.discount_percent)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts the whole ladder in one transaction.
    pub async fn insert_all(&self, tiers: &[Tier]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        for tier in tiers {
            sqlx::query(
                r#"
                INSERT INTO tiers (id, name, min_spend_cents, discount_percent, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&tier.id)
            .bind(&tier.name)
            .bind(tier.min_spend_cents)
            .bind(tier.discount_percent)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tiers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
