//! # Tier Registry
//!
//! The stored tier ladder, cached as a [`TierCatalog`] behind a `RwLock`.
//! Reads never touch the database; creating a tier writes the row and the
//! cache under the write lock.

use std::sync::Arc;

use stockroom_core::{CoreError, Money, Tier, TierCatalog, User};
use stockroom_db::{new_id, Database, DbError};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::EngineResult;

#[derive(Debug, Clone)]
pub struct TierRegistry {
    db: Database,
    catalog: Arc<RwLock<TierCatalog>>,
}

impl TierRegistry {
    /// Loads the stored ladder.
    pub async fn load(db: Database) -> EngineResult<Self> {
        let catalog = TierCatalog::from_tiers(db.tiers().list().await?)?;
        info!(tiers = catalog.len(), "Tier catalog loaded");

        Ok(TierRegistry {
            db,
            catalog: Arc::new(RwLock::new(catalog)),
        })
    }

    /// Seeds `ladder` when no tier is stored yet.
    ///
    /// Returns the number of tiers inserted (zero if the table was not empty).
    pub async fn initial_tier_list(&self, ladder: &[Tier]) -> EngineResult<usize> {
        let mut catalog = self.catalog.write().await;
        if self.db.tiers().count().await? > 0 {
            return Ok(0);
        }

        let seeded = TierCatalog::from_tiers(ladder.iter().cloned())?;
        self.db.tiers().insert_all(seeded.tiers()).await?;
        *catalog = seeded;

        info!(tiers = ladder.len(), "Seeded initial tier list");
        Ok(ladder.len())
    }

    /// Adds a tier to the ladder.
    ///
    /// ## Errors
    /// - `Validation` for a blank name, negative threshold, or percent
    ///   outside 0..=100
    /// - `DuplicateTierThreshold` when the threshold is taken
    pub async fn create_tier(
        &self,
        name: &str,
        min_spend_cents: i64,
        discount_percent: i64,
    ) -> EngineResult<Tier> {
        let mut catalog = self.catalog.write().await;
        if let Err(e) = catalog.check_candidate(name, min_spend_cents, discount_percent) {
            warn!(min_spend_cents, discount_percent, error = %e, "Tier rejected");
            return Err(e.into());
        }

        let tier = Tier {
            id: new_id(),
            name: name.trim().to_string(),
            min_spend_cents,
            // checked to be within 0..=100 above
            discount_percent: discount_percent as u32,
        };

        match self.db.tiers().insert(&tier).await {
            Ok(()) => {}
            Err(DbError::UniqueViolation { .. }) => {
                return Err(CoreError::DuplicateTierThreshold { min_spend_cents }.into())
            }
            Err(e) => return Err(e.into()),
        }
        catalog.insert(tier.clone())?;

        info!(id = %tier.id, min_spend_cents, discount_percent, "Tier created");
        Ok(tier)
    }

    /// Tiers in ascending threshold order.
    pub async fn list(&self) -> Vec<Tier> {
        self.catalog.read().await.tiers().to_vec()
    }

    pub async fn resolve(&self, spend: Money) -> Tier {
        self.catalog.read().await.resolve(spend)
    }

    /// A copy of the current ladder.
    ///
    /// Taken before opening a database transaction, so the registry lock is
    /// never awaited while a connection is held.
    pub async fn snapshot(&self) -> TierCatalog {
        self.catalog.read().await.clone()
    }

    /// The discount percent a user currently earns.
    pub async fn discount_for_user(&self, user_id: &str) -> EngineResult<u32> {
        let user = self.user(user_id).await?;
        Ok(self.resolve(user.cumulative_spend()).await.discount_percent)
    }

    /// Re-derives a user's tier from their spend and stores it.
    pub async fn recompute_user_tier(&self, user_id: &str) -> EngineResult<User> {
        let user = self.user(user_id).await?;
        let tier = self.resolve(user.cumulative_spend()).await;
        if tier.id == user.tier_id {
            return Ok(user);
        }

        let updated = self.db.users().set_tier(user_id, &tier.id).await?;
        info!(user_id = %user_id, tier_id = %tier.id, "User tier updated");
        Ok(updated)
    }

    async fn user(&self, user_id: &str) -> EngineResult<User> {
        Ok(self
            .db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::test_support::{customer, db};
    use stockroom_core::{default_ladder, BASELINE_TIER_ID};

    #[tokio::test]
    async fn test_initial_tier_list_seeds_once() {
        let db = db().await;
        let registry = TierRegistry::load(db.clone()).await.unwrap();

        assert_eq!(registry.initial_tier_list(&default_ladder()).await.unwrap(), 4);
        assert_eq!(registry.initial_tier_list(&default_ladder()).await.unwrap(), 0);
        assert_eq!(registry.list().await.len(), 4);
        assert_eq!(db.tiers().count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_create_tier_rejects_duplicates_and_bad_values() {
        let db = db().await;
        let registry = TierRegistry::load(db).await.unwrap();

        registry.create_tier("Silver", 10_000, 5).await.unwrap();
        assert!(matches!(
            registry.create_tier("Silver again", 10_000, 7).await.unwrap_err(),
            EngineError::Core(CoreError::DuplicateTierThreshold { .. })
        ));
        assert!(matches!(
            registry.create_tier("Bad", -1, 5).await.unwrap_err(),
            EngineError::Core(CoreError::Validation(_))
        ));
        assert!(matches!(
            registry.create_tier("Bad", 5, 101).await.unwrap_err(),
            EngineError::Core(CoreError::Validation(_))
        ));
        assert_eq!(registry.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_uses_highest_qualifying_tier() {
        let db = db().await;
        let registry = TierRegistry::load(db).await.unwrap();
        registry.create_tier("Gold", 50_000, 10).await.unwrap();
        registry.create_tier("Silver", 10_000, 5).await.unwrap();

        assert_eq!(registry.resolve(Money::from_cents(9_999)).await.id, BASELINE_TIER_ID);
        assert_eq!(registry.resolve(Money::from_cents(10_000)).await.name, "Silver");
        assert_eq!(registry.resolve(Money::from_cents(75_000)).await.name, "Gold");
    }

    #[tokio::test]
    async fn test_discount_and_recompute_for_user() {
        let db = db().await;
        let registry = TierRegistry::load(db.clone()).await.unwrap();
        let silver = registry.create_tier("Silver", 10_000, 5).await.unwrap();
        let user = db.users().create(&customer("t@example.com")).await.unwrap();

        assert_eq!(registry.discount_for_user(&user.id).await.unwrap(), 0);

        let mut conn = db.pool().acquire().await.unwrap();
        stockroom_db::repository::user::add_spend(&mut conn, &user.id, 12_000)
            .await
            .unwrap();
        drop(conn);

        assert_eq!(registry.discount_for_user(&user.id).await.unwrap(), 5);
        let updated = registry.recompute_user_tier(&user.id).await.unwrap();
        assert_eq!(updated.tier_id, silver.id);

        assert!(matches!(
            registry.discount_for_user("nobody").await.unwrap_err(),
            EngineError::Core(CoreError::UserNotFound(_))
        ));
    }
}
