//! Shared application state.
//!
//! Built once at startup and cloned into every handler. Holds no globals:
//! the database pool, the engine services, and the token manager all live
//! here.

use std::sync::Arc;

use stockroom_core::Money;
use stockroom_db::Database;
use stockroom_engine::{FulfillmentEngine, InventoryLedger, SupplierRecorder, TierRegistry};
use tracing::info;

use crate::auth::{ensure_admin, JwtManager};
use crate::config::ApiConfig;
use crate::error::ApiResult;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub engine: FulfillmentEngine,
    pub suppliers: SupplierRecorder,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Opens the database, seeds the tier ladder into an empty catalog, and
    /// creates the admin account if none exists.
    pub async fn initialize(config: ApiConfig) -> ApiResult<Self> {
        let db = Database::new(config.db_config()).await?;

        let tiers = TierRegistry::load(db.clone()).await?;
        let seeded = tiers.initial_tier_list(&config.initial_tiers()).await?;
        if seeded > 0 {
            info!(tiers = seeded, "Tier ladder seeded from configuration");
        }

        let entry_tier = tiers.resolve(Money::zero()).await;
        ensure_admin(&db, &config, &entry_tier.id).await?;

        let engine = FulfillmentEngine::new(db.clone(), InventoryLedger::new(db.clone()), tiers);

        Ok(AppState {
            suppliers: SupplierRecorder::new(db.clone()),
            jwt: Arc::new(JwtManager::new(
                config.jwt_secret.clone(),
                config.jwt_access_lifetime_secs,
            )),
            config: Arc::new(config),
            engine,
            db,
        })
    }

    pub fn ledger(&self) -> &InventoryLedger {
        self.engine.ledger()
    }

    pub fn tiers(&self) -> &TierRegistry {
        self.engine.tiers()
    }
}
