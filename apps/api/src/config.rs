//! API configuration module.
//!
//! Layered with the `config` crate, later sources winning:
//!
//! ```text
//!   ApiConfig::default()
//!        ▼
//!   stockroom.toml            (optional; path from STOCKROOM_CONFIG)
//!        ▼
//!   STOCKROOM_* environment   (STOCKROOM_PORT=9000, STOCKROOM_JWT_SECRET=...)
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stockroom_core::validation::{validate_email, validate_password};
use stockroom_core::{default_ladder, TierCatalog};
use stockroom_db::DbConfig;
use stockroom_engine::SweeperConfig;

/// Default config file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "stockroom.toml";

/// One tier of the ladder seeded into an empty catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierSeed {
    pub name: String,
    pub min_spend_cents: i64,
    pub discount_percent: u32,
}

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Interface to bind.
    pub host: String,

    /// HTTP port.
    pub port: u16,

    /// SQLite file. `:memory:` for a throwaway database.
    pub database_path: String,

    pub max_connections: u32,

    /// Secret for signing access tokens.
    pub jwt_secret: String,

    /// Access token lifetime in seconds.
    pub jwt_access_lifetime_secs: i64,

    /// Age after which an uncommitted reservation is released.
    pub reservation_ttl_secs: u64,

    /// Seconds between reservation sweeps.
    pub sweep_interval_secs: u64,

    /// Admin account created at startup when none exists.
    pub admin_name: String,
    pub admin_email: String,
    pub admin_password: String,

    /// Ladder seeded when the tier table is empty.
    pub tiers: Vec<TierSeed>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_path: "./stockroom.db".to_string(),
            max_connections: 8,
            jwt_secret: "stockroom-dev-secret-change-in-production".to_string(),
            jwt_access_lifetime_secs: 3600,
            reservation_ttl_secs: 15 * 60,
            sweep_interval_secs: 60,
            admin_name: "Administrator".to_string(),
            admin_email: "admin@stockroom.local".to_string(),
            admin_password: "change-me-now".to_string(),
            tiers: default_ladder()
                .into_iter()
                .map(|t| TierSeed {
                    name: t.name,
                    min_spend_cents: t.min_spend_cents,
                    discount_percent: t.discount_percent,
                })
                .collect(),
        }
    }
}

impl ApiConfig {
    /// Loads from the file named by `STOCKROOM_CONFIG` (default
    /// [`DEFAULT_CONFIG_FILE`]) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("STOCKROOM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config: ApiConfig = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("STOCKROOM")
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::invalid("port", "must be non-zero"));
        }
        if self.jwt_secret.trim().len() < 16 {
            return Err(ConfigError::invalid("jwt_secret", "must be at least 16 characters"));
        }
        if self.jwt_access_lifetime_secs <= 0 {
            return Err(ConfigError::invalid("jwt_access_lifetime_secs", "must be positive"));
        }
        if self.reservation_ttl_secs == 0 {
            return Err(ConfigError::invalid("reservation_ttl_secs", "must be positive"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::invalid("sweep_interval_secs", "must be positive"));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::invalid("max_connections", "must be positive"));
        }
        validate_email(&self.admin_email)
            .map_err(|e| ConfigError::invalid("admin_email", e.to_string()))?;
        validate_password(&self.admin_password)
            .map_err(|e| ConfigError::invalid("admin_password", e.to_string()))?;

        TierCatalog::from_tiers(self.initial_tiers())
            .map_err(|e| ConfigError::invalid("tiers", e.to_string()))?;

        Ok(())
    }

    /// Address the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn db_config(&self) -> DbConfig {
        if self.database_path == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&self.database_path).max_connections(self.max_connections)
        }
    }

    pub fn sweeper_config(&self) -> SweeperConfig {
        SweeperConfig {
            ttl: Duration::from_secs(self.reservation_ttl_secs),
            interval: Duration::from_secs(self.sweep_interval_secs),
        }
    }

    /// The configured ladder as tiers with fresh ids.
    pub fn initial_tiers(&self) -> Vec<stockroom_core::Tier> {
        self.tiers
            .iter()
            .map(|seed| stockroom_core::Tier {
                id: stockroom_db::new_id(),
                name: seed.name.clone(),
                min_spend_cents: seed.min_spend_cents,
                discount_percent: seed.discount_percent,
            })
            .collect()
    }

    /// In-memory settings for tests.
    pub fn for_tests() -> Self {
        ApiConfig {
            database_path: ":memory:".to_string(),
            jwt_secret: "test-secret-test-secret".to_string(),
            admin_email: "admin@stockroom.test".to_string(),
            admin_password: "admin-password".to_string(),
            ..ApiConfig::default()
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ApiConfig::default();
        config.validate().unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.tiers.len(), 4);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ApiConfig::load_from(Path::new("/nonexistent/stockroom.toml")).unwrap();
        assert_eq!(config.reservation_ttl_secs, 900);
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = ApiConfig {
            jwt_secret: "short".into(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "jwt_secret"
        ));

        let config = ApiConfig {
            tiers: vec![
                TierSeed {
                    name: "A".into(),
                    min_spend_cents: 0,
                    discount_percent: 0,
                },
                TierSeed {
                    name: "B".into(),
                    min_spend_cents: 0,
                    discount_percent: 5,
                },
            ],
            ..ApiConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "tiers"
        ));
    }

    #[test]
    fn test_memory_database_selects_in_memory_pool() {
        assert!(ApiConfig::for_tests().db_config().is_in_memory());
    }
}
