//! CLI configuration management.
//!
//! Consolidates all environment variable reads and command-line overrides.

use cup_engine::db::DatabaseConfig;
use cup_engine::tournament::{ConfigError, EngineConfig};

/// Complete CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Engine tunables
    pub engine: EngineConfig,
}

impl AdminConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `database_url_override` - Optional database URL (from `--db-url`)
    /// * `slot_minutes_override` - Optional slot spacing (from `--slot-minutes`)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        database_url_override: Option<String>,
        slot_minutes_override: Option<i64>,
    ) -> Result<Self, ConfigError> {
        let database = match database_url_override {
            Some(database_url) => {
                let from_env = DatabaseConfig::from_env().unwrap_or_default();
                DatabaseConfig {
                    database_url,
                    ..from_env
                }
            }
            None => DatabaseConfig::from_env()?,
        };

        let mut engine = EngineConfig::from_env()?;
        if let Some(minutes) = slot_minutes_override {
            engine.slot_interval_minutes = minutes;
        }

        let config = Self { database, engine };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        self.engine.validate()
    }
}
