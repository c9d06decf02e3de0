//! Engine configuration management.
//!
//! Consolidates the environment variables the engine reads and validates them.

use super::models::PointsTable;
use crate::db::RetryPolicy;
use std::time::Duration;

/// Tunables of the tournament engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Points per finish
    pub points: PointsTable,
    /// Minutes between consecutive match slots
    pub slot_interval_minutes: i64,
    /// Retry policy for units of work
    pub retry: RetryPolicy,
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - `POINTS_WIN` (default: 3), `POINTS_DRAW` (default: 1), `POINTS_LOSS` (default: 0)
    /// - `SLOT_INTERVAL_MINUTES`: spacing of match slots (default: 60)
    /// - `RETRY_MAX_ATTEMPTS` (default: 4)
    /// - `RETRY_BASE_DELAY_MS` (default: 25), `RETRY_MAX_DELAY_MS` (default: 400)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the values do not pass [`EngineConfig::validate`]
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            points: PointsTable {
                win: parse_env_or("POINTS_WIN", defaults.points.win),
                draw: parse_env_or("POINTS_DRAW", defaults.points.draw),
                loss: parse_env_or("POINTS_LOSS", defaults.points.loss),
            },
            slot_interval_minutes: parse_env_or(
                "SLOT_INTERVAL_MINUTES",
                defaults.slot_interval_minutes,
            ),
            retry: RetryPolicy {
                max_attempts: parse_env_or("RETRY_MAX_ATTEMPTS", defaults.retry.max_attempts),
                base_delay: Duration::from_millis(parse_env_or(
                    "RETRY_BASE_DELAY_MS",
                    defaults.retry.base_delay.as_millis() as u64,
                )),
                max_delay: Duration::from_millis(parse_env_or(
                    "RETRY_MAX_DELAY_MS",
                    defaults.retry.max_delay.as_millis() as u64,
                )),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.points.win <= self.points.draw {
            return Err(ConfigError::Invalid {
                var: "POINTS_WIN".to_string(),
                reason: format!("Must be greater than draw points ({})", self.points.draw),
            });
        }

        if self.points.draw < self.points.loss {
            return Err(ConfigError::Invalid {
                var: "POINTS_DRAW".to_string(),
                reason: format!("Must be at least loss points ({})", self.points.loss),
            });
        }

        if self.slot_interval_minutes <= 0 {
            return Err(ConfigError::Invalid {
                var: "SLOT_INTERVAL_MINUTES".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "RETRY_MAX_ATTEMPTS".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if self.retry.max_delay < self.retry.base_delay {
            return Err(ConfigError::Invalid {
                var: "RETRY_MAX_DELAY_MS".to_string(),
                reason: format!(
                    "Must be at least the base delay ({}ms)",
                    self.retry.base_delay.as_millis()
                ),
            });
        }

        Ok(())
    }

    /// Spacing between consecutive slots
    pub fn slot_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.slot_interval_minutes)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            points: PointsTable::default(),
            slot_interval_minutes: 60,
            retry: RetryPolicy::default(),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
pub fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.slot_interval(), chrono::Duration::hours(1));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "DATABASE_URL".to_string(),
            hint: "postgres://...".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("DATABASE_URL"));
        assert!(msg.contains("postgres://"));
    }

    #[test]
    fn test_win_must_beat_draw() {
        let config = EngineConfig {
            points: PointsTable {
                win: 1,
                draw: 1,
                loss: 0,
            },
            ..EngineConfig::default()
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "POINTS_WIN"));
    }

    #[test]
    fn test_slot_interval_must_be_positive() {
        let config = EngineConfig {
            slot_interval_minutes: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_bounds() {
        let mut config = EngineConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.retry.max_delay = Duration::from_millis(1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_env_or_falls_back() {
        assert_eq!(parse_env_or("CUP_ENGINE_TEST_UNSET_VARIABLE", 42u32), 42);
    }
}
