//! Vending machine configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use vending_core::AcceptedDenominations;

/// Vending machine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendingConfig {
    /// SQLite database file
    pub database_path: String,

    /// Maximum pooled connections
    pub max_connections: u32,

    /// Coins a buyer may deposit, in cents
    pub accepted_denominations: AcceptedDenominations,

    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for VendingConfig {
    fn default() -> Self {
        VendingConfig {
            database_path: "vending.db".to_string(),
            max_connections: 5,
            accepted_denominations: AcceptedDenominations::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl VendingConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = VendingConfig::default();

        let max_connections = match lookup("VENDING_DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue("VENDING_DB_MAX_CONNECTIONS".to_string()))?,
            None => defaults.max_connections,
        };

        let accepted_denominations = match lookup("VENDING_ACCEPTED_DENOMINATIONS") {
            Some(raw) => parse_denominations(&raw)?,
            None => defaults.accepted_denominations,
        };

        Ok(VendingConfig {
            database_path: lookup("VENDING_DATABASE_PATH").unwrap_or(defaults.database_path),
            max_connections,
            accepted_denominations,
            log_filter: lookup("VENDING_LOG_FILTER").unwrap_or(defaults.log_filter),
        })
    }
}

fn parse_denominations(raw: &str) -> Result<AcceptedDenominations, ConfigError> {
    let invalid = || ConfigError::InvalidValue("VENDING_ACCEPTED_DENOMINATIONS".to_string());

    let values = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;

    AcceptedDenominations::new(values).map_err(|_| invalid())
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
