// src/config.rs

use std::env;
use std::net::SocketAddr;
use thiserror::Error;

use crate::analysis::DEFAULT_RESULT_LIMIT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub schema_path: String,
    pub bind_addr: SocketAddr,
    pub max_workers: usize,
    pub seller_update_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: "cma.sqlite3".into(),
            schema_path: "sql/schema.sql".into(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_workers: 8,
            seller_update_limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

fn parsed<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                var,
                value,
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}

impl AppConfig {
    /// Environment variables:
    /// - `CMA_DB_PATH`
    /// - `CMA_SCHEMA_PATH`
    /// - `CMA_BIND_ADDR`
    /// - `CMA_MAX_WORKERS`
    /// - `CMA_SELLER_UPDATE_LIMIT`
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let max_workers = parsed("CMA_MAX_WORKERS", defaults.max_workers)?;
        if max_workers == 0 {
            return Err(ConfigError::Invalid {
                var: "CMA_MAX_WORKERS",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            db_path: parsed("CMA_DB_PATH", defaults.db_path)?,
            schema_path: parsed("CMA_SCHEMA_PATH", defaults.schema_path)?,
            bind_addr: parsed("CMA_BIND_ADDR", defaults.bind_addr)?,
            max_workers,
            seller_update_limit: parsed("CMA_SELLER_UPDATE_LIMIT", defaults.seller_update_limit)?,
        })
    }
}
