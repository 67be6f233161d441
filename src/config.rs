//! Configuration loader for the `weather-sensorflow` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller), so `env::var` calls stay out of the rest of the
//! codebase.
use std::{env, net::SocketAddr};

use anyhow::{anyhow, bail, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Where readings are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL through a `sqlx` connection pool.
    Postgres { db_url: String, db_pool_max: u32 },
    /// Process memory; contents are lost on exit.
    Memory,
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Reading store backend.
    pub store: StoreBackend,

    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `READING_STORE` – `postgres` (default) or `memory`
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `BIND_ADDR` – listen address (default: `0.0.0.0:8080`)
///
/// Required when `READING_STORE=postgres`:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let store = match env::var("READING_STORE").as_deref() {
        Ok("postgres") | Err(_) => StoreBackend::Postgres {
            db_url: require_env!("DATABASE_URL"),
            db_pool_max: parse_env_u32!("DB_POOL_MAX", 5),
        },
        Ok("memory") => StoreBackend::Memory,
        Ok(other) => bail!("Invalid READING_STORE: {other} (expected postgres or memory)"),
    };

    let bind_addr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse::<SocketAddr>()
        .map_err(|e| anyhow!("Invalid BIND_ADDR: {}", e))?;

    Ok(Config { store, bind_addr })
}

/// Replace the password of a connection URL with `****`.
fn mask_db_url(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
        }
    }
    db_url.to_string()
}

impl Config {
    /// Log the loaded configuration, masking the database password.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        match &self.store {
            StoreBackend::Postgres {
                db_url,
                db_pool_max,
            } => {
                tracing::info!("  READING_STORE  : postgres");
                tracing::info!("  DATABASE_URL   : {}", mask_db_url(db_url));
                tracing::info!("  DB_POOL_MAX    : {}", db_pool_max);
            }
            StoreBackend::Memory => tracing::info!("  READING_STORE  : memory"),
        }
        tracing::info!("  BIND_ADDR      : {}", self.bind_addr);
    }
}
