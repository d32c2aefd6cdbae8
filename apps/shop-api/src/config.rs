//! Shop API configuration module.
//!
//! Configuration is layered with the `config` crate, later sources winning:
//!
//! ```text
//! built-in defaults ──► shop.toml (optional) ──► SHOP_* environment
//! ```
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `SHOP_CHECKOUT__MAX_ATTEMPTS=5`. `SHOP_CORS_ORIGINS` takes a
//! comma-separated list.
//!
//! The config is loaded once in `main` and handed to constructors; nothing
//! reads it lazily.

use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use shop_db::DbConfig;

/// Development signing secret. `main` warns when it is still in use.
pub const DEV_JWT_SECRET: &str = "mini-shop-dev-secret-change-in-production";

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";
const DEFAULT_DATABASE_PATH: &str = "shop.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_JWT_LIFETIME_SECS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 25;
const DEFAULT_MAX_BACKOFF_MS: u64 = 500;

/// Shop API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Socket address the HTTP server binds to
    pub bind_address: String,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// How long a connection waits on a locked database before SQLITE_BUSY
    pub busy_timeout_ms: u64,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,

    /// Order engine retry policy
    pub checkout: CheckoutConfig,
}

/// Retry policy for order creation under lock contention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// First backoff interval in milliseconds
    pub initial_backoff_ms: u64,

    /// Backoff ceiling in milliseconds
    pub max_backoff_ms: u64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

impl CheckoutConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_lifetime_secs: DEFAULT_JWT_LIFETIME_SECS,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            checkout: CheckoutConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from defaults, `shop.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Self::defaults(Config::builder())?
            .add_source(File::with_name("shop").required(false))
            .add_source(
                Environment::with_prefix("SHOP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors_origins")
                    .try_parsing(true),
            );

        let config: ApiConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let builder = builder
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("database_path", DEFAULT_DATABASE_PATH)?
            .set_default("max_connections", DEFAULT_MAX_CONNECTIONS)?
            .set_default("busy_timeout_ms", DEFAULT_BUSY_TIMEOUT_MS)?
            .set_default("jwt_secret", DEV_JWT_SECRET)?
            .set_default("jwt_lifetime_secs", DEFAULT_JWT_LIFETIME_SECS)?
            .set_default("cors_origins", DEFAULT_CORS_ORIGINS.to_vec())?
            .set_default("checkout.max_attempts", DEFAULT_MAX_ATTEMPTS)?
            .set_default("checkout.initial_backoff_ms", DEFAULT_INITIAL_BACKOFF_MS)?
            .set_default("checkout.max_backoff_ms", DEFAULT_MAX_BACKOFF_MS)?;

        Ok(builder)
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }

        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_lifetime_secs".to_string()));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }

        if self.checkout.max_attempts == 0 {
            return Err(ConfigError::InvalidValue("checkout.max_attempts".to_string()));
        }

        if self.checkout.initial_backoff_ms > self.checkout.max_backoff_ms {
            return Err(ConfigError::InvalidValue("checkout.initial_backoff_ms".to_string()));
        }

        Ok(())
    }

    /// Database settings derived from this config.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
