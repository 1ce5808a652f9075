//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `AMSYNC` prefix and `__`
//! between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use amsync_payments::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod error;
mod gateway;
mod ledger;
mod profile_store;
mod reconciler;
mod server;

pub use auth::AuthConfig;
pub use error::{ConfigError, ValidationError};
pub use gateway::{GatewayBackend, GatewayConfig};
pub use ledger::{LedgerBackend, LedgerConfig};
pub use profile_store::{ProfileStoreBackend, ProfileStoreConfig};
pub use reconciler::{PollingConfig, ReconcilerConfig};
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub profile_store: ProfileStoreConfig,

    pub auth: AuthConfig,

    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    #[serde(default)]
    pub polling: PollingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `AMSYNC` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `AMSYNC__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `AMSYNC__GATEWAY__API_KEY=...` -> `gateway.api_key = ...`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("AMSYNC")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.gateway.validate(&self.server.environment)?;
        self.ledger.validate()?;
        self.profile_store.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.reconciler.validate()?;
        self.polling.validate()?;
        if self.server.request_timeout() <= self.polling.timeout() {
            return Err(ValidationError::RequestTimeoutBelowPolling);
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
