//! Profile store configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Where user entitlements are kept
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileStoreConfig {
    #[serde(default)]
    pub backend: ProfileStoreBackend,

    /// PostgreSQL connection URL
    pub database_url: Option<String>,

    /// Minimum connections to maintain
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Maximum connections allowed
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Run migrations on startup
    #[serde(default)]
    pub run_migrations: bool,
}

impl ProfileStoreConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == ProfileStoreBackend::Memory {
            return Ok(());
        }

        let url = self
            .database_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(ValidationError::MissingRequired("PROFILE_STORE__DATABASE_URL"))?;
        if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.min_connections > self.max_connections {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.max_connections > 100 {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        Ok(())
    }
}

impl Default for ProfileStoreConfig {
    fn default() -> Self {
        Self {
            backend: ProfileStoreBackend::default(),
            database_url: None,
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            run_migrations: false,
        }
    }
}

fn default_min_connections() -> u32 {
    1
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    5
}
