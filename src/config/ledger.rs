//! Transaction ledger configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::domain::payment::{retention_from_secs, DEFAULT_LEDGER_RETENTION_SECS};

/// Ledger storage backend
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    Memory,
    #[default]
    File,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub backend: LedgerBackend,

    /// Snapshot file for the `file` backend
    #[serde(default = "default_file_path")]
    pub file_path: PathBuf,

    /// Connection URL for the `redis` backend
    pub redis_url: Option<String>,

    /// Entries older than this are expired
    #[serde(default = "default_retention")]
    pub retention_secs: i64,
}

impl LedgerConfig {
    pub fn retention(&self) -> chrono::Duration {
        retention_from_secs(self.retention_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.retention_secs <= 0 {
            return Err(ValidationError::InvalidRetention);
        }
        if self.backend == LedgerBackend::Redis {
            let url = self
                .redis_url
                .as_deref()
                .ok_or(ValidationError::MissingRequired("LEDGER__REDIS_URL"))?;
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                return Err(ValidationError::InvalidRedisUrl);
            }
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::default(),
            file_path: default_file_path(),
            redis_url: None,
            retention_secs: default_retention(),
        }
    }
}

fn default_file_path() -> PathBuf {
    PathBuf::from("data/ledger.json")
}

fn default_retention() -> i64 {
    DEFAULT_LEDGER_RETENTION_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.backend, LedgerBackend::File);
        assert_eq!(config.retention(), chrono::Duration::hours(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let config = LedgerConfig {
            backend: LedgerBackend::Redis,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("LEDGER__REDIS_URL"))
        );

        let config = LedgerConfig {
            backend: LedgerBackend::Redis,
            redis_url: Some("http://localhost".to_string()),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidRedisUrl));
    }

    #[test]
    fn test_retention_must_be_positive() {
        let config = LedgerConfig {
            retention_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidRetention));
    }
}
