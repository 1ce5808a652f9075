//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid socket address: {0}")]
    InvalidSocketAddr(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid gateway URL format")]
    InvalidGatewayUrl,

    #[error("Gateway URL must use HTTPS in production")]
    GatewayMustBeHttps,

    #[error("Webhook secret is required in production")]
    WebhookSecretRequired,

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Ledger retention must be positive")]
    InvalidRetention,

    #[error("Plan amount must be positive")]
    InvalidPlanAmount,

    #[error("Polling interval must be positive and shorter than the timeout")]
    InvalidPolling,

    #[error("Auth issuer must use HTTPS in production")]
    IssuerMustBeHttps,

    #[error("Request timeout must be longer than the polling timeout")]
    RequestTimeoutBelowPolling,
}
