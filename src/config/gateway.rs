//! Payment gateway configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;
use crate::domain::payment::Currency;

/// Which gateway implementation to run against
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewayBackend {
    #[default]
    Http,
    Mock,
}

/// Hosted-checkout gateway settings
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub backend: GatewayBackend,

    /// Gateway name, used in the webhook route and signature header
    #[serde(default = "default_name")]
    pub name: String,

    /// REST API base URL
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Shared secret for webhook signatures
    pub webhook_secret: Option<String>,

    /// Deployment currency
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Value sent in the gateway's `enviroment` field
    #[serde(default = "default_gateway_environment")]
    pub environment: String,

    /// Public URL of the webhook endpoint
    #[serde(default)]
    pub callback_url: String,

    /// Public URL of the checkout return page
    #[serde(default)]
    pub return_url: String,

    /// Recorded on the profile when access is granted
    #[serde(default = "default_payment_method")]
    pub payment_method: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The deployment currency. Call after [`validate`](Self::validate).
    pub fn currency(&self) -> Result<Currency, ValidationError> {
        Currency::new(&self.currency)
            .map_err(|_| ValidationError::InvalidCurrency(self.currency.clone()))
    }

    /// The configured webhook secret, ignoring blank values.
    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        self.currency()?;

        if *environment == Environment::Production && self.webhook_secret().is_none() {
            return Err(ValidationError::WebhookSecretRequired);
        }

        if self.backend == GatewayBackend::Mock {
            return Ok(());
        }

        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__BASE_URL"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidGatewayUrl);
        }
        if *environment == Environment::Production && !self.base_url.starts_with("https://") {
            return Err(ValidationError::GatewayMustBeHttps);
        }
        if self.api_key.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__API_KEY"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend: GatewayBackend::default(),
            name: default_name(),
            base_url: String::new(),
            api_key: String::new(),
            webhook_secret: None,
            currency: default_currency(),
            environment: default_gateway_environment(),
            callback_url: String::new(),
            return_url: String::new(),
            payment_method: default_payment_method(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_name() -> String {
    "paysuite".to_string()
}

fn default_currency() -> String {
    "MZN".to_string()
}

fn default_gateway_environment() -> String {
    "sandbox".to_string()
}

fn default_payment_method() -> String {
    "mobile_money".to_string()
}

fn default_timeout() -> u64 {
    15
}
