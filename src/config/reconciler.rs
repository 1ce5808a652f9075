//! Return reconciler and status polling configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct ReconcilerConfig {
    /// Confirm with the gateway before granting access on return
    #[serde(default)]
    pub verify_with_gateway: bool,

    /// Plan price in whole units, used when the return carries no amount
    #[serde(default = "default_plan_amount")]
    pub plan_amount: i64,

    /// Plan name stamped on the profile
    pub plan_context: Option<String>,

    #[serde(default = "default_countdown")]
    pub dashboard_countdown_secs: u64,

    #[serde(default = "default_countdown")]
    pub payment_countdown_secs: u64,

    #[serde(default = "default_home_delay")]
    pub home_redirect_delay_secs: u64,
}

impl ReconcilerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.plan_amount <= 0 {
            return Err(ValidationError::InvalidPlanAmount);
        }
        Ok(())
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            verify_with_gateway: false,
            plan_amount: default_plan_amount(),
            plan_context: None,
            dashboard_countdown_secs: default_countdown(),
            payment_countdown_secs: default_countdown(),
            home_redirect_delay_secs: default_home_delay(),
        }
    }
}

/// Status polling cadence
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: u64,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_secs == 0 || self.interval_secs >= self.timeout_secs {
            return Err(ValidationError::InvalidPolling);
        }
        Ok(())
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            timeout_secs: default_poll_timeout(),
        }
    }
}

fn default_plan_amount() -> i64 {
    499
}

fn default_countdown() -> u64 {
    5
}

fn default_home_delay() -> u64 {
    3
}

fn default_interval() -> u64 {
    5
}

fn default_poll_timeout() -> u64 {
    300
}
