//! PaymentStatusPoller - watches a transaction until it settles.
//!
//! Checks the gateway every `interval` until the status is terminal or
//! `timeout` elapses. Dropping the returned future cancels the watch; the
//! HTTP long-poll relies on this when the client disconnects.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use crate::domain::foundation::TransactionId;
use crate::domain::payment::{PaymentFlowError, PaymentStatus};
use crate::ports::{PaymentGateway, TransactionStatusReport};

/// Default check interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default give-up time.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(300);

/// Polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

/// How a watch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The gateway reported `completed` or `failed`.
    Terminal(TransactionStatusReport),
    /// Gave up without a terminal status.
    TimedOut {
        last_status: Option<PaymentStatus>,
        attempts: u32,
    },
}

pub struct PaymentStatusPoller {
    gateway: Arc<dyn PaymentGateway>,
    settings: PollingSettings,
}

impl PaymentStatusPoller {
    pub fn new(gateway: Arc<dyn PaymentGateway>, settings: PollingSettings) -> Self {
        Self { gateway, settings }
    }

    pub fn settings(&self) -> PollingSettings {
        self.settings
    }

    /// Polls until a terminal status or the timeout.
    ///
    /// Connectivity errors are logged and polling continues. Any other
    /// gateway error ends the watch.
    pub async fn watch(&self, transaction_id: &TransactionId) -> Result<PollOutcome, PaymentFlowError> {
        let deadline = Instant::now() + self.settings.timeout;
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut attempts = 0u32;
        let mut last_status = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tokio::time::sleep_until(deadline) => break,
            }

            attempts += 1;
            match self.gateway.get_transaction_status(transaction_id).await {
                Ok(report) if report.status.is_terminal() => {
                    tracing::info!(
                        transaction_id = %transaction_id,
                        status = %report.status,
                        attempts,
                        "Payment reached terminal status"
                    );
                    return Ok(PollOutcome::Terminal(report));
                }
                Ok(report) => {
                    last_status = Some(report.status);
                }
                Err(e) if e.retryable => {
                    tracing::warn!(
                        transaction_id = %transaction_id,
                        attempt = attempts,
                        error = %e,
                        "Status check failed, will retry"
                    );
                }
                Err(e) => return Err(e.into_flow_error(Some(transaction_id))),
            }

            if Instant::now() >= deadline {
                break;
            }
        }

        tracing::info!(transaction_id = %transaction_id, attempts, "Stopped polling payment status");
        Ok(PollOutcome::TimedOut {
            last_status,
            attempts,
        })
    }
}
