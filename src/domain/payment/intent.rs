//! Payment intents and their gateway-reported status.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::{Amount, Currency};
use crate::domain::foundation::{Timestamp, TransactionId};

/// Payment status as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    /// Maps a raw gateway status string. Unknown values are treated as pending
    /// so polling keeps going rather than declaring a false outcome.
    pub fn from_gateway(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" | "approved" | "paid" | "success" | "successful" => {
                PaymentStatus::Completed
            }
            "failed" | "cancelled" | "canceled" | "rejected" | "declined" | "expired" => {
                PaymentStatus::Failed
            }
            _ => PaymentStatus::Pending,
        }
    }

    /// Completed and failed payments will not change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attempt to pay, mirrored from the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub transaction_id: TransactionId,
    pub amount: Amount,
    pub currency: Currency,
    /// Plan description sent to the gateway and shown back to the user.
    pub context: String,
    /// Absent until the first status check or webhook.
    pub status: Option<PaymentStatus>,
    /// Hosted checkout URL the user is sent to.
    pub redirect_url: String,
    pub created_at: Timestamp,
}

impl PaymentIntent {
    pub fn new(
        transaction_id: TransactionId,
        amount: Amount,
        currency: Currency,
        context: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id,
            amount,
            currency,
            context: context.into(),
            status: None,
            redirect_url: redirect_url.into(),
            created_at: Timestamp::now(),
        }
    }

    /// Records a status observed via polling or webhook.
    pub fn observe(&mut self, status: PaymentStatus) {
        self.status = Some(status);
    }
}
