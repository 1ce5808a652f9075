//! HTTP DTOs for the payment endpoints.
//!
//! JSON field names are camelCase, matching what the web client and the
//! gateway's redirect parameters already use.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{
    CreatePaymentResult, HandlePaymentWebhookResult, PollOutcome, ReconcileOutcome,
    ReconcileReturnResult, RedirectTarget, ReturnParams, WebhookOutcome,
};
use crate::domain::payment::{PaymentStatus, UserEntitlement};
use crate::ports::TransactionStatusReport;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start a hosted checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    /// Whole currency units.
    pub amount: i64,
    /// Plan name shown on the gateway page.
    pub context: String,
}

/// Query parameters the gateway may append on the return redirect.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnQuery {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl From<ReturnQuery> for ReturnParams {
    fn from(q: ReturnQuery) -> Self {
        ReturnParams {
            transaction_id: q.transaction_id,
            amount: q.amount,
            status: q.status,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response for a created payment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreatedResponse {
    pub transaction_id: String,
    pub redirect_url: String,
    pub amount: i64,
    pub currency: String,
    pub context: String,
    pub display_amount: String,
}

impl From<CreatePaymentResult> for PaymentCreatedResponse {
    fn from(result: CreatePaymentResult) -> Self {
        let intent = result.intent;
        Self {
            transaction_id: intent.transaction_id.to_string(),
            redirect_url: intent.redirect_url,
            amount: intent.amount.value(),
            currency: intent.currency.as_str().to_string(),
            context: intent.context,
            display_amount: result.display_amount,
        }
    }
}

/// One status check against the gateway.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub is_terminal: bool,
}

impl From<TransactionStatusReport> for PaymentStatusResponse {
    fn from(report: TransactionStatusReport) -> Self {
        Self {
            transaction_id: report.transaction_id.to_string(),
            status: report.status,
            is_terminal: report.status.is_terminal(),
        }
    }
}

/// Result of watching a payment until it settles or the watch times out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWatchResponse {
    pub transaction_id: String,
    /// Last known status, absent if no check succeeded.
    pub status: Option<PaymentStatus>,
    pub timed_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

impl PaymentWatchResponse {
    pub fn from_outcome(transaction_id: String, outcome: PollOutcome) -> Self {
        match outcome {
            PollOutcome::Terminal(report) => Self {
                transaction_id,
                status: Some(report.status),
                timed_out: false,
                attempts: None,
            },
            PollOutcome::TimedOut {
                last_status,
                attempts,
            } => Self {
                transaction_id,
                status: last_status,
                timed_out: true,
                attempts: Some(attempts),
            },
        }
    }
}

/// Outcome of the redirect-return reconciliation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnReconciliationResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
    pub is_paid: bool,
    pub redirect: RedirectTarget,
    pub redirect_path: &'static str,
    pub redirect_after_secs: u64,
}

impl From<ReconcileReturnResult> for ReturnReconciliationResponse {
    fn from(result: ReconcileReturnResult) -> Self {
        let (outcome, transaction_id, status) = match result.outcome {
            ReconcileOutcome::AlreadyPaid => ("already_paid", None, None),
            ReconcileOutcome::ExplicitReturn {
                transaction_id,
                status,
            } => ("explicit_return", transaction_id, status),
            ReconcileOutcome::NotReturningFromPayment => ("not_returning_from_payment", None, None),
            ReconcileOutcome::Granted { transaction_id } => {
                ("granted", Some(transaction_id.to_string()), None)
            }
            ReconcileOutcome::AlreadyGranted { transaction_id } => {
                ("already_granted", Some(transaction_id.to_string()), None)
            }
            ReconcileOutcome::PaymentFailed { transaction_id } => (
                "payment_failed",
                Some(transaction_id.to_string()),
                Some(PaymentStatus::Failed),
            ),
            ReconcileOutcome::AwaitingConfirmation { transaction_id } => (
                "awaiting_confirmation",
                Some(transaction_id.to_string()),
                Some(PaymentStatus::Pending),
            ),
        };

        Self {
            outcome,
            transaction_id,
            status,
            is_paid: result.is_paid,
            redirect: result.redirect,
            redirect_path: result.redirect.path(),
            redirect_after_secs: result.redirect_after_secs,
        }
    }
}

/// The caller's entitlement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementResponse {
    pub user_id: String,
    pub is_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl From<UserEntitlement> for EntitlementResponse {
    fn from(e: UserEntitlement) -> Self {
        Self {
            user_id: e.user_id.to_string(),
            is_paid: e.is_paid,
            payment_date: e.payment_date.map(|d| d.as_datetime().to_rfc3339()),
            payment_method: e.payment_method,
            payment_amount: e.payment_amount.map(|a| a.value()),
            transaction_id: e.transaction_id.map(|t| t.to_string()),
            currency: e.currency.map(|c| c.as_str().to_string()),
            context: e.context,
        }
    }
}

/// Acknowledgement returned to the gateway.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAckResponse {
    pub success: bool,
    pub message: String,
    pub transaction_id: String,
}

impl From<HandlePaymentWebhookResult> for WebhookAckResponse {
    fn from(result: HandlePaymentWebhookResult) -> Self {
        let message = match &result.outcome {
            WebhookOutcome::EntitlementGranted { .. } => "Payment processed",
            WebhookOutcome::AlreadyEntitled { .. } => "Payment already processed",
            WebhookOutcome::LedgerMiss => "Payment processed, user not found",
            WebhookOutcome::NotApproved { .. } => "Payment not approved",
            WebhookOutcome::EntitlementDeferred { .. } => "Payment received, update pending",
        };
        Self {
            success: true,
            message: message.to_string(),
            transaction_id: result.transaction_id.to_string(),
        }
    }
}

/// Liveness probe body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Error body shared by every endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
