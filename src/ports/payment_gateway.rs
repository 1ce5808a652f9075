//! Payment gateway port for hosted-checkout payment providers.
//!
//! Defines the contract for the external gateway that creates payment
//! intents and reports transaction status. Implementations perform network
//! I/O only; they never touch the ledger or user profiles.

use crate::domain::foundation::TransactionId;
use crate::domain::payment::{Amount, Currency, PaymentFlowError, PaymentStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for payment gateway integrations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent with hosted checkout.
    ///
    /// Returns the gateway transaction id and the URL the user is sent to.
    async fn create_payment(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<CreatedPayment, GatewayError>;

    /// Look up the current status of a transaction.
    async fn get_transaction_status(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionStatusReport, GatewayError>;
}

/// Request to create a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub amount: Amount,

    /// Plan description shown on the checkout page.
    pub context: String,

    /// Where the gateway posts the webhook.
    pub callback_url: String,

    /// Where the browser returns after checkout.
    pub return_url: String,

    pub currency: Currency,
}

/// Gateway answer to a successful create call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedPayment {
    pub transaction_id: TransactionId,
    pub redirect_url: String,

    /// Full gateway response body, kept for diagnostics.
    pub raw: serde_json::Value,
}

/// Gateway answer to a status lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionStatusReport {
    pub transaction_id: TransactionId,
    pub status: PaymentStatus,
    pub raw: serde_json::Value,
}

/// Errors from gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayError {
    /// Error code for categorization.
    pub code: GatewayErrorCode,

    /// Human-readable message. For rejections this is the gateway's own text.
    pub message: String,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl GatewayError {
    /// Create a new gateway error.
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    /// Network failure, DNS failure or timeout.
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Connectivity, message)
    }

    /// Application-level refusal from the gateway.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Rejected, message)
    }

    /// API key refused.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Authentication, message)
    }

    /// Unknown transaction.
    pub fn not_found(transaction_id: &TransactionId) -> Self {
        Self::new(
            GatewayErrorCode::NotFound,
            format!("transaction {} not found", transaction_id),
        )
    }

    /// Response body could not be interpreted.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidResponse, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl GatewayError {
    /// Maps to the payment-flow error for a given transaction context.
    pub fn into_flow_error(self, transaction_id: Option<&TransactionId>) -> PaymentFlowError {
        match self.code {
            GatewayErrorCode::Connectivity => PaymentFlowError::GatewayUnreachable(self.message),
            GatewayErrorCode::Rejected => PaymentFlowError::PaymentRejected(self.message),
            GatewayErrorCode::Authentication => PaymentFlowError::GatewayAuthFailed(self.message),
            GatewayErrorCode::NotFound => match transaction_id {
                Some(id) => PaymentFlowError::TransactionNotFound(id.clone()),
                None => PaymentFlowError::InvalidGatewayResponse(self.message),
            },
            GatewayErrorCode::InvalidResponse => {
                PaymentFlowError::InvalidGatewayResponse(self.message)
            }
        }
    }
}

impl From<GatewayError> for PaymentFlowError {
    fn from(err: GatewayError) -> Self {
        err.into_flow_error(None)
    }
}

/// Gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    Connectivity,
    Rejected,
    Authentication,
    NotFound,
    InvalidResponse,
}

impl GatewayErrorCode {
    /// Only connectivity failures are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayErrorCode::Connectivity)
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::Connectivity => "connectivity",
            GatewayErrorCode::Rejected => "rejected",
            GatewayErrorCode::Authentication => "authentication",
            GatewayErrorCode::NotFound => "not_found",
            GatewayErrorCode::InvalidResponse => "invalid_response",
        };
        write!(f, "{}", s)
    }
}
