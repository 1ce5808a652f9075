//! Payment-flow error types.
//!
//! Errors raised while creating payments, checking their status and
//! reconciling returns from hosted checkout.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | ValidationFailed | 400 |
//! | TransactionNotFound | 404 |
//! | PaymentRejected | 422 |
//! | GatewayUnreachable | 503 |
//! | GatewayAuthFailed | 502 |
//! | InvalidGatewayResponse | 502 |
//! | Ledger | 500 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, TransactionId, ValidationError};

/// Payment-flow errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentFlowError {
    /// Request input was invalid.
    ValidationFailed { field: String, message: String },

    /// The gateway could not be reached (network, DNS, timeout).
    GatewayUnreachable(String),

    /// The gateway refused the request; message is the gateway's own.
    PaymentRejected(String),

    /// The gateway does not know this transaction.
    TransactionNotFound(TransactionId),

    /// Our API key was refused by the gateway.
    GatewayAuthFailed(String),

    /// The gateway answered with something we could not interpret.
    InvalidGatewayResponse(String),

    /// Transaction-user ledger failure.
    Ledger(String),

    /// Profile store or other infrastructure failure.
    Infrastructure(String),
}

impl PaymentFlowError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentFlowError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn gateway_unreachable(message: impl Into<String>) -> Self {
        PaymentFlowError::GatewayUnreachable(message.into())
    }

    pub fn payment_rejected(message: impl Into<String>) -> Self {
        PaymentFlowError::PaymentRejected(message.into())
    }

    pub fn transaction_not_found(id: TransactionId) -> Self {
        PaymentFlowError::TransactionNotFound(id)
    }

    pub fn ledger(message: impl Into<String>) -> Self {
        PaymentFlowError::Ledger(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        PaymentFlowError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PaymentFlowError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            PaymentFlowError::GatewayUnreachable(_) => ErrorCode::GatewayUnreachable,
            PaymentFlowError::PaymentRejected(_) => ErrorCode::PaymentRejected,
            PaymentFlowError::TransactionNotFound(_) => ErrorCode::TransactionNotFound,
            PaymentFlowError::GatewayAuthFailed(_) => ErrorCode::GatewayAuthFailed,
            PaymentFlowError::InvalidGatewayResponse(_) => ErrorCode::InvalidGatewayResponse,
            PaymentFlowError::Ledger(_) => ErrorCode::StorageError,
            PaymentFlowError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            PaymentFlowError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            PaymentFlowError::GatewayUnreachable(_) => {
                "Could not reach the payment gateway, check your connection and try again".to_string()
            }
            PaymentFlowError::PaymentRejected(reason) => reason.clone(),
            PaymentFlowError::TransactionNotFound(id) => {
                format!("Transaction not found: {}", id)
            }
            PaymentFlowError::GatewayAuthFailed(_) => {
                "Payment gateway rejected our credentials".to_string()
            }
            PaymentFlowError::InvalidGatewayResponse(detail) => {
                format!("Unexpected response from payment gateway: {}", detail)
            }
            PaymentFlowError::Ledger(msg) => format!("Transaction ledger error: {}", msg),
            PaymentFlowError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Only connectivity problems are worth retrying automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentFlowError::GatewayUnreachable(_))
    }
}

impl std::fmt::Display for PaymentFlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PaymentFlowError {}

impl From<ValidationError> for PaymentFlowError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::EmptyField { field }
            | ValidationError::NotPositive { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field.clone(),
        };
        PaymentFlowError::ValidationFailed {
            field,
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for PaymentFlowError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => PaymentFlowError::ValidationFailed {
                field: "unknown".to_string(),
                message: err.message,
            },
            _ => PaymentFlowError::Infrastructure(err.message),
        }
    }
}

impl From<PaymentFlowError> for DomainError {
    fn from(err: PaymentFlowError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
