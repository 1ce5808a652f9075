//! Webhook error types for gateway webhook handling.
//!
//! Every variant maps to the HTTP status returned to the gateway. Only
//! structural problems (bad signature, malformed payload) produce non-2xx
//! codes, which keeps the gateway from retrying conditions we cannot fix.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that reject a webhook delivery outright.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Signature present but does not match the shared secret.
    #[error("Invalid signature")]
    InvalidSignature,

    /// No signature header, and unsigned webhooks are not accepted here.
    #[error("Missing signature")]
    MissingSignature,

    /// Body is not valid JSON or has the wrong shape.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Required field missing from webhook payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Unexpected failure while handling an accepted payload.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebhookError {
    /// Maps the error to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature | WebhookError::MissingSignature => {
                StatusCode::UNAUTHORIZED
            }
            WebhookError::InvalidPayload(_) | WebhookError::MissingField(_) => {
                StatusCode::BAD_REQUEST
            }
            WebhookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            WebhookError::InvalidSignature => "INVALID_WEBHOOK_SIGNATURE",
            WebhookError::MissingSignature => "MISSING_WEBHOOK_SIGNATURE",
            WebhookError::InvalidPayload(_) | WebhookError::MissingField(_) => {
                "INVALID_WEBHOOK_PAYLOAD"
            }
            WebhookError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Signature problems are security events and are logged as such.
    pub fn is_security_event(&self) -> bool {
        matches!(
            self,
            WebhookError::InvalidSignature | WebhookError::MissingSignature
        )
    }
}
