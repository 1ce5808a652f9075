//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, authentication and error types
//! that form the vocabulary of the payment flow.

mod auth;
mod errors;
mod ids;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AuditRecordId, TransactionId, UserId};
pub use timestamp::Timestamp;
