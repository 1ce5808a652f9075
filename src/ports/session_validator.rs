//! Session validation port for bearer token validation.
//!
//! The identity provider issues the access tokens; this port turns a raw
//! token into the authenticated user that owns payments and entitlements.
//!
//! All implementations MUST validate:
//! - **Issuer (iss)**: Token must come from the expected identity provider
//! - **Audience (aud)**: Token must be intended for this application
//! - **Expiry (exp)**: Token must not be expired

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates access tokens and extracts user identity.
///
/// # Contract
///
/// - Return `AuthError::InvalidToken` for malformed/bad signature tokens
/// - Return `AuthError::TokenExpired` for expired tokens
/// - Return `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate an access token (without the "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
