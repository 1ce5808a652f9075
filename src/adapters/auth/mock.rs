//! Mock session validator for tests and local development.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Maps fixed tokens to users. Unknown tokens return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    force_error: RwLock<Option<AuthError>>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as `user`.
    pub fn with_user(self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.tokens
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(token.into(), user);
        self
    }

    /// Accept `token` as a user with the given id and a derived email.
    ///
    /// Panics if `user_id` is empty.
    pub fn with_test_user(self, token: impl Into<String>, user_id: &str) -> Self {
        let user = AuthenticatedUser::new(
            UserId::new(user_id).unwrap_or_else(|e| panic!("invalid test user id: {}", e)),
            format!("{}@test.example.com", user_id),
            None,
        );
        self.with_user(token, user)
    }

    /// Forces every validation to fail with `error`.
    pub fn with_error(self, error: AuthError) -> Self {
        *self.force_error.write().unwrap_or_else(|p| p.into_inner()) = Some(error);
        self
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = self
            .force_error
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
        {
            return Err(error);
        }

        self.tokens
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_token_returns_user() {
        let validator = MockSessionValidator::new().with_test_user("token-1", "user_1");
        let user = validator.validate("token-1").await.unwrap();
        assert_eq!(user.id.as_str(), "user_1");
        assert_eq!(user.email, "user_1@test.example.com");
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let validator = MockSessionValidator::new();
        assert_eq!(validator.validate("nope").await.unwrap_err(), AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn forced_error_wins() {
        let validator = MockSessionValidator::new()
            .with_test_user("token-1", "user_1")
            .with_error(AuthError::service_unavailable("down"));
        assert!(validator.validate("token-1").await.unwrap_err().is_transient());
    }
}
