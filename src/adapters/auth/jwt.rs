//! Shared-secret JWT adapter for session validation.
//!
//! The identity provider signs access tokens with HS256 using a secret it
//! shares with this service. Validation checks:
//! - **Issuer (iss)**: must match the configured identity provider
//! - **Audience (aud)**: must contain this application's identifier
//! - **Expiry (exp)**: must be in the future

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Configuration for [`JwtSessionValidator`].
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    pub fn new(
        secret: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }
}

/// Claims carried by identity-provider tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject - the user ID
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// HS256 session validator.
pub struct JwtSessionValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionValidator {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.secret.expose_secret().as_bytes()),
            validation,
        }
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator").finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
                    tracing::warn!(error = %e, "Token issued for another party");
                    AuthError::InvalidToken
                }
                _ => {
                    tracing::debug!(error = %e, "Token rejected");
                    AuthError::InvalidToken
                }
            })?;

        let claims = data.claims;
        let user_id = UserId::new(claims.sub).map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthenticatedUser::new(
            user_id,
            claims.email.unwrap_or_default(),
            claims.name,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-identity-secret";
    const ISSUER: &str = "https://identity.test";
    const AUDIENCE: &str = "amsync-ads";

    fn validator() -> JwtSessionValidator {
        JwtSessionValidator::new(JwtConfig::new(SECRET, ISSUER, AUDIENCE))
    }

    fn token(secret: &str, iss: &str, aud: &str, exp_offset: i64) -> String {
        let claims = IdentityClaims {
            sub: "user_1".to_string(),
            iss: iss.to_string(),
            aud: aud.to_string(),
            exp: chrono::Utc::now().timestamp() + exp_offset,
            email: Some("a@b.com".to_string()),
            name: Some("Ana".to_string()),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn valid_token_yields_user() {
        let user = validator()
            .validate(&token(SECRET, ISSUER, AUDIENCE, 600))
            .await
            .unwrap();

        assert_eq!(user.id.as_str(), "user_1");
        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.display_name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        let result = validator().validate(&token("other", ISSUER, AUDIENCE, 600)).await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn wrong_issuer_or_audience_is_rejected() {
        let v = validator();
        assert_eq!(
            v.validate(&token(SECRET, "https://evil", AUDIENCE, 600)).await.unwrap_err(),
            AuthError::InvalidToken
        );
        assert_eq!(
            v.validate(&token(SECRET, ISSUER, "someone-else", 600)).await.unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let result = validator().validate(&token(SECRET, ISSUER, AUDIENCE, -3600)).await;
        assert_eq!(result.unwrap_err(), AuthError::TokenExpired);
    }

    #[tokio::test]
    async fn garbage_is_invalid() {
        assert_eq!(
            validator().validate("not.a.jwt").await.unwrap_err(),
            AuthError::InvalidToken
        );
    }
}
