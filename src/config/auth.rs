//! Authentication configuration

use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Identity-provider token settings (HS256 shared secret)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    /// Secret the identity provider signs access tokens with
    pub jwt_secret: String,

    /// Expected `iss` claim
    pub issuer: String,

    /// Expected `aud` claim
    pub audience: String,
}

impl AuthConfig {
    /// Validate authentication configuration
    ///
    /// In production, requires an HTTPS issuer.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.jwt_secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if self.issuer.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__ISSUER"));
        }
        if self.audience.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__AUDIENCE"));
        }
        if *environment == Environment::Production && !self.issuer.starts_with("https://") {
            return Err(ValidationError::IssuerMustBeHttps);
        }
        Ok(())
    }
}
