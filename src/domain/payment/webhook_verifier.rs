//! Gateway webhook signature verification.
//!
//! The gateway signs the raw request body with HMAC-SHA256 using the shared
//! webhook secret and sends the hex digest, optionally prefixed with
//! `sha256=`, in its signature header.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::webhook_errors::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Generic signature header accepted from any gateway.
pub const GENERIC_SIGNATURE_HEADER: &str = "x-signature";

/// Gateway-specific signature header name, e.g. `x-paysuite-signature`.
pub fn gateway_signature_header(gateway_name: &str) -> String {
    format!("x-{}-signature", gateway_name.to_ascii_lowercase())
}

/// Verifier for gateway webhook signatures.
pub struct WebhookSignatureVerifier {
    secret: SecretString,
}

impl WebhookSignatureVerifier {
    /// Creates a new verifier with the given webhook secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }

    /// Verifies `signature_header` against the raw payload.
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` - header is not hex, or the digest does not match
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), WebhookError> {
        let provided = parse_signature(signature_header)?;
        let expected = self.digest(payload)?;

        if !constant_time_compare(&expected, &provided) {
            return Err(WebhookError::InvalidSignature);
        }
        Ok(())
    }

    /// Produces the hex signature the gateway would send for `payload`.
    pub fn sign(&self, payload: &[u8]) -> Result<String, WebhookError> {
        Ok(hex::encode(self.digest(payload)?))
    }

    fn digest(&self, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| WebhookError::Internal(format!("HMAC key rejected: {}", e)))?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn parse_signature(header: &str) -> Result<Vec<u8>, WebhookError> {
    let trimmed = header.trim();
    let hex_part = trimmed.strip_prefix("sha256=").unwrap_or(trimmed);
    hex::decode(hex_part.to_ascii_lowercase()).map_err(|_| WebhookError::InvalidSignature)
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
