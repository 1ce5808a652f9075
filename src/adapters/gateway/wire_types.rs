//! Gateway wire types.
//!
//! These mirror the gateway's JSON exactly, including its misspelt
//! `enviroment` request field.

use serde::{Deserialize, Serialize};

/// Body of `POST /payment/create`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentBody<'a> {
    pub amount: i64,
    pub context: &'a str,
    pub callback_url: &'a str,
    pub return_url: &'a str,
    pub currency: &'a str,
    #[serde(rename = "enviroment")]
    pub environment: &'a str,
}

/// Response of `POST /payment/create`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    #[serde(default)]
    pub success: bool,
    pub id: Option<String>,
    pub redirect_url: Option<String>,
    pub message: Option<String>,
}

/// Response of `GET /payment/status/{id}`.
///
/// Some gateway versions wrap the payload in `data`.
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub status: Option<String>,
    pub data: Option<StatusData>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusData {
    pub status: Option<String>,
}

impl StatusResponse {
    pub fn status(&self) -> Option<&str> {
        self.status
            .as_deref()
            .or_else(|| self.data.as_ref().and_then(|d| d.status.as_deref()))
    }
}

/// Error body shape shared by all endpoints.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message from an error response body.
    pub fn extract(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        parsed.message.or(parsed.error).filter(|m| !m.trim().is_empty())
    }
}
