//! HTTP payment gateway adapter.
//!
//! Implements `PaymentGateway` against the hosted-checkout gateway's REST API.
//!
//! # Endpoints
//!
//! - `POST {base}/payment/create` with an `apiKey` header
//! - `GET {base}/payment/status/{id}` with bearer auth and `apiKey` header

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::foundation::TransactionId;
use crate::domain::payment::PaymentStatus;
use crate::ports::{
    CreatePaymentRequest, CreatedPayment, GatewayError, PaymentGateway, TransactionStatusReport,
};

use super::wire_types::{CreatePaymentBody, CreatePaymentResponse, ErrorBody, StatusResponse};

/// Gateway API configuration.
#[derive(Clone)]
pub struct HttpGatewayConfig {
    api_base_url: String,
    api_key: SecretString,
    /// Value of the gateway's `enviroment` field (`sandbox`, `production`).
    environment: String,
    request_timeout: Duration,
}

impl HttpGatewayConfig {
    pub fn new(api_base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            api_key: SecretString::new(api_key.into()),
            environment: "sandbox".to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Gateway adapter over `reqwest`.
pub struct HttpPaymentGateway {
    config: HttpGatewayConfig,
    http_client: reqwest::Client,
}

impl HttpPaymentGateway {
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::connectivity(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, http_client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// `{base}/payment/status/{id}` with the id percent-encoded as one segment.
    fn status_url(&self, transaction_id: &TransactionId) -> Result<reqwest::Url, GatewayError> {
        let mut url = reqwest::Url::parse(&self.config.api_base_url).map_err(|e| {
            GatewayError::connectivity(format!("invalid gateway base URL: {}", e))
        })?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::connectivity("gateway base URL cannot take a path"))?
            .pop_if_empty()
            .extend(["payment", "status", transaction_id.as_str()]);
        Ok(url)
    }
}

fn map_send_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::connectivity(format!("gateway request timed out: {}", err))
    } else {
        GatewayError::connectivity(format!("gateway unreachable: {}", err))
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_payment(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<CreatedPayment, GatewayError> {
        let body = CreatePaymentBody {
            amount: request.amount.in_whole_units(),
            context: &request.context,
            callback_url: &request.callback_url,
            return_url: &request.return_url,
            currency: request.currency.as_str(),
            environment: &self.config.environment,
        };

        let response = self
            .http_client
            .post(self.url("/payment/create"))
            .header("apiKey", self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_send_error)?;

        if is_auth_failure(status) {
            tracing::error!(status = %status, "Gateway rejected API key on create_payment");
            return Err(GatewayError::authentication(
                ErrorBody::extract(&text).unwrap_or_else(|| format!("HTTP {}", status)),
            ));
        }

        if !status.is_success() {
            let message = ErrorBody::extract(&text)
                .unwrap_or_else(|| format!("Payment gateway returned HTTP {}", status));
            tracing::warn!(status = %status, message = %message, "Gateway refused payment creation");
            return Err(GatewayError::rejected(message));
        }

        let raw: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            GatewayError::invalid_response(format!("create_payment response is not JSON: {}", e))
        })?;
        let parsed: CreatePaymentResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            GatewayError::invalid_response(format!("unexpected create_payment response: {}", e))
        })?;

        if !parsed.success {
            let message = parsed
                .message
                .unwrap_or_else(|| "Payment was not accepted by the gateway".to_string());
            tracing::warn!(message = %message, "Gateway returned success=false");
            return Err(GatewayError::rejected(message));
        }

        let transaction_id = parsed
            .id
            .and_then(|id| TransactionId::new(id).ok())
            .ok_or_else(|| GatewayError::invalid_response("create_payment response has no id"))?;
        let redirect_url = parsed
            .redirect_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                GatewayError::invalid_response("create_payment response has no redirectUrl")
            })?;

        tracing::info!(transaction_id = %transaction_id, "Gateway created payment");

        Ok(CreatedPayment {
            transaction_id,
            redirect_url,
            raw,
        })
    }

    async fn get_transaction_status(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionStatusReport, GatewayError> {
        let response = self
            .http_client
            .get(self.status_url(transaction_id)?)
            .bearer_auth(self.config.api_key.expose_secret())
            .header("apiKey", self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::not_found(transaction_id));
        }

        let text = response.text().await.map_err(map_send_error)?;

        if is_auth_failure(status) {
            return Err(GatewayError::authentication(
                ErrorBody::extract(&text).unwrap_or_else(|| format!("HTTP {}", status)),
            ));
        }

        if !status.is_success() {
            return Err(GatewayError::rejected(
                ErrorBody::extract(&text)
                    .unwrap_or_else(|| format!("Payment gateway returned HTTP {}", status)),
            ));
        }

        let raw: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            GatewayError::invalid_response(format!("status response is not JSON: {}", e))
        })?;
        let parsed: StatusResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            GatewayError::invalid_response(format!("unexpected status response: {}", e))
        })?;

        let gateway_status = parsed
            .status()
            .ok_or_else(|| GatewayError::invalid_response("status response has no status"))?;

        Ok(TransactionStatusReport {
            transaction_id: transaction_id.clone(),
            status: PaymentStatus::from_gateway(gateway_status),
            raw,
        })
    }
}
