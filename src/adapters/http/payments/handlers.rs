//! HTTP handlers for payment and entitlement endpoints.
//!
//! These handlers connect axum routes to the application layer handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::{
    CheckoutSettings, CreatePaymentCommand, CreatePaymentHandler, EntitlementService,
    GetEntitlementHandler, GetEntitlementQuery, GetPaymentStatusHandler, GetPaymentStatusQuery,
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, PaymentStatusPoller,
    PollingSettings, ReconcilePaymentReturnHandler, ReconcileReturnCommand, ReconcilerSettings,
    WebhookSettings,
};
use crate::domain::foundation::{DomainError, ErrorCode, TransactionId};
use crate::domain::payment::{
    gateway_signature_header, PaymentFlowError, WebhookError, WebhookSignatureVerifier,
    GENERIC_SIGNATURE_HEADER,
};
use crate::ports::{EntitlementAuditLog, PaymentGateway, ProfileRepository, TransactionLedger};

use super::dto::{
    CreatePaymentRequest, EntitlementResponse, ErrorResponse, HealthResponse,
    PaymentCreatedResponse, PaymentStatusResponse, PaymentWatchResponse, ReturnQuery,
    ReturnReconciliationResponse, WebhookAckResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Ports and settings needed to assemble [`PaymentAppState`].
pub struct PaymentDependencies {
    pub gateway: Arc<dyn PaymentGateway>,
    pub ledger: Arc<dyn TransactionLedger>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub audit_log: Arc<dyn EntitlementAuditLog>,
    /// Recorded on the profile as `payment_method`.
    pub payment_method: String,
    /// Shared secret for webhook signatures; `None` accepts unsigned only.
    pub webhook_secret: Option<String>,
    pub checkout: CheckoutSettings,
    pub webhook: WebhookSettings,
    pub reconciler: ReconcilerSettings,
    pub polling: PollingSettings,
}

/// Shared application state. Cloned per request; every field is an `Arc`.
#[derive(Clone)]
pub struct PaymentAppState {
    pub create_payment: Arc<CreatePaymentHandler>,
    pub payment_status: Arc<GetPaymentStatusHandler>,
    pub poller: Arc<PaymentStatusPoller>,
    pub reconciler: Arc<ReconcilePaymentReturnHandler>,
    pub entitlement: Arc<GetEntitlementHandler>,
    pub webhook: Arc<HandlePaymentWebhookHandler>,
}

impl PaymentAppState {
    pub fn new(deps: PaymentDependencies) -> Self {
        let entitlements = Arc::new(EntitlementService::new(
            deps.profiles.clone(),
            deps.audit_log,
            deps.payment_method,
        ));
        let verifier = deps.webhook_secret.map(WebhookSignatureVerifier::new);

        Self {
            create_payment: Arc::new(CreatePaymentHandler::new(
                deps.gateway.clone(),
                deps.ledger.clone(),
                deps.checkout,
            )),
            payment_status: Arc::new(GetPaymentStatusHandler::new(
                deps.gateway.clone(),
                deps.ledger.clone(),
                deps.profiles.clone(),
            )),
            poller: Arc::new(PaymentStatusPoller::new(deps.gateway.clone(), deps.polling)),
            reconciler: Arc::new(ReconcilePaymentReturnHandler::new(
                deps.ledger.clone(),
                deps.profiles.clone(),
                deps.gateway,
                entitlements.clone(),
                deps.reconciler,
            )),
            entitlement: Arc::new(GetEntitlementHandler::new(deps.profiles)),
            webhook: Arc::new(HandlePaymentWebhookHandler::new(
                deps.ledger,
                entitlements,
                verifier,
                deps.webhook,
            )),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/payments/:transaction_id/status - One gateway status check
pub async fn get_payment_status(
    State(state): State<PaymentAppState>,
    RequireAuth(user): RequireAuth,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let transaction_id = parse_transaction_id(transaction_id)?;
    let report = state
        .payment_status
        .handle(GetPaymentStatusQuery {
            user_id: user.id,
            transaction_id,
        })
        .await?;
    Ok(Json(PaymentStatusResponse::from(report)))
}

/// GET /api/payments/:transaction_id/watch - Poll until terminal or timeout
pub async fn watch_payment(
    State(state): State<PaymentAppState>,
    RequireAuth(user): RequireAuth,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let transaction_id = parse_transaction_id(transaction_id)?;
    state
        .payment_status
        .ensure_owned_by(&user.id, &transaction_id)
        .await?;
    tracing::debug!(transaction_id = %transaction_id, user_id = %user.id, "Watching payment");

    let outcome = state.poller.watch(&transaction_id).await?;
    Ok(Json(PaymentWatchResponse::from_outcome(
        transaction_id.to_string(),
        outcome,
    )))
}

/// GET /api/payments/return - Reconcile access after the checkout redirect
pub async fn reconcile_return(
    State(state): State<PaymentAppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<ReturnQuery>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let result = state
        .reconciler
        .handle(ReconcileReturnCommand {
            user,
            params: query.into(),
        })
        .await?;
    Ok(Json(ReturnReconciliationResponse::from(result)))
}

/// GET /api/entitlement - The caller's paid status
pub async fn get_entitlement(
    State(state): State<PaymentAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, PaymentApiError> {
    let entitlement = state
        .entitlement
        .handle(GetEntitlementQuery { user_id: user.id })
        .await?;
    Ok(Json(EntitlementResponse::from(entitlement)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments - Start a hosted checkout
pub async fn create_payment(
    State(state): State<PaymentAppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let result = state
        .create_payment
        .handle(CreatePaymentCommand {
            user,
            amount: request.amount,
            context: request.context,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PaymentCreatedResponse::from(result)),
    ))
}

/// POST /api/webhook/:gateway - Gateway payment notification
///
/// The signature is read from `x-{gateway}-signature`, falling back to
/// `x-signature`.
pub async fn handle_webhook(
    State(state): State<PaymentAppState>,
    Path(gateway): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(gateway_signature_header(&gateway))
        .or_else(|| headers.get(GENERIC_SIGNATURE_HEADER))
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let result = state
        .webhook
        .handle(HandlePaymentWebhookCommand {
            payload: body.to_vec(),
            signature,
        })
        .await?;

    Ok(Json(WebhookAckResponse::from(result)))
}

/// Any non-POST method on the webhook path.
pub async fn webhook_method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse::new("METHOD_NOT_ALLOWED", "Method not allowed")),
    )
        .into_response()
}

fn parse_transaction_id(raw: String) -> Result<TransactionId, PaymentApiError> {
    TransactionId::new(raw)
        .map_err(|e| PaymentApiError(PaymentFlowError::validation("transaction_id", e.to_string())))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts payment-flow errors to HTTP responses.
#[derive(Debug)]
pub struct PaymentApiError(PaymentFlowError);

impl From<PaymentFlowError> for PaymentApiError {
    fn from(err: PaymentFlowError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for PaymentApiError {
    fn from(err: DomainError) -> Self {
        Self(PaymentFlowError::from(err))
    }
}

impl PaymentApiError {
    fn status(&self) -> StatusCode {
        match self.0.code() {
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::ProfileNotFound | ErrorCode::TransactionNotFound => StatusCode::NOT_FOUND,
            ErrorCode::GatewayUnreachable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::PaymentRejected => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::GatewayAuthFailed | ErrorCode::InvalidGatewayResponse => {
                StatusCode::BAD_GATEWAY
            }
            ErrorCode::DatabaseError | ErrorCode::StorageError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for PaymentApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = %self.0.code(), error = %self.0.message(), "Payment request failed");
        }
        let body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        (status, Json(body)).into_response()
    }
}

/// API error type for webhook rejections.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(self.0.code(), self.0.to_string());
        (self.0.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TransactionId;

    fn status_of(err: PaymentFlowError) -> StatusCode {
        PaymentApiError::from(err).into_response().status()
    }

    #[test]
    fn gateway_unreachable_is_503() {
        assert_eq!(
            status_of(PaymentFlowError::gateway_unreachable("dns")),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn rejected_payment_is_422() {
        assert_eq!(
            status_of(PaymentFlowError::payment_rejected("Insufficient funds")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn unknown_transaction_is_404() {
        assert_eq!(
            status_of(PaymentFlowError::transaction_not_found(
                TransactionId::new("tx_9").unwrap()
            )),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn validation_is_400_and_ledger_is_500() {
        assert_eq!(
            status_of(PaymentFlowError::validation("amount", "must be positive")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(PaymentFlowError::ledger("disk full")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(PaymentFlowError::ledger("disk full").code().to_string(), "STORAGE_ERROR");
    }

    #[test]
    fn gateway_auth_failure_is_502() {
        assert_eq!(
            status_of(PaymentFlowError::GatewayAuthFailed("bad key".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn webhook_error_uses_its_own_status() {
        let response = WebhookApiError::from(WebhookError::InvalidSignature).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
