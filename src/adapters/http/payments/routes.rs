//! Axum router configuration for payment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_payment, get_entitlement, get_payment_status, handle_webhook, health,
    reconcile_return, watch_payment, webhook_method_not_allowed, PaymentAppState,
};

/// User endpoints (require authentication).
///
/// - `POST /payments` - Start a hosted checkout
/// - `GET /payments/return` - Reconcile access after the checkout redirect
/// - `GET /payments/:transaction_id/status` - One gateway status check
/// - `GET /payments/:transaction_id/watch` - Poll until settled
/// - `GET /entitlement` - The caller's paid status
pub fn payment_routes() -> Router<PaymentAppState> {
    Router::new()
        .route("/payments", post(create_payment))
        .route("/payments/return", get(reconcile_return))
        .route("/payments/:transaction_id/status", get(get_payment_status))
        .route("/payments/:transaction_id/watch", get(watch_payment))
        .route("/entitlement", get(get_entitlement))
}

/// Gateway webhook endpoint (no user auth; signature verified).
///
/// - `POST /webhook/:gateway`
pub fn webhook_routes() -> Router<PaymentAppState> {
    Router::new().route(
        "/webhook/:gateway",
        post(handle_webhook).fallback(webhook_method_not_allowed),
    )
}

/// Liveness probe, mounted at the root.
pub fn health_routes() -> Router<PaymentAppState> {
    Router::new().route("/health", get(health))
}
