//! HTTP adapters - REST API implementations.
//!
//! `app_router` assembles the full route tree. Transport layers (tracing,
//! CORS, timeouts) are added by the binary.

pub mod middleware;
pub mod payments;

use axum::Router;

pub use middleware::{auth_middleware, AuthRejection, AuthState, RequireAuth};
pub use payments::{PaymentAppState, PaymentDependencies};

/// Builds the application router.
///
/// User routes sit behind the bearer-token middleware. The webhook route does
/// not; gateways authenticate with a payload signature instead.
pub fn app_router(state: PaymentAppState, validator: AuthState) -> Router {
    let user_api = payments::payment_routes().layer(axum::middleware::from_fn_with_state(
        validator,
        auth_middleware,
    ));

    Router::new()
        .merge(payments::health_routes())
        .nest("/api", user_api.merge(payments::webhook_routes()))
        .with_state(state)
}
