//! HTTP adapter for payment and entitlement endpoints.
//!
//! - `POST /api/payments` - Start a hosted checkout
//! - `GET /api/payments/:transaction_id/status` - One gateway status check
//! - `GET /api/payments/:transaction_id/watch` - Poll until settled
//! - `GET /api/payments/return` - Redirect-return reconciliation
//! - `GET /api/entitlement` - Current user's entitlement
//! - `POST /api/webhook/:gateway` - Gateway webhook receiver

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{PaymentAppState, PaymentDependencies};
pub use routes::{health_routes, payment_routes, webhook_routes};
