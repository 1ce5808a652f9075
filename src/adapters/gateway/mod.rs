//! Payment gateway adapters.
//!
//! - `HttpPaymentGateway` - production adapter over the gateway REST API
//! - `MockPaymentGateway` - scripted adapter for tests and local development

mod http_gateway;
mod mock_gateway;
mod wire_types;

pub use http_gateway::{HttpGatewayConfig, HttpPaymentGateway};
pub use mock_gateway::{MethodCall, MockPaymentGateway};
