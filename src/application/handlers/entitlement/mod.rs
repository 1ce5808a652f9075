//! Entitlement handlers.

mod apply_entitlement;
mod get_entitlement;

pub use apply_entitlement::EntitlementService;
pub use get_entitlement::{GetEntitlementHandler, GetEntitlementQuery};
