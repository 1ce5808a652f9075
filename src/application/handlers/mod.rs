//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod entitlement;
pub mod payment;

pub use entitlement::{EntitlementService, GetEntitlementHandler, GetEntitlementQuery};
pub use payment::*;
