//! AMSync Payments - Payment intent and entitlement reconciliation.
//!
//! Creates hosted-checkout payments for the course platform, remembers which
//! user started each transaction, and grants paid access exactly once from
//! either the gateway webhook or the user's return from checkout.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
